//! Expiration sweep.
//!
//! Flips `is_active` off for offers whose `expires_at` has passed. Redemption
//! and listing already compare against the clock, so this only keeps the
//! stored flag honest for reporting.

use domain::services::Clock;
use persistence::repositories::OfferRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

pub struct ExpireOffersJob {
    offers: OfferRepository,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl ExpireOffersJob {
    pub fn new(offers: OfferRepository, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            offers,
            clock,
            interval,
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpireOffersJob {
    fn name(&self) -> &'static str {
        "expire_offers"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Every(self.interval)
    }

    async fn execute(&self) -> Result<(), String> {
        let deactivated = self
            .offers
            .deactivate_expired(self.clock.now())
            .await
            .map_err(|e| format!("Failed to deactivate expired offers: {}", e))?;

        if deactivated > 0 {
            info!(deactivated, "Deactivated expired offers");
            metrics::counter!("offers_expired_total").increment(deactivated);
        }
        Ok(())
    }
}
