//! Drops idle rate-limit entries.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::RateLimiterState;

pub struct RateLimitCleanupJob {
    limiter: Arc<RateLimiterState>,
    interval: Duration,
}

impl RateLimitCleanupJob {
    pub fn new(limiter: Arc<RateLimiterState>, interval: Duration) -> Self {
        Self { limiter, interval }
    }
}

#[async_trait::async_trait]
impl Job for RateLimitCleanupJob {
    fn name(&self) -> &'static str {
        "rate_limit_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Every(self.interval)
    }

    async fn execute(&self) -> Result<(), String> {
        let tracked = self.limiter.prune();
        metrics::gauge!("rate_limit_tracked_clients").set(tracked as f64);
        debug!(tracked, "Pruned idle rate-limit entries");
        Ok(())
    }
}
