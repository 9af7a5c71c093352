//! Urgency alert scan.
//!
//! Each run reads the active feed, announces offers entering the urgency
//! window and offers created since the previous run, then prunes alerts for
//! offers that have expired.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use domain::services::{new_deal_alerts, urgent_alerts, AlertHub, Clock, OfferFeedReader};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::scheduler::{Job, JobFrequency};

pub struct UrgentAlertsJob {
    feed: OfferFeedReader,
    alerts: Arc<AlertHub>,
    clock: Arc<dyn Clock>,
    window: ChronoDuration,
    interval: Duration,
    /// Start of the previous scan; `None` until the first run completes.
    last_scan: Mutex<Option<DateTime<Utc>>>,
}

impl UrgentAlertsJob {
    pub fn new(
        feed: OfferFeedReader,
        alerts: Arc<AlertHub>,
        clock: Arc<dyn Clock>,
        window_minutes: i64,
        interval: Duration,
    ) -> Self {
        Self {
            feed,
            alerts,
            clock,
            window: ChronoDuration::minutes(window_minutes),
            interval,
            last_scan: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl Job for UrgentAlertsJob {
    fn name(&self) -> &'static str {
        "urgent_alerts"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Every(self.interval)
    }

    async fn execute(&self) -> Result<(), String> {
        let now = self.clock.now();
        let feed = self
            .feed
            .list_active_offers(None)
            .await
            .map_err(|e| e.to_string())?;

        let mut last_scan = self.last_scan.lock().await;
        let mut alerts = urgent_alerts(&feed.offers, now, self.window);
        // The first scan only sets the baseline; everything is "new" then.
        if let Some(since) = *last_scan {
            alerts.extend(new_deal_alerts(&feed.offers, since, now));
        }
        *last_scan = Some(now);

        let published = self.alerts.publish_all(alerts);
        self.alerts.forget_expired(now);

        debug!(scanned = feed.len(), published, "Alert scan finished");
        Ok(())
    }
}
