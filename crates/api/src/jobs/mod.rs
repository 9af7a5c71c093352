//! Background job scheduler and job implementations.

mod expire_offers;
mod pool_metrics;
mod rate_limit_cleanup;
mod scheduler;
mod urgent_alerts;

pub use expire_offers::ExpireOffersJob;
pub use pool_metrics::PoolMetricsJob;
pub use rate_limit_cleanup::RateLimitCleanupJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use urgent_alerts::UrgentAlertsJob;
