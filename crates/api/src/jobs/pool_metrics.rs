//! Connection pool gauges.

use sqlx::PgPool;
use std::time::Duration;

use super::scheduler::{Job, JobFrequency};

pub struct PoolMetricsJob {
    pool: PgPool,
    interval: Duration,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool, interval: Duration) -> Self {
        Self { pool, interval }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Every(self.interval)
    }

    async fn execute(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool);
        Ok(())
    }
}
