//! Store metrics.
//!
//! Every repository query is wrapped in a [`QueryTimer`] named after the
//! statement it runs (`increment_offer_redemptions`, `list_active_offers`,
//! `redemption_ledger`, ...). Durations land in one histogram labelled by
//! query and outcome, so a slow or failing redemption path shows up apart
//! from the feed.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

const QUERY_DURATION: &str = "store_query_duration_seconds";
const QUERY_ERRORS: &str = "store_query_errors_total";

fn outcome_label<T>(result: &Result<T, sqlx::Error>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(sqlx::Error::RowNotFound) => "not_found",
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => "conflict",
        Err(sqlx::Error::Database(db)) if db.is_check_violation() => "rejected",
        Err(_) => "error",
    }
}

/// Pool occupancy, sampled by the `pool_metrics` job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("store_pool_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("store_pool_connections_idle").set(idle as f64);
    gauge!("store_pool_connections_total").set(size as f64);
}

/// Times one named query from construction until [`QueryTimer::finish`].
///
/// ```ignore
/// let timer = QueryTimer::new("find_offer_by_code");
/// let result = sqlx::query_as::<_, OfferWithBusinessNameEntity>(&sql)
///     .bind(code)
///     .fetch_optional(&pool)
///     .await;
/// timer.finish(&result);
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Records the elapsed time under the query's outcome. Failures other
    /// than a missing row also bump the error counter.
    pub fn finish<T>(self, result: &Result<T, sqlx::Error>) {
        let outcome = outcome_label(result);
        histogram!(QUERY_DURATION, "query" => self.query, "outcome" => outcome)
            .record(self.start.elapsed().as_secs_f64());

        if !matches!(outcome, "ok" | "not_found") {
            counter!(QUERY_ERRORS, "query" => self.query, "outcome" => outcome).increment(1);
        }
    }
}
