//! Prometheus metrics middleware.
//!
//! Provides HTTP request/response metrics collection and export, plus the
//! redemption outcome counter.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::error::RedemptionError;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Middleware to record HTTP request metrics.
///
/// Records the following metrics:
/// - `http_requests_total`: Counter with labels (method, path, status)
/// - `http_request_duration_seconds`: Histogram with labels (method, path)
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = method_to_str(req.method());
    // Matched route template keeps label cardinality bounded.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    counter!(
        "http_requests_total",
        "method" => method,
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}

fn method_to_str(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

/// Label for `redemptions_total{outcome}`.
pub fn redemption_outcome<T>(result: &Result<T, RedemptionError>) -> &'static str {
    match result {
        Ok(_) => "redeemed",
        Err(err) => err.code(),
    }
}

/// Counts one redemption attempt by outcome.
pub fn record_redemption_outcome<T>(result: &Result<T, RedemptionError>) {
    counter!("redemptions_total", "outcome" => redemption_outcome(result)).increment(1);
}

/// Counts one home feed render by state (`ok`, `empty`, `unavailable`).
pub fn record_feed_state(state: &'static str) {
    counter!("offer_feed_requests_total", "state" => state).increment(1);
}

/// Handler for /metrics endpoint that returns Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}

/// Installs the global Prometheus recorder.
///
/// Call once at startup. A second call fails because the global recorder is
/// already set.
pub fn init_metrics() -> Result<(), BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0])?
        .install_recorder()?;

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Prometheus handle was already initialized");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::RedemptionReceipt;

    #[test]
    fn test_method_to_str() {
        assert_eq!(method_to_str(&Method::GET), "GET");
        assert_eq!(method_to_str(&Method::POST), "POST");
        assert_eq!(method_to_str(&Method::TRACE), "OTHER");
    }

    #[test]
    fn test_redemption_outcome_labels() {
        let ok: Result<(), RedemptionError> = Ok(());
        assert_eq!(redemption_outcome(&ok), "redeemed");

        let rejected: Result<RedemptionReceipt, _> = Err(RedemptionError::CapacityExceeded);
        assert_eq!(redemption_outcome(&rejected), "capacity_exceeded");

        let failed: Result<(), _> = Err(RedemptionError::Storage("db".into()));
        assert_eq!(redemption_outcome(&failed), "storage_error");
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_redemption_outcome::<()>(&Err(RedemptionError::Expired));
        record_feed_state("empty");
    }
}
