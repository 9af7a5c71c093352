//! Security headers middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;

pub const X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";
pub const X_FRAME_OPTIONS: &str = "x-frame-options";
pub const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Adds `nosniff`, `DENY` framing and, when `security.hsts_enabled` is set,
/// `Strict-Transport-Security`. HSTS belongs behind TLS termination only.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::HeaderName::from_static(X_CONTENT_TYPE_OPTIONS),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::HeaderName::from_static(X_FRAME_OPTIONS),
        HeaderValue::from_static("DENY"),
    );

    if state.config.security.hsts_enabled {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_are_valid() {
        assert_eq!(
            header::HeaderName::from_static(X_CONTENT_TYPE_OPTIONS).as_str(),
            X_CONTENT_TYPE_OPTIONS
        );
        assert_eq!(
            header::HeaderName::from_static(X_FRAME_OPTIONS).as_str(),
            X_FRAME_OPTIONS
        );
    }

    #[test]
    fn test_hsts_max_age_is_one_year() {
        assert!(HSTS_VALUE.contains(&(365 * 24 * 60 * 60).to_string()));
    }
}
