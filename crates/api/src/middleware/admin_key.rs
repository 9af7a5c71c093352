//! Admin key check for audit routes.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::crypto::verify_sha256_hex;

use crate::app::AppState;
use crate::error::ApiError;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Requires an `X-Admin-Key` whose SHA-256 matches `security.admin_key_hash`.
///
/// With no hash configured the admin routes answer 403 to everyone.
pub async fn require_admin_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected = &state.config.security.admin_key_hash;
    if expected.is_empty() {
        return ApiError::Forbidden("Admin access is disabled".into()).into_response();
    }

    let presented = match req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(key) if !key.is_empty() => key,
        _ => return ApiError::Unauthorized("Missing admin key".into()).into_response(),
    };

    if !verify_sha256_hex(presented, expected) {
        tracing::warn!("Rejected admin request with invalid key");
        return ApiError::Unauthorized("Invalid admin key".into()).into_response();
    }

    next.run(req).await
}
