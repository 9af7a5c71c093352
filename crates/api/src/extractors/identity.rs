//! Requester identity extractor.
//!
//! Scanning clients may send `Authorization: Bearer <jwt>` issued by the
//! external identity provider. A valid token attributes the redemption to its
//! subject; no token means an anonymous redemption. A token that is present
//! but does not verify is rejected rather than silently downgraded.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use domain::models::Redeemer;
use domain::services::IdentityProvider;
use shared::jwt::{JwtConfig, JwtError};

use crate::app::AppState;
use crate::error::ApiError;

/// Bearer token from the `Authorization` header, if one is present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The party a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterIdentity(pub Redeemer);

impl RequesterIdentity {
    /// Resolves the requester from request headers.
    pub fn resolve(headers: &HeaderMap, jwt: Option<&JwtConfig>) -> Result<Self, ApiError> {
        let Some(raw) = headers.get(header::AUTHORIZATION) else {
            return Ok(Self(Redeemer::Anonymous));
        };

        let token = raw
            .to_str()
            .ok()
            .and_then(|_| bearer_token(headers))
            .ok_or_else(|| {
                ApiError::Unauthorized("Invalid Authorization header format".to_string())
            })?;

        let Some(jwt) = jwt else {
            tracing::debug!("Identity verification not configured; treating requester as anonymous");
            return Ok(Self(Redeemer::Anonymous));
        };

        match jwt.validate_token(token) {
            Ok(claims) => Ok(Self(Redeemer::User {
                subject: claims.sub,
            })),
            Err(JwtError::TokenExpired) => {
                Err(ApiError::Unauthorized("Token has expired".to_string()))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token rejected");
                Err(ApiError::Unauthorized("Invalid token".to_string()))
            }
        }
    }
}

impl IdentityProvider for RequesterIdentity {
    fn requester(&self) -> Redeemer {
        self.0.clone()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequesterIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Self::resolve(&parts.headers, state.jwt.as_deref())
    }
}
