//! Rate limiting for redemption attempts.
//!
//! One keyed governor limiter holds a cell per client. Clients are identified
//! by bearer subject when a valid token is present, otherwise by peer address.
//! `X-Forwarded-For` is only consulted when the deployment trusts its proxy.
//! Idle keys are dropped by [`RateLimiterState::prune`], which a background
//! job calls periodically.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use shared::jwt::JwtConfig;
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
};

use crate::app::AppState;
use crate::extractors::identity::bearer_token;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

type ClientRateLimiter = GovRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Per-client limiter shared across requests.
pub struct RateLimiterState {
    limiter: ClientRateLimiter,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// Returns `None` when `rate_limit_per_minute` is zero (limiting disabled).
    pub fn new(rate_limit_per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self::with_quota(Quota::per_minute(per_minute), rate_limit_per_minute))
    }

    fn with_quota(quota: Quota, rate_limit_per_minute: u32) -> Self {
        Self {
            limiter: GovRateLimiter::keyed(quota),
            rate_limit_per_minute,
        }
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// `Err(retry_after_secs)` when the client is over its quota.
    pub fn check(&self, client: &str) -> Result<(), u64> {
        self.limiter
            .check_key(&client.to_string())
            .map_err(|not_until| {
                let wait = not_until.wait_time_from(DefaultClock::default().now());
                wait.as_secs().max(1)
            })
    }

    /// Forgets clients whose quota has fully replenished. Returns how many
    /// remain tracked.
    pub fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}

/// Rate-limit key for a request.
///
/// Precedence: verified bearer subject, then the first forwarded hop (only
/// with `trust_forwarded_for`), then the peer address, then a shared
/// `anonymous` bucket.
pub fn client_key(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    jwt: Option<&JwtConfig>,
    trust_forwarded_for: bool,
) -> String {
    if let (Some(jwt), Some(token)) = (jwt, bearer_token(headers)) {
        if let Ok(claims) = jwt.validate_token(token) {
            return format!("sub:{}", claims.sub);
        }
    }

    let forwarded = trust_forwarded_for
        .then(|| forwarded_for(headers))
        .flatten();

    match forwarded.or(peer) {
        Some(ip) => format!("ip:{}", ip),
        None => "anonymous".to_string(),
    }
}

/// First `X-Forwarded-For` hop, if it parses as an address.
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(FORWARDED_FOR_HEADER)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(rate_limiter) = &state.rate_limiter {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let client = client_key(
            req.headers(),
            peer,
            state.jwt.as_deref(),
            state.config.security.trust_forwarded_for,
        );
        if let Err(retry_after) = rate_limiter.check(&client) {
            tracing::info!(client = %client, retry_after, "Redemption rate limit exceeded");
            return rate_limited_response(rate_limiter.rate_limit_per_minute(), retry_after);
        }
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

#[cfg(test)]
pub(crate) fn fast_refill_state(period: std::time::Duration) -> RateLimiterState {
    let quota = Quota::with_period(period).expect("non-zero period");
    RateLimiterState::with_quota(quota, 60)
}
