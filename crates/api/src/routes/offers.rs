//! Offer feed endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::error::FeedError;
use domain::models::{GeoPoint, OfferView};
use domain::services::OfferFeed;
use serde::{Deserialize, Serialize};
use shared::pagination::MAX_PAGE_SIZE;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_feed_state;

/// What the home screen should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedState {
    Ok,
    Empty,
    Unavailable,
}

impl FeedState {
    fn as_str(&self) -> &'static str {
        match self {
            FeedState::Ok => "ok",
            FeedState::Empty => "empty",
            FeedState::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomeFeedResponse {
    pub state: FeedState,
    pub offers: Vec<OfferView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HomeFeedQuery {
    pub limit: Option<u32>,
}

/// GET /api/v1/offers/feed
///
/// A storage failure still answers with the feed shape (`state: unavailable`)
/// so clients can render a fallback instead of an error page.
pub async fn home_feed(
    State(state): State<AppState>,
    Query(query): Query<HomeFeedQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(state.config.feed.home_limit)
        .clamp(1, MAX_PAGE_SIZE);

    let (status, body) = match state.feed.list_active_offers(Some(limit)).await {
        Ok(feed) if feed.is_empty() => (
            StatusCode::OK,
            HomeFeedResponse {
                state: FeedState::Empty,
                offers: Vec::new(),
                error: None,
            },
        ),
        Ok(feed) => (
            StatusCode::OK,
            HomeFeedResponse {
                state: FeedState::Ok,
                offers: feed.offers,
                error: None,
            },
        ),
        Err(FeedError::InvalidQuery(msg)) => return ApiError::Validation(msg).into_response(),
        Err(FeedError::Storage(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            HomeFeedResponse {
                state: FeedState::Unavailable,
                offers: Vec::new(),
                error: Some("Error al cargar ofertas".to_string()),
            },
        ),
    };

    record_feed_state(body.state.as_str());
    (status, Json(body)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ListOffersQuery {
    pub cursor: Option<String>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
}

/// GET /api/v1/offers
pub async fn list_offers(
    State(state): State<AppState>,
    Query(query): Query<ListOffersQuery>,
) -> Result<Json<OfferFeed>, ApiError> {
    let feed = state
        .feed
        .list_page(
            query.cursor.as_deref(),
            query.per_page,
            query.category.as_deref(),
        )
        .await?;
    Ok(Json(feed))
}

#[derive(Debug, Deserialize, Validate)]
pub struct NearbyQuery {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: f64,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub lng: f64,
    #[validate(range(
        exclusive_min = 0.0,
        max = 50.0,
        message = "Radius must be greater than 0 and at most 50 km"
    ))]
    pub radius_km: Option<f64>,
    pub limit: Option<u32>,
}

/// GET /api/v1/offers/nearby
pub async fn nearby_offers(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<OfferFeed>, ApiError> {
    query.validate()?;

    let radius_km = query.radius_km.unwrap_or(state.config.feed.nearby_radius_km);
    let feed = state
        .feed
        .list_nearby(GeoPoint::new(query.lat, query.lng), radius_km, query.limit)
        .await?;
    Ok(Json(feed))
}
