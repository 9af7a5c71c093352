//! Business profile endpoint (read-only).

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::BusinessProfile;
use persistence::repositories::BusinessProfileRepository;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/v1/businesses/:business_id
pub async fn get_business(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
) -> Result<Json<BusinessProfile>, ApiError> {
    let repo = BusinessProfileRepository::new(state.pool.clone());
    let business = repo
        .find_by_id(business_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Business not found".to_string()))?;
    Ok(Json(business))
}
