//! Audit endpoints guarded by the admin key.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::Redemption;
use persistence::repositories::RedemptionRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

const RECENT_REDEMPTIONS: i64 = 20;

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub offer_id: Uuid,
    pub max_redemptions: i32,
    /// The offer's `current_redemptions` counter.
    pub counter: i32,
    pub redemption_rows: i64,
    pub consistent: bool,
    pub recent_redemptions: Vec<Redemption>,
}

/// GET /api/v1/admin/offers/:offer_id/ledger
pub async fn offer_ledger(
    State(state): State<AppState>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<LedgerResponse>, ApiError> {
    let ledger = state
        .store
        .redemption_ledger(offer_id)
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Offer not found".to_string()))?;

    if !ledger.is_consistent() {
        tracing::error!(
            offer_id = %offer_id,
            counter = ledger.current_redemptions,
            rows = ledger.redemption_rows,
            "Redemption ledger out of sync with counter"
        );
    }

    let recent_redemptions = RedemptionRepository::new(state.pool.clone())
        .list_for_offer(offer_id, RECENT_REDEMPTIONS)
        .await?;

    Ok(Json(LedgerResponse {
        offer_id,
        max_redemptions: ledger.max_redemptions,
        counter: ledger.current_redemptions,
        redemption_rows: ledger.redemption_rows,
        consistent: ledger.is_consistent(),
        recent_redemptions,
    }))
}
