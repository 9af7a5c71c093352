//! Urgency alert feed.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::UrgencyAlert;
use domain::services::DEFAULT_ALERT_HISTORY;
use serde::{Deserialize, Serialize};

use crate::app::AppState;

const DEFAULT_ALERT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<UrgencyAlert>,
}

/// GET /api/v1/alerts
///
/// Most recent alerts first. Alerts for expired offers are dropped by the
/// alert job, so this never lists an offer that can no longer be redeemed
/// for long.
pub async fn recent_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Json<AlertsResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ALERT_LIMIT)
        .clamp(1, DEFAULT_ALERT_HISTORY);
    Json(AlertsResponse {
        alerts: state.alerts.recent(limit),
    })
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use chrono::Duration;
    use domain::services::{urgent_alerts, Clock};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_recent_alerts_from_hub() {
        let app = test_app().await;
        app.seed_offer("ALERT-1", 5).await;
        app.clock.advance(Duration::minutes(50));

        let feed = app.state.feed.list_active_offers(None).await.unwrap();
        let alerts = urgent_alerts(&feed.offers, app.clock.now(), Duration::minutes(20));
        assert_eq!(app.state.alerts.publish_all(alerts), 1);

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/alerts?limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["alerts"][0]["kind"], "urgent");
        assert_eq!(body["alerts"][0]["minutes_left"], 10);
    }
}
