//! Redemption endpoint.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::RedemptionReceipt;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::RequesterIdentity;
use crate::middleware::metrics::record_redemption_outcome;

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    /// Scanned or typed code; a missing field is treated as blank.
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    #[serde(flatten)]
    pub receipt: RedemptionReceipt,
    pub message: String,
}

/// POST /api/v1/redemptions
pub async fn redeem(
    State(state): State<AppState>,
    identity: RequesterIdentity,
    Json(request): Json<RedeemRequest>,
) -> Result<(StatusCode, Json<RedeemResponse>), ApiError> {
    let result = state.validator.redeem(&request.code, &identity).await;
    record_redemption_outcome(&result);

    let receipt = result?;
    let message = receipt.confirmation_message();
    Ok((StatusCode::CREATED, Json(RedeemResponse { receipt, message })))
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::Duration;
    use domain::models::Redeemer;
    use domain::services::FaultPoint;
    use serde_json::json;
    use shared::jwt::issue_token;
    use tower::ServiceExt;

    async fn post_code(app: &TestApp, code: &str, bearer: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/redemptions")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        app.router
            .clone()
            .oneshot(
                builder
                    .body(Body::from(json!({ "code": code }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_redeem_anonymous_returns_receipt() {
        let app = test_app().await;
        let offer = app.seed_offer("QR-ANON", 3).await;

        let response = post_code(&app, "  QR-ANON ", None).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json(response).await;
        assert_eq!(body["offer_id"], offer.id.to_string());
        assert_eq!(body["remaining_capacity"], 2);
        assert_eq!(body["business_name"], "Heladería Emporio");
        assert!(body["message"].as_str().unwrap().starts_with("¡Oferta redimida!"));

        let redemptions = app.store.redemptions_for(offer.id).await;
        assert_eq!(redemptions[0].redeemer, Redeemer::Anonymous);
    }

    #[tokio::test]
    async fn test_redeem_attributes_bearer_subject() {
        let app = test_app().await;
        let offer = app.seed_offer("QR-USER", 3).await;
        let token = issue_token(TEST_SECRET, "cliente-77", 300).unwrap();

        let response = post_code(&app, "QR-USER", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let redemptions = app.store.redemptions_for(offer.id).await;
        assert_eq!(
            redemptions[0].redeemer,
            Redeemer::User {
                subject: "cliente-77".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected_without_effect() {
        let app = test_app().await;
        let offer = app.seed_offer("QR-BADTOKEN", 3).await;

        let response = post_code(&app, "QR-BADTOKEN", Some("forged")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(app.store.offer(offer.id).await.unwrap().current_redemptions, 0);
    }

    #[tokio::test]
    async fn test_rejection_statuses_and_codes() {
        let app = test_app().await;

        let response = post_code(&app, "   ", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"], "invalid_input");
        assert_eq!(body["message"], "Ingresa un código válido");

        let response = post_code(&app, "UNKNOWN", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "Código QR inválido");

        app.seed_offer("QR-ONE", 1).await;
        assert_eq!(post_code(&app, "QR-ONE", None).await.status(), StatusCode::CREATED);
        let response = post_code(&app, "QR-ONE", None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json(response).await["error"], "capacity_exceeded");
    }

    #[tokio::test]
    async fn test_expired_offer_is_gone() {
        let app = test_app().await;
        let offer = app.seed_offer("QR-LATE", 3).await;
        app.clock.set(offer.expires_at + Duration::seconds(1));

        let response = post_code(&app, "QR-LATE", None).await;
        assert_eq!(response.status(), StatusCode::GONE);
        assert_eq!(json(response).await["message"], "Esta oferta ha expirado");
    }

    #[tokio::test]
    async fn test_storage_failure_is_retryable() {
        let app = test_app().await;
        let offer = app.seed_offer("QR-FAULT", 3).await;
        app.store.inject_fault(FaultPoint::BeforeCommit).await;

        let response = post_code(&app, "QR-FAULT", None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json(response).await;
        assert_eq!(body["error"], "storage_error");
        assert_eq!(body["retryable"], true);

        assert_eq!(app.store.offer(offer.id).await.unwrap().current_redemptions, 0);
        assert!(app.store.redemptions_for(offer.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_applies_per_client() {
        let mut config = test_config();
        config.security.rate_limit_per_minute = 1;
        let app = test_app_with(config).await;
        app.seed_offer("QR-RL", 10).await;

        assert_eq!(post_code(&app, "QR-RL", None).await.status(), StatusCode::CREATED);
        let response = post_code(&app, "QR-RL", None).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn test_spoofed_forwarded_for_does_not_reset_limit() {
        let mut config = test_config();
        config.security.rate_limit_per_minute = 1;
        let app = test_app_with(config).await;
        app.seed_offer("QR-XFF", 100).await;

        let mut statuses = Vec::new();
        for i in 0..20 {
            let request = Request::builder()
                .method("POST")
                .uri("/api/v1/redemptions")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", format!("203.0.113.{}", i))
                .body(Body::from(json!({ "code": "QR-XFF" }).to_string()))
                .unwrap();
            let response = app.router.clone().oneshot(request).await.unwrap();
            statuses.push(response.status());
        }

        let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
        assert_eq!(created, 1);
        assert_eq!(app.state.rate_limiter.as_ref().unwrap().tracked_clients(), 1);
    }
}
