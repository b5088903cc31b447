//! HTTP routing for the Ledger API.
//!
//! ```text
//! GET  /health                      open        liveness / probe target
//! POST /tickets/sync                bearer      idempotent batch ingest
//! POST /reconciliation/versement    bearer      record remitted cash
//! GET  /reconciliation/summary      bearer      per-staff variance rows
//! ```

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use caisse_core::protocol::{SiteSummary, SyncBatchRequest, SyncBatchResponse, VersementRequest};
use caisse_core::Versement;

use crate::auth::require_bearer;
use crate::error::ApiError;
use crate::services::{health, ingest, reconciliation};
use crate::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/tickets/sync", post(sync_tickets))
        .route("/reconciliation/versement", post(record_versement))
        .route("/reconciliation/summary", get(reconciliation_summary))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<health::HealthStatus>, ApiError> {
    Ok(Json(health::check(&state).await?))
}

async fn sync_tickets(
    State(state): State<AppState>,
    Json(batch): Json<SyncBatchRequest>,
) -> Result<Json<SyncBatchResponse>, ApiError> {
    Ok(Json(ingest::ingest_batch(&state, batch).await?))
}

async fn record_versement(
    State(state): State<AppState>,
    Json(req): Json<VersementRequest>,
) -> Result<Json<Versement>, ApiError> {
    Ok(Json(reconciliation::save_versement(&state, req).await?))
}

/// Query string of `GET /reconciliation/summary`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryParams {
    site_id: String,
    date_from: NaiveDate,
    date_to: NaiveDate,
}

async fn reconciliation_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<SiteSummary>, ApiError> {
    let summary = reconciliation::site_summary(
        &state,
        &params.site_id,
        params.date_from,
        params.date_to,
    )
    .await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil::seeded_state;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use caisse_core::protocol::TicketPayload;
    use caisse_core::Money;
    use chrono::{TimeZone, Utc};
    use tower::util::ServiceExt;

    fn sync_body() -> Body {
        let batch = SyncBatchRequest {
            tickets: vec![TicketPayload {
                id: "t-1".to_string(),
                type_id: "type-1".to_string(),
                staff_id: "staff-1".to_string(),
                site_id: "site-1".to_string(),
                price: Money::from_cents(1500),
                created_at: Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap(),
                device_id: "term-1".to_string(),
            }],
        };
        Body::from(serde_json::to_vec(&batch).unwrap())
    }

    fn post(uri: &str, token: Option<&str>, body: Body) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(body).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_open() {
        let app = router(seeded_state().await);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn sync_without_token_is_unauthorized() {
        let app = router(seeded_state().await);
        let response = app
            .oneshot(post("/tickets/sync", None, sync_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sync_with_wrong_token_is_unauthorized() {
        let app = router(seeded_state().await);
        let response = app
            .oneshot(post("/tickets/sync", Some("wrong"), sync_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sync_with_valid_token_ingests() {
        let app = router(seeded_state().await);
        let response = app
            .oneshot(post("/tickets/sync", Some("test-token"), sync_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["totalReceived"], 1);
        assert_eq!(body["inserted"], 1);
        assert_eq!(body["errors"], 0);
    }

    #[tokio::test]
    async fn versement_then_summary_round_trip() {
        let state = seeded_state().await;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(post("/tickets/sync", Some("test-token"), sync_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let versement = serde_json::json!({
            "staffId": "staff-1",
            "date": "2025-06-15",
            "remittedAmount": 1500
        });
        let response = app
            .clone()
            .oneshot(post(
                "/reconciliation/versement",
                Some("test-token"),
                Body::from(versement.to_string()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["variance"], 0);
        assert_eq!(body["ticketCount"], 1);

        let response = app
            .oneshot(
                Request::get(
                    "/reconciliation/summary?siteId=site-1&dateFrom=2025-06-15&dateTo=2025-06-15",
                )
                .header(header::AUTHORIZATION, "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        let alice = &rows[0];
        assert_eq!(alice["staffId"], "staff-1");
        assert_eq!(alice["theoreticalAmount"], 1500);
        assert_eq!(alice["alert"], false);
    }

    #[tokio::test]
    async fn unknown_staff_maps_to_404() {
        let app = router(seeded_state().await);
        let versement = serde_json::json!({
            "staffId": "nobody",
            "date": "2025-06-15",
            "remittedAmount": 100
        });
        let response = app
            .oneshot(post(
                "/reconciliation/versement",
                Some("test-token"),
                Body::from(versement.to_string()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
