use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::dtos::HealthResponse;
use crate::services::{get_metrics, StoreState};
use crate::startup::AppState;

/// Liveness marker. Never touches the store.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "inquiry-service",
        "message": "Inquiry backend running"
    }))
}

/// Store connectivity report. Always 200; the body carries the verdict.
#[tracing::instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = state.store.health().await;
    Json(HealthResponse::new(
        health,
        state.config.store.uri.is_some(),
        state.config.store.database_name_set,
    ))
}

/// Readiness check endpoint for K8s readiness probes.
///
/// Pings the store on every call, so a readiness poller is also what moves a
/// Degraded store back to Connected.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match state.store.verify().await {
        StoreState::Connected => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
