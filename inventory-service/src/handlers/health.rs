use crate::services::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "inventory-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe: the product store must answer. Failures use the error
/// envelope but answer 503 whatever the error kind.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.repository.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))).into_response(),
        Err(e) => {
            tracing::warn!(code = e.code(), error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(e.envelope())).into_response()
        }
    }
}

pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
