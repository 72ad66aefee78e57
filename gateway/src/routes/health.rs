//! Unauthenticated operational endpoints.

use axum::extract::State;
use axum::Json;

use crate::dto::HealthResponse;
use crate::metrics::MetricsSnapshot;
use crate::state::AppState;

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        storage: state.engine.backend(),
    })
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
