use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::{ml::ModelKey, state::AppState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    /// Models that loaded at startup
    models: Vec<ModelKey>,
    countries: usize,
}

/// GET /health - Health check endpoint
///
/// Always `ok` while the process is serving; also reports which models are
/// available so partially degraded deployments are visible.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
        models: state.service.registry().available(),
        countries: state.service.countries().len(),
    };

    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness probe for Kubernetes
///
/// Returns 200 once the default model is loaded
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.service.registry().contains(ModelKey::DEFAULT) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe for Kubernetes
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
