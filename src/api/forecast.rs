use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    api::error::ApiError,
    domain::{ComparisonResult, ForecastResult, HistoryResult, MetricsReport},
    forecast::ForecastService,
    state::AppState,
};

/// POST /predict request body
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PredictRequest {
    #[validate(length(min = 1, message = "country must not be empty"))]
    pub country: String,
    pub year: i32,
    /// Preferred models, first loaded match wins
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountryQuery {
    pub country: String,
}

/// Run model inference off the async executor
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ForecastService) -> Result<T, crate::error::ForecastError> + Send + 'static,
{
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || f(service.as_ref())).await?;
    Ok(result?)
}

/// GET /countries - Known countries, sorted
pub async fn list_countries(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.service.countries().to_vec())
}

/// POST /predict - Forecast one year with the selected model
pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<ForecastResult>, ApiError> {
    req.validate()?;
    let result = blocking(&state, move |svc| {
        svc.predict_one(&req.country, req.year, req.models.as_slice())
    })
    .await?;
    Ok(Json(result))
}

/// GET /compare - Historical fit of every model
pub async fn compare(
    State(state): State<AppState>,
    Query(q): Query<CountryQuery>,
) -> Result<Json<ComparisonResult>, ApiError> {
    let result = blocking(&state, move |svc| svc.compare_all(&q.country)).await?;
    Ok(Json(result))
}

/// GET /metrics - Goodness of fit of every model
pub async fn metrics(
    State(state): State<AppState>,
    Query(q): Query<CountryQuery>,
) -> Result<Json<MetricsReport>, ApiError> {
    let result = blocking(&state, move |svc| svc.metrics_all(&q.country)).await?;
    Ok(Json(result))
}

/// GET /analysis - Observed history, no model involvement
pub async fn analysis(
    State(state): State<AppState>,
    Query(q): Query<CountryQuery>,
) -> Result<Json<HistoryResult>, ApiError> {
    Ok(Json(state.service.history_only(&q.country)?))
}
