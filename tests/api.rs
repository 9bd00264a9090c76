//! HTTP-level tests driving the router in-process.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use water_forecast::{
    api,
    config::{Config, DatasetConfig, ModelsConfig},
    dataset::DatasetIndex,
    domain::{FeatureTable, FeatureValue},
    forecast::{FeatureBuilder, ForecastService},
    ml::{FitOptions, ModelArtifact, ModelError, ModelKey, ModelRegistry, Regressor},
    state::AppState,
};

/// Three countries, six years each. Brazil matches the documented example
/// for 2018-2020.
fn sample_csv() -> String {
    let mut csv = String::from(
        "Country,Year,Population,Rainfall Impact (Annual Precipitation in mm),Water Scarcity Level,Total Water Consumption(Billion Cubic Meters)\n",
    );
    let countries = [
        ("Brazil", 209_000_000.0, 1650.0, 100.0),
        ("Chile", 18_900_000.0, 300.0, 12.0),
        ("Spain", 46_700_000.0, 600.0, 30.0),
    ];
    let levels = ["Low", "Medium", "High"];
    for (c, (country, pop, rain, base)) in countries.into_iter().enumerate() {
        for (i, year) in (2015..2021).enumerate() {
            let step = i as f64;
            let target = if country == "Brazil" && year >= 2018 {
                100.0 + 5.0 * (year - 2018) as f64
            } else {
                base + 1.5 * step
            };
            csv.push_str(&format!(
                "{country},{year},\"{pop}\",{rain},{level},{target}\n",
                pop = format_thousands(pop as u64 + 1_000 * i as u64),
                rain = rain + 10.0 * step,
                level = levels[(c + i / 2) % levels.len()],
            ));
        }
    }
    csv
}

fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn sample_index() -> DatasetIndex {
    DatasetIndex::from_reader(sample_csv().as_bytes(), &DatasetConfig::default()).unwrap()
}

/// Predicts `year - 2000` for every row
struct YearModel;

impl Regressor for YearModel {
    fn predict(&self, rows: &FeatureTable) -> Result<Vec<f64>, ModelError> {
        Ok(rows
            .rows()
            .iter()
            .map(|r| r.get(0).and_then(FeatureValue::as_number).unwrap_or(0.0) - 2000.0)
            .collect())
    }
}

struct FailingModel;

impl Regressor for FailingModel {
    fn predict(&self, _rows: &FeatureTable) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::Inference("model exploded".to_string()))
    }
}

fn app_with(registry: ModelRegistry) -> Router {
    let cfg = Config::default();
    let service = ForecastService::new(Arc::new(sample_index()), Arc::new(registry));
    api::router(AppState::new(cfg.clone(), service), &cfg)
}

fn healthy_app() -> Router {
    app_with(
        ModelRegistry::new()
            .with_model(ModelKey::Lasso, Arc::new(YearModel))
            .with_model(ModelKey::Ridge, Arc::new(YearModel))
            .with_model(ModelKey::Knn, Arc::new(YearModel)),
    )
}

fn failing_app() -> Router {
    app_with(
        ModelRegistry::new()
            .with_model(ModelKey::Lasso, Arc::new(FailingModel))
            .with_model(ModelKey::Ridge, Arc::new(FailingModel))
            .with_model(ModelKey::Knn, Arc::new(FailingModel)),
    )
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok_and_models() {
    let (status, body) = get(healthy_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["models"], json!(["lasso", "ridge", "knn"]));
    assert_eq!(body["countries"], 3);
}

#[tokio::test]
async fn readiness_requires_default_model() {
    let degraded = app_with(ModelRegistry::new().with_model(ModelKey::Knn, Arc::new(YearModel)));
    let (status, _) = get(degraded, "/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = get(healthy_app(), "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn countries_are_sorted() {
    let (status, body) = get(healthy_app(), "/countries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["Brazil", "Chile", "Spain"]));
}

#[tokio::test]
async fn predict_brazil_example() {
    let (status, body) = post_json(
        healthy_app(),
        "/predict",
        json!({ "country": "Brazil", "year": 2025, "models": ["knn"] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], "knn");
    assert_eq!(body["years"], json!([2015, 2016, 2017, 2018, 2019, 2020, 2025]));

    let values = body["values"].as_array().unwrap();
    let band = body["band"].as_array().unwrap();
    assert_eq!(values.len(), 7);
    assert_eq!(band.len(), 7);
    assert_eq!(body["current"], values[5]);
    assert_eq!(body["predicted"], 25.0);
    assert_eq!(body["metrics"], json!({}));

    for (value, bounds) in values.iter().zip(band) {
        let v = value.as_f64().unwrap();
        assert!(bounds[0].as_f64().unwrap() <= v && v <= bounds[1].as_f64().unwrap());
    }
}

#[tokio::test]
async fn predict_selection_is_case_insensitive_first_match() {
    let (_, body) = post_json(
        healthy_app(),
        "/predict",
        json!({ "country": "Chile", "year": 2030, "models": ["RIDGE", "lasso"] }),
    )
    .await;
    assert_eq!(body["model_used"], "ridge");

    let (_, body) = post_json(
        healthy_app(),
        "/predict",
        json!({ "country": "Chile", "year": 2030, "models": ["unknown"] }),
    )
    .await;
    assert_eq!(body["model_used"], "lasso");

    let (_, body) = post_json(healthy_app(), "/predict", json!({ "country": "Chile", "year": 2030 })).await;
    assert_eq!(body["model_used"], "lasso");
}

#[tokio::test]
async fn predict_unknown_country_is_bad_request() {
    // Even with every model failing, validation happens first
    let (status, body) = post_json(
        failing_app(),
        "/predict",
        json!({ "country": "Atlantis", "year": 2025 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");

    let (status, _) = post_json(failing_app(), "/predict", json!({ "country": "", "year": 2025 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn predict_model_failure_is_server_error_with_message() {
    let (status, body) = post_json(
        failing_app(),
        "/predict",
        json!({ "country": "Brazil", "year": 2025 }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Prediction failed"));
    assert!(message.contains("model exploded"));
}

#[tokio::test]
async fn compare_returns_every_model() {
    let (status, body) = get(healthy_app(), "/compare?country=Spain").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["years"], json!([2015, 2016, 2017, 2018, 2019, 2020]));
    for key in ["lasso", "ridge", "knn"] {
        assert_eq!(body[key], json!([15.0, 16.0, 17.0, 18.0, 19.0, 20.0]));
    }
}

#[tokio::test]
async fn compare_survives_all_models_failing() {
    let (status, body) = get(failing_app(), "/compare?country=Brazil").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lasso"], json!([]));
    assert_eq!(body["ridge"], json!([]));
    assert_eq!(body["knn"], json!([]));
}

#[tokio::test]
async fn compare_unknown_country_is_bad_request() {
    let (status, _) = get(healthy_app(), "/compare?country=Atlantis").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_report_each_model() {
    let (status, body) = get(healthy_app(), "/metrics?country=Chile").await;
    assert_eq!(status, StatusCode::OK);
    for key in ["lasso", "ridge", "knn"] {
        let scores = &body[key];
        assert!(scores["MAE"].is_number());
        assert!(scores["RMSE"].is_number());
        assert!(scores["R2"].is_number());
        assert!(scores["MAPE"].is_number());
    }
}

#[tokio::test]
async fn metrics_failures_are_null() {
    let (status, body) = get(failing_app(), "/metrics?country=Chile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["ridge"],
        json!({ "MAE": null, "RMSE": null, "R2": null, "MAPE": null })
    );

    let (status, _) = get(failing_app(), "/metrics?country=Atlantis").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analysis_returns_sorted_history() {
    let index = sample_index();
    for country in index.countries() {
        let (status, body) = get(healthy_app(), &format!("/analysis?country={country}")).await;
        assert_eq!(status, StatusCode::OK);

        let years: Vec<i64> = body["years"]
            .as_array()
            .unwrap()
            .iter()
            .map(|y| y.as_i64().unwrap())
            .collect();
        assert!(years.windows(2).all(|w| w[0] <= w[1]));

        let expected: Vec<i64> = index
            .records_for(country)
            .iter()
            .map(|r| r.year as i64)
            .collect();
        assert_eq!(years, expected);
    }

    let (_, body) = get(healthy_app(), "/analysis?country=Brazil").await;
    assert_eq!(body["true_values"][3], 100.0);
    assert_eq!(body["true_values"][5], 110.0);
}

#[tokio::test]
async fn analysis_unknown_country_is_bad_request() {
    let (status, _) = get(healthy_app(), "/analysis?country=Atlantis").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_query_parameter_is_rejected() {
    let (status, _) = get(healthy_app(), "/compare").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Fit real artifacts on the sample table, persist them, and serve them
#[tokio::test]
async fn serves_persisted_smartcore_artifacts() {
    let index = sample_index();
    let builder = FeatureBuilder::new(&index);

    let mut rows = Vec::new();
    let mut targets = Vec::new();
    for country in index.countries() {
        let history = builder.history(country);
        rows.extend(history.table.rows().iter().cloned());
        targets.extend(history.targets);
    }
    let table = FeatureTable::new(index.schema().clone(), rows);

    let dir = tempfile::tempdir().unwrap();
    let models = ModelsConfig {
        dir: dir.path().to_path_buf(),
        ..ModelsConfig::default()
    };
    for key in [ModelKey::Lasso, ModelKey::Ridge, ModelKey::Knn] {
        ModelArtifact::fit(key, &table, &targets, FitOptions::default())
            .unwrap()
            .save(&models.artifact_path(key))
            .unwrap();
    }

    let registry = ModelRegistry::load(&models).unwrap();
    assert_eq!(registry.len(), 3);

    let app = app_with(registry);
    let (status, body) = post_json(
        app.clone(),
        "/predict",
        json!({ "country": "Brazil", "year": 2025, "models": ["ridge"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], "ridge");
    assert_eq!(body["values"].as_array().unwrap().len(), 7);

    let (status, body) = get(app, "/compare?country=Chile").await;
    assert_eq!(status, StatusCode::OK);
    for key in ["lasso", "ridge", "knn"] {
        assert_eq!(body[key].as_array().unwrap().len(), 6);
    }
}
