use serde::{Deserialize, Serialize};

use crate::ml::ModelKey;

/// Response of a single-model forecast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastResult {
    pub model_used: ModelKey,
    /// History years followed by the requested year
    pub years: Vec<i32>,
    /// Fitted history values followed by the forecast
    pub values: Vec<f64>,
    /// Fitted value for the last history year
    pub current: f64,
    pub predicted: f64,
    /// Percent change from `current` to `predicted`
    pub change: f64,
    /// `[lower, upper]` per entry of `values`
    pub band: Vec<[f64; 2]>,
    /// Always empty; kept for response-shape compatibility
    pub metrics: serde_json::Map<String, serde_json::Value>,
}

/// Historical fit of every model, side by side
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    pub years: Vec<i32>,
    pub lasso: Vec<f64>,
    pub ridge: Vec<f64>,
    pub knn: Vec<f64>,
}

impl ComparisonResult {
    pub fn series_mut(&mut self, key: ModelKey) -> &mut Vec<f64> {
        match key {
            ModelKey::Lasso => &mut self.lasso,
            ModelKey::Ridge => &mut self.ridge,
            ModelKey::Knn => &mut self.knn,
        }
    }
}

/// Goodness-of-fit scores for one model; `None` serializes as `null`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelScores {
    #[serde(rename = "MAE")]
    pub mae: Option<f64>,
    #[serde(rename = "RMSE")]
    pub rmse: Option<f64>,
    #[serde(rename = "R2")]
    pub r2: Option<f64>,
    #[serde(rename = "MAPE")]
    pub mape: Option<f64>,
}

impl ModelScores {
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn is_missing(&self) -> bool {
        self.mae.is_none() && self.rmse.is_none() && self.r2.is_none() && self.mape.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricsReport {
    pub lasso: ModelScores,
    pub ridge: ModelScores,
    pub knn: ModelScores,
}

impl MetricsReport {
    pub fn scores_mut(&mut self, key: ModelKey) -> &mut ModelScores {
        match key {
            ModelKey::Lasso => &mut self.lasso,
            ModelKey::Ridge => &mut self.ridge,
            ModelKey::Knn => &mut self.knn,
        }
    }
}

/// Raw observed history for a country
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryResult {
    pub years: Vec<i32>,
    pub true_values: Vec<f64>,
}
