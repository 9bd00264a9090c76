//! Forecast Metrics and Evaluation
//!
//! Goodness-of-fit metrics over a model's historical fit, and the
//! residual-dispersion band drawn around fitted and forecast values.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ModelScores;

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Square Error
    pub rmse: f64,
    /// R² (coefficient of determination)
    pub r2: f64,
    /// Mean Absolute Percentage Error (%) over points with a nonzero actual
    pub mape: Option<f64>,
    /// Number of samples evaluated
    pub sample_count: usize,
}

impl ForecastMetrics {
    /// Calculate metrics from actual and predicted values
    pub fn calculate(actual: &[f64], predicted: &[f64]) -> Result<Self, ForecastMetricsError> {
        if actual.len() != predicted.len() {
            return Err(ForecastMetricsError::DimensionMismatch {
                actual: actual.len(),
                predicted: predicted.len(),
            });
        }

        if actual.is_empty() {
            return Err(ForecastMetricsError::EmptyData);
        }

        let n = actual.len() as f64;
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut percentage_errors = Vec::with_capacity(actual.len());

        for (a, p) in actual.iter().zip(predicted.iter()) {
            let error = a - p;
            abs_sum += error.abs();
            sq_sum += error * error;

            if *a != 0.0 {
                percentage_errors.push((error / a).abs() * 100.0);
            }
        }

        let mae = abs_sum / n;
        let rmse = (sq_sum / n).sqrt();

        let mape = if percentage_errors.is_empty() {
            None
        } else {
            Some(percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64)
        };

        // R²; a constant series scores 1.0 only when fitted exactly
        let mean_actual = actual.iter().sum::<f64>() / n;
        let total_variance: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
        let r2 = if total_variance != 0.0 {
            1.0 - sq_sum / total_variance
        } else if sq_sum == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(ForecastMetrics {
            mae,
            rmse,
            r2,
            mape,
            sample_count: actual.len(),
        })
    }
}

impl From<ForecastMetrics> for ModelScores {
    fn from(m: ForecastMetrics) -> Self {
        Self {
            mae: Some(m.mae),
            rmse: Some(m.rmse),
            r2: Some(m.r2),
            mape: m.mape,
        }
    }
}

impl fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Metrics: MAE={:.3}, RMSE={:.3}, R²={:.3}",
            self.mae, self.rmse, self.r2
        )?;
        match self.mape {
            Some(mape) => write!(f, ", MAPE={:.2}%", mape),
            None => write!(f, ", MAPE=n/a"),
        }
    }
}

/// Forecast metrics calculation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ForecastMetricsError {
    #[error("Dimension mismatch: actual={actual}, predicted={predicted}")]
    DimensionMismatch { actual: usize, predicted: usize },

    #[error("Empty data provided")]
    EmptyData,
}

/// Population standard deviation of `actual - fitted`; 0.0 for empty input
pub fn residual_std(actual: &[f64], fitted: &[f64]) -> f64 {
    let residuals: Vec<f64> = actual.iter().zip(fitted).map(|(a, f)| a - f).collect();
    if residuals.is_empty() {
        return 0.0;
    }
    let n = residuals.len() as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    let variance = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Percent change from `current` to `future`; exactly 0.0 when `current` is zero
pub fn percent_change(current: f64, future: f64) -> f64 {
    if current == 0.0 {
        0.0
    } else {
        (future - current) / current * 100.0
    }
}

/// Symmetric, constant-width band of `width` residual standard deviations.
///
/// This is a dispersion heuristic over the historical fit, not a
/// model-native prediction interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualBand {
    half_width: f64,
}

impl ResidualBand {
    pub const DEFAULT_WIDTH: f64 = 2.0;

    pub fn new(std: f64, width: f64) -> Self {
        Self {
            half_width: width * std,
        }
    }

    pub fn from_fit(actual: &[f64], fitted: &[f64]) -> Self {
        Self::new(residual_std(actual, fitted), Self::DEFAULT_WIDTH)
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    pub fn bounds(&self, value: f64) -> [f64; 2] {
        [value - self.half_width, value + self.half_width]
    }
}
