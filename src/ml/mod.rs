//! Machine Learning Module
//!
//! Pre-trained regressors used for water consumption forecasting:
//! - Lasso regression
//! - Ridge regression
//! - k-nearest-neighbors regression
//!
//! # Architecture
//! - [`encoder`] turns schema-aligned feature rows into a numeric design matrix
//! - [`smartcore`] holds the serialized estimator artifacts
//! - [`registry`] loads the artifacts once at startup and selects models per request

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::domain::FeatureTable;

pub mod encoder;
pub mod registry;
pub mod smartcore;

pub use encoder::FeatureEncoder;
pub use registry::ModelRegistry;
pub use smartcore::{FitOptions, ModelArtifact};

/// Identifier of a served regressor
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModelKey {
    Lasso,
    Ridge,
    Knn,
}

impl ModelKey {
    /// Model used when a request names no loaded model
    pub const DEFAULT: ModelKey = ModelKey::Lasso;
}

/// ML Model Metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub key: ModelKey,
    pub version: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub training_samples: usize,
    pub feature_names: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model file missing: {0}")]
    MissingArtifact(std::path::PathBuf),

    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode model artifact: {0}")]
    Decode(#[from] bincode::Error),

    #[error("Artifact holds a {found} model, expected {expected}")]
    WrongModel { expected: ModelKey, found: ModelKey },

    #[error("Feature schema mismatch: model expects {expected}, got {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Feature '{column}' in row {row} has the wrong type")]
    FeatureType { column: String, row: usize },

    #[error("Model returned {found} predictions for {expected} rows")]
    OutputLength { expected: usize, found: usize },

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Batch regressor contract: one prediction per input row, in input order.
#[cfg_attr(test, mockall::automock)]
pub trait Regressor: Send + Sync {
    fn predict(&self, rows: &FeatureTable) -> Result<Vec<f64>, ModelError>;
}
