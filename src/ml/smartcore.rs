//! SmartCore model artifacts
//!
//! A [`ModelArtifact`] bundles a fitted SmartCore estimator with the
//! [`FeatureEncoder`] it was trained behind and descriptive metadata. Artifacts
//! are persisted with bincode and loaded once at startup.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::lasso::{Lasso, LassoParameters};
use smartcore::linear::ridge_regression::{RidgeRegression, RidgeRegressionParameters};
use smartcore::metrics::distance::euclidian::Euclidian;
use smartcore::neighbors::knn_regressor::{KNNRegressor, KNNRegressorParameters};

use super::{FeatureEncoder, ModelError, ModelKey, ModelMetadata, Regressor};
use crate::domain::FeatureTable;

type Matrix = DenseMatrix<f64>;

/// Fitted estimator, one variant per served model
#[derive(Serialize, Deserialize)]
pub enum Estimator {
    Lasso(Lasso<f64, f64, Matrix, Vec<f64>>),
    Ridge(RidgeRegression<f64, f64, Matrix, Vec<f64>>),
    Knn(KNNRegressor<f64, f64, Matrix, Vec<f64>, Euclidian<f64>>),
}

impl Estimator {
    pub fn key(&self) -> ModelKey {
        match self {
            Self::Lasso(_) => ModelKey::Lasso,
            Self::Ridge(_) => ModelKey::Ridge,
            Self::Knn(_) => ModelKey::Knn,
        }
    }

    fn predict(&self, x: &Matrix) -> Result<Vec<f64>, ModelError> {
        let result = match self {
            Self::Lasso(m) => m.predict(x),
            Self::Ridge(m) => m.predict(x),
            Self::Knn(m) => m.predict(x),
        };
        result.map_err(|e| ModelError::Inference(format!("{:?}", e)))
    }
}

/// Hyper-parameters used when fitting an artifact
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitOptions {
    /// Regularization strength for lasso and ridge
    pub alpha: f64,
    /// Neighbour count for knn (clamped to the sample count)
    pub k: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { alpha: 0.1, k: 5 }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ModelMetadata,
    encoder: FeatureEncoder,
    estimator: Estimator,
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("metadata", &self.metadata)
            .field("encoded_width", &self.encoder.width())
            .finish_non_exhaustive()
    }
}

impl ModelArtifact {
    /// Fit an estimator of kind `key` on a feature table and its targets.
    ///
    /// Serving never calls this; it exists to produce artifacts offline.
    pub fn fit(
        key: ModelKey,
        table: &FeatureTable,
        targets: &[f64],
        options: FitOptions,
    ) -> Result<Self, ModelError> {
        if table.is_empty() {
            return Err(ModelError::Training("Cannot train on empty dataset".to_string()));
        }
        if table.len() != targets.len() {
            return Err(ModelError::Training(format!(
                "Feature and target count mismatch: {} rows, {} targets",
                table.len(),
                targets.len()
            )));
        }

        let encoder = FeatureEncoder::fit(table)?;
        let x = encoder.transform(table)?;
        let y = targets.to_vec();
        let failed = |e: smartcore::error::Failed| ModelError::Training(format!("{:?}", e));

        let estimator = match key {
            ModelKey::Lasso => {
                let params = LassoParameters::default()
                    .with_alpha(options.alpha)
                    .with_normalize(false);
                Estimator::Lasso(Lasso::fit(&x, &y, params).map_err(failed)?)
            }
            ModelKey::Ridge => {
                let params = RidgeRegressionParameters::default()
                    .with_alpha(options.alpha)
                    .with_normalize(false);
                Estimator::Ridge(RidgeRegression::fit(&x, &y, params).map_err(failed)?)
            }
            ModelKey::Knn => {
                let params = KNNRegressorParameters::default().with_k(options.k.clamp(1, table.len()));
                Estimator::Knn(KNNRegressor::fit(&x, &y, params).map_err(failed)?)
            }
        };

        let metadata = ModelMetadata {
            key,
            version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: chrono::Utc::now(),
            training_samples: table.len(),
            feature_names: table.schema().columns().map(str::to_string).collect(),
        };

        Ok(Self {
            metadata,
            encoder,
            estimator,
        })
    }

    pub fn key(&self) -> ModelKey {
        self.estimator.key()
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let file = File::create(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::MissingArtifact(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(bincode::deserialize_from(BufReader::new(file))?)
    }

    /// Load an artifact and check it holds the expected kind of model
    pub fn load_expecting(path: &Path, expected: ModelKey) -> Result<Self, ModelError> {
        let artifact = Self::load(path)?;
        let found = artifact.key();
        if found != expected {
            return Err(ModelError::WrongModel { expected, found });
        }
        Ok(artifact)
    }
}

impl Regressor for ModelArtifact {
    fn predict(&self, rows: &FeatureTable) -> Result<Vec<f64>, ModelError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = self.encoder.transform(rows)?;
        self.estimator.predict(&x)
    }
}
