use thiserror::Error;

use crate::dataset::DatasetError;
use crate::ml::{ModelError, ModelKey};

/// Failures of a single forecast request
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Invalid country: {0}")]
    InvalidCountry(String),

    #[error("No data for country {0}")]
    NoData(String),

    #[error("Model '{0}' is not loaded")]
    ModelUnavailable(ModelKey),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] ModelError),
}

/// Failures that prevent the service from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
