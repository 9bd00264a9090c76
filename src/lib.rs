//! Water consumption forecast service.
//!
//! Serves per-country forecasts from pre-trained lasso, ridge and knn
//! regressors over a static historical table.

pub mod api;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod ml;
pub mod state;
pub mod telemetry;
