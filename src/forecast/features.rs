//! Feature construction for per-country forecasting
//!
//! History features come straight from the dataset. The future row uses a
//! naive hold-last-value extrapolation: every covariate except year and
//! country keeps its most recently observed value. The models are expected to
//! carry the year trend; trends in the other covariates (population,
//! rainfall, sector shares, ...) are ignored entirely. This is the single
//! largest source of forecast inaccuracy and is kept for compatibility with
//! the served model artifacts.

use crate::dataset::DatasetIndex;
use crate::domain::{FeatureTable, HistoricalRecord};
use crate::error::ForecastError;

/// A country's history, aligned row for row
#[derive(Debug, Clone)]
pub struct HistoryFeatures<'a> {
    pub records: &'a [HistoricalRecord],
    pub table: FeatureTable,
    pub targets: Vec<f64>,
}

impl HistoryFeatures<'_> {
    pub fn years(&self) -> Vec<i32> {
        self.records.iter().map(|r| r.year).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct FeatureBuilder<'a> {
    index: &'a DatasetIndex,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(index: &'a DatasetIndex) -> Self {
        Self { index }
    }

    /// History features, possibly empty for a country without rows
    pub fn history(&self, country: &str) -> HistoryFeatures<'a> {
        let records = self.index.records_for(country);
        let table = FeatureTable::new(
            self.index.schema().clone(),
            records.iter().map(|r| r.features.clone()).collect(),
        );
        HistoryFeatures {
            records,
            table,
            targets: records.iter().map(|r| r.target).collect(),
        }
    }

    /// History features; `NoData` when the country has no rows
    pub fn build_history_features(&self, country: &str) -> Result<HistoryFeatures<'a>, ForecastError> {
        let history = self.history(country);
        if history.is_empty() {
            return Err(ForecastError::NoData(country.to_string()));
        }
        Ok(history)
    }

    /// The last history row with year and country overwritten
    pub fn build_future_row(
        &self,
        history: &HistoryFeatures<'_>,
        country: &str,
        year: i32,
    ) -> Result<FeatureTable, ForecastError> {
        let mut row = history
            .table
            .rows()
            .last()
            .cloned()
            .ok_or_else(|| ForecastError::NoData(country.to_string()))?;
        row.set(self.index.year_position(), year as f64);
        row.set(self.index.country_position(), country);
        Ok(FeatureTable::single(self.index.schema().clone(), row))
    }
}
