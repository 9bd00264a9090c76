//! Dataset Index
//!
//! Loads the historical consumption table once at startup and exposes the
//! derived country list, feature schema and per-country history.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use itertools::Itertools;
use thiserror::Error;
use tracing::info;

use crate::config::DatasetConfig;
use crate::domain::{FeatureRow, FeatureSchema, FeatureValue, HistoricalRecord};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not found at {0}")]
    NotFound(std::path::PathBuf),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{0}' is missing")]
    MissingColumn(String),

    #[error("Row {row}: column '{column}' value '{value}' is not a number")]
    BadNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row}: year '{value}' is not an integer")]
    BadYear { row: usize, value: String },

    #[error("Duplicate row for {country} in {year}")]
    DuplicateYear { country: String, year: i32 },
}

#[derive(Debug, Clone)]
pub struct DatasetIndex {
    schema: Arc<FeatureSchema>,
    countries: Vec<String>,
    records: HashMap<String, Vec<HistoricalRecord>>,
    year_position: usize,
    country_position: usize,
}

impl DatasetIndex {
    pub fn load(cfg: &DatasetConfig) -> Result<Self, DatasetError> {
        if !cfg.path.exists() {
            return Err(DatasetError::NotFound(cfg.path.clone()));
        }
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&cfg.path)?;
        let index = Self::from_csv(reader, cfg)?;
        info!(
            path = %cfg.path.display(),
            countries = index.countries.len(),
            rows = index.row_count(),
            features = index.schema.len(),
            "dataset loaded"
        );
        Ok(index)
    }

    pub fn from_reader<R: Read>(rdr: R, cfg: &DatasetConfig) -> Result<Self, DatasetError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);
        Self::from_csv(reader, cfg)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>, cfg: &DatasetConfig) -> Result<Self, DatasetError> {
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };

        let target_idx = column(cfg.target_column.as_str())?;
        let country_idx = column(cfg.country_column.as_str())?;
        let year_idx = column(cfg.year_column.as_str())?;
        for name in &cfg.categorical_columns {
            column(name.as_str())?;
        }

        let is_categorical =
            |h: &str| h == cfg.country_column || cfg.categorical_columns.iter().any(|c| c == h);

        // Source positions of the feature columns, in model order
        let numeric: Vec<usize> = (0..headers.len())
            .filter(|&i| i != target_idx && !is_categorical(&headers[i]))
            .collect();
        let categorical: Vec<usize> = (0..headers.len())
            .filter(|&i| i != target_idx && is_categorical(&headers[i]))
            .collect();
        let order: Vec<usize> = numeric.iter().chain(categorical.iter()).copied().collect();

        let schema = Arc::new(FeatureSchema::new(
            numeric.iter().map(|&i| headers[i].to_string()).collect(),
            categorical.iter().map(|&i| headers[i].to_string()).collect(),
        ));
        let year_position = schema
            .position(&cfg.year_column)
            .ok_or_else(|| DatasetError::MissingColumn(cfg.year_column.clone()))?;
        let country_position = schema
            .position(&cfg.country_column)
            .ok_or_else(|| DatasetError::MissingColumn(cfg.country_column.clone()))?;

        let mut records: HashMap<String, Vec<HistoricalRecord>> = HashMap::new();
        for (i, result) in reader.records().enumerate() {
            let row = i + 2; // 1-based, after the header line
            let record = result?;
            let field = |idx: usize| record.get(idx).unwrap_or("");

            let country = field(country_idx);
            if country.is_empty() {
                continue;
            }

            let number = |idx: usize| -> Result<f64, DatasetError> {
                let raw = field(idx);
                let column = &headers[idx];
                let cleaned = if cfg.thousands_separator_columns.iter().any(|c| c == column) {
                    raw.replace(',', "")
                } else {
                    raw.to_string()
                };
                cleaned.parse::<f64>().map_err(|_| DatasetError::BadNumber {
                    row,
                    column: column.to_string(),
                    value: raw.to_string(),
                })
            };

            let year_value = number(year_idx)?;
            if year_value.fract() != 0.0 || year_value.abs() > i32::MAX as f64 {
                return Err(DatasetError::BadYear {
                    row,
                    value: field(year_idx).to_string(),
                });
            }

            let values = order
                .iter()
                .map(|&idx| {
                    if is_categorical(&headers[idx]) {
                        Ok(FeatureValue::Category(field(idx).to_string()))
                    } else {
                        number(idx).map(FeatureValue::Number)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;

            records
                .entry(country.to_string())
                .or_default()
                .push(HistoricalRecord {
                    country: country.to_string(),
                    year: year_value as i32,
                    features: FeatureRow::new(values),
                    target: number(target_idx)?,
                });
        }

        for (country, history) in records.iter_mut() {
            history.sort_by_key(|r| r.year);
            if let Some((a, _)) = history.iter().tuple_windows().find(|(a, b)| a.year == b.year) {
                return Err(DatasetError::DuplicateYear {
                    country: country.clone(),
                    year: a.year,
                });
            }
        }

        let countries = records.keys().cloned().sorted().collect();

        Ok(Self {
            schema,
            countries,
            records,
            year_position,
            country_position,
        })
    }

    /// Sorted, deduplicated country identifiers
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn contains(&self, country: &str) -> bool {
        self.countries
            .binary_search_by(|c| c.as_str().cmp(country))
            .is_ok()
    }

    /// History of `country` sorted by year; empty when unknown
    pub fn records_for(&self, country: &str) -> &[HistoricalRecord] {
        self.records
            .get(country)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn year_position(&self) -> usize {
        self.year_position
    }

    pub fn country_position(&self) -> usize {
        self.country_position
    }

    pub fn row_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}
