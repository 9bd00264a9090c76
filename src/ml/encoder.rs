//! Numeric encoding of feature tables
//!
//! Numeric columns are z-score standardized with the training statistics and
//! categorical columns are one-hot encoded against the training vocabulary.
//! A category never seen during training encodes to all zeros.

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::ModelError;
use crate::domain::{FeatureSchema, FeatureTable, FeatureValue};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
    means: Vec<f64>,
    stds: Vec<f64>,
    vocabularies: Vec<Vec<String>>,
}

impl FeatureEncoder {
    /// Learn standardization statistics and category vocabularies from a table
    pub fn fit(table: &FeatureTable) -> Result<Self, ModelError> {
        let schema = table.schema().clone();
        let n_numeric = schema.numeric.len();
        let n = table.len().max(1) as f64;

        let mut sums = vec![0.0; n_numeric];
        let mut vocabularies: Vec<Vec<String>> = vec![Vec::new(); schema.categorical.len()];

        for (r, row) in table.rows().iter().enumerate() {
            for (i, sum) in sums.iter_mut().enumerate() {
                *sum += numeric_at(&schema, row.values(), i, r)?;
            }
            for (j, vocab) in vocabularies.iter_mut().enumerate() {
                let category = category_at(&schema, row.values(), j, r)?;
                if !vocab.iter().any(|c| c == category) {
                    vocab.push(category.to_string());
                }
            }
        }

        let means: Vec<f64> = sums.iter().map(|s| s / n).collect();
        let mut variances = vec![0.0; n_numeric];
        for (r, row) in table.rows().iter().enumerate() {
            for (i, var) in variances.iter_mut().enumerate() {
                let v = numeric_at(&schema, row.values(), i, r)?;
                *var += (v - means[i]).powi(2);
            }
        }
        let stds = variances.iter().map(|v| (v / n).sqrt()).collect();

        for vocab in vocabularies.iter_mut() {
            vocab.sort();
        }

        Ok(Self {
            schema,
            means,
            stds,
            vocabularies,
        })
    }

    /// Width of the encoded design matrix
    pub fn width(&self) -> usize {
        self.means.len() + self.vocabularies.iter().map(Vec::len).sum::<usize>()
    }

    /// Encode a table into a row-major design matrix.
    ///
    /// The table schema must be identical to the training schema; column
    /// order is part of the contract.
    pub fn transform(&self, table: &FeatureTable) -> Result<DenseMatrix<f64>, ModelError> {
        let flat = self.transform_flat(table)?;
        Ok(DenseMatrix::new(table.len(), self.width(), flat, false))
    }

    pub(crate) fn transform_flat(&self, table: &FeatureTable) -> Result<Vec<f64>, ModelError> {
        if table.schema() != &self.schema {
            return Err(ModelError::SchemaMismatch {
                expected: self.schema.to_string(),
                found: table.schema().to_string(),
            });
        }

        let width = self.width();
        let mut flat = Vec::with_capacity(table.len() * width);
        for (r, row) in table.rows().iter().enumerate() {
            for i in 0..self.means.len() {
                let v = numeric_at(&self.schema, row.values(), i, r)?;
                flat.push(if self.stds[i].abs() < 1e-10 {
                    0.0
                } else {
                    (v - self.means[i]) / self.stds[i]
                });
            }
            for (j, vocab) in self.vocabularies.iter().enumerate() {
                let category = category_at(&self.schema, row.values(), j, r)?;
                flat.extend(vocab.iter().map(|c| if c == category { 1.0 } else { 0.0 }));
            }
        }
        Ok(flat)
    }
}

fn numeric_at(
    schema: &FeatureSchema,
    values: &[FeatureValue],
    i: usize,
    row: usize,
) -> Result<f64, ModelError> {
    values
        .get(i)
        .and_then(FeatureValue::as_number)
        .ok_or_else(|| ModelError::FeatureType {
            column: schema.numeric[i].clone(),
            row,
        })
}

fn category_at<'a>(
    schema: &FeatureSchema,
    values: &'a [FeatureValue],
    j: usize,
    row: usize,
) -> Result<&'a str, ModelError> {
    values
        .get(schema.numeric.len() + j)
        .and_then(FeatureValue::as_category)
        .ok_or_else(|| ModelError::FeatureType {
            column: schema.categorical[j].clone(),
            row,
        })
}
