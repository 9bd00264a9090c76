use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Feature Schema
// ============================================================================

/// Column layout every regressor is trained against.
///
/// The final column order is the numeric columns (in source order) followed by
/// the categorical columns (in source order). Identity and order must match
/// the schema stored in a model artifact exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl FeatureSchema {
    pub fn new(numeric: Vec<String>, categorical: Vec<String>) -> Self {
        Self {
            numeric,
            categorical,
        }
    }

    /// All feature columns in model order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .map(String::as_str)
    }

    /// Position of a column in model order
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns().position(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<&str> = self.columns().collect();
        write!(f, "[{}]", columns.join(", "))
    }
}

// ============================================================================
// Feature Values
// ============================================================================

/// A single cell of a feature row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Category(c) => Some(c),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        Self::Category(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        Self::Category(v)
    }
}

/// One regressor input, aligned to a [`FeatureSchema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    values: Vec<FeatureValue>,
}

impl FeatureRow {
    pub fn new(values: Vec<FeatureValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn get(&self, position: usize) -> Option<&FeatureValue> {
        self.values.get(position)
    }

    /// Overwrite the value at `position`. Out-of-range positions are ignored.
    pub fn set(&mut self, position: usize, value: impl Into<FeatureValue>) {
        if let Some(slot) = self.values.get_mut(position) {
            *slot = value.into();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A batch of feature rows sharing one schema
#[derive(Debug, Clone)]
pub struct FeatureTable {
    schema: Arc<FeatureSchema>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(schema: Arc<FeatureSchema>, rows: Vec<FeatureRow>) -> Self {
        Self { schema, rows }
    }

    pub fn single(schema: Arc<FeatureSchema>, row: FeatureRow) -> Self {
        Self::new(schema, vec![row])
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Historical Records
// ============================================================================

/// One country-year row of the source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub country: String,
    pub year: i32,
    /// Covariates in schema order (includes year and country)
    pub features: FeatureRow,
    /// Total water consumption
    pub target: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            vec!["Year".to_string(), "Population".to_string()],
            vec!["Country".to_string(), "Water Scarcity Level".to_string()],
        )
    }

    #[test]
    fn test_schema_orders_numeric_before_categorical() {
        let schema = schema();
        let columns: Vec<&str> = schema.columns().collect();
        assert_eq!(
            columns,
            vec!["Year", "Population", "Country", "Water Scarcity Level"]
        );
        assert_eq!(schema.position("Country"), Some(2));
        assert_eq!(schema.position("Target"), None);
    }

    #[test]
    fn test_row_set_overwrites_in_place() {
        let mut row = FeatureRow::new(vec![
            2020.0.into(),
            1_000.0.into(),
            "Brazil".into(),
            "Low".into(),
        ]);
        row.set(0, 2030.0);
        row.set(2, "Chile");
        row.set(9, 1.0);

        assert_eq!(row.get(0).and_then(FeatureValue::as_number), Some(2030.0));
        assert_eq!(row.get(2).and_then(FeatureValue::as_category), Some("Chile"));
        assert_eq!(row.len(), 4);
    }

    #[test]
    fn test_feature_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            FeatureValue::Number(1.5),
            FeatureValue::Category("High".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"[1.5,"High"]"#);
    }
}
