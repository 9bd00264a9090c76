use std::sync::Arc;

use strum::IntoEnumIterator;
use tracing::{debug, error};

use super::features::{FeatureBuilder, HistoryFeatures};
use super::metrics::{percent_change, ForecastMetrics, ResidualBand};
use crate::dataset::DatasetIndex;
use crate::domain::{
    ComparisonResult, FeatureTable, ForecastResult, HistoryResult, MetricsReport, ModelScores,
};
use crate::error::ForecastError;
use crate::ml::{ModelError, ModelKey, ModelRegistry, Regressor};

/// Stateless inference over the shared dataset and model registry
pub struct ForecastService {
    index: Arc<DatasetIndex>,
    registry: Arc<ModelRegistry>,
}

impl ForecastService {
    pub fn new(index: Arc<DatasetIndex>, registry: Arc<ModelRegistry>) -> Self {
        Self { index, registry }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn countries(&self) -> &[String] {
        self.index.countries()
    }

    fn validate(&self, country: &str) -> Result<(), ForecastError> {
        if self.index.contains(country) {
            Ok(())
        } else {
            Err(ForecastError::InvalidCountry(country.to_string()))
        }
    }

    /// Fit the selected model over history and forecast `year`
    pub fn predict_one<S: AsRef<str>>(
        &self,
        country: &str,
        year: i32,
        requested_models: &[S],
    ) -> Result<ForecastResult, ForecastError> {
        self.validate(country)?;

        let builder = FeatureBuilder::new(&self.index);
        let history = builder.build_history_features(country)?;
        let future_row = builder.build_future_row(&history, country, year)?;

        let model_key = self.registry.select(requested_models);
        let model = self
            .registry
            .get(model_key)
            .ok_or(ForecastError::ModelUnavailable(model_key))?;

        let fit = run(model.as_ref(), &history.table)?;
        // `run` guarantees exactly one output for the single future row
        let future = run(model.as_ref(), &future_row)?[0];

        let current = fit.last().copied().unwrap_or_default();
        let change = percent_change(current, future);

        let band = ResidualBand::from_fit(&history.targets, &fit);
        let bands = fit
            .iter()
            .chain(std::iter::once(&future))
            .map(|v| band.bounds(*v))
            .collect();

        let mut years = history.years();
        years.push(year);
        let mut values = fit;
        values.push(future);

        debug!(
            country,
            year,
            model = %model_key,
            current,
            predicted = future,
            change,
            "forecast computed"
        );

        Ok(ForecastResult {
            model_used: model_key,
            years,
            values,
            current,
            predicted: future,
            change,
            band: bands,
            metrics: Default::default(),
        })
    }

    /// Historical fit of every model. A failing or missing model contributes
    /// an empty series; the comparison itself never fails after validation.
    pub fn compare_all(&self, country: &str) -> Result<ComparisonResult, ForecastError> {
        self.validate(country)?;

        let history = FeatureBuilder::new(&self.index).history(country);
        let mut result = ComparisonResult {
            years: history.years(),
            ..Default::default()
        };

        for key in ModelKey::iter() {
            match self.fit(key, &history) {
                Ok(fit) => *result.series_mut(key) = fit,
                Err(e) => error!(model = %key, country, error = %e, "model comparison failed"),
            }
        }

        Ok(result)
    }

    /// MAE, RMSE, R² and MAPE of every model over the country's history.
    /// A model that fails reports every metric as missing.
    pub fn metrics_all(&self, country: &str) -> Result<MetricsReport, ForecastError> {
        self.validate(country)?;

        let history = FeatureBuilder::new(&self.index).build_history_features(country)?;
        let mut report = MetricsReport::default();

        for key in ModelKey::iter() {
            let scores = self.fit(key, &history).and_then(|fit| {
                ForecastMetrics::calculate(&history.targets, &fit)
                    .map_err(|e| ForecastError::Prediction(ModelError::Inference(e.to_string())))
            });
            *report.scores_mut(key) = match scores {
                Ok(metrics) => {
                    debug!(model = %key, country, %metrics, "model scored");
                    ModelScores::from(metrics)
                }
                Err(e) => {
                    error!(model = %key, country, error = %e, "metrics computation failed");
                    ModelScores::missing()
                }
            };
        }

        Ok(report)
    }

    /// Observed history only, no model involvement
    pub fn history_only(&self, country: &str) -> Result<HistoryResult, ForecastError> {
        self.validate(country)?;

        let history = FeatureBuilder::new(&self.index).build_history_features(country)?;
        Ok(HistoryResult {
            years: history.years(),
            true_values: history.targets,
        })
    }

    fn fit(&self, key: ModelKey, history: &HistoryFeatures<'_>) -> Result<Vec<f64>, ForecastError> {
        let model = self
            .registry
            .get(key)
            .ok_or(ForecastError::ModelUnavailable(key))?;
        Ok(run(model.as_ref(), &history.table)?)
    }
}

/// Run a regressor and enforce one output per input row
fn run(model: &dyn Regressor, table: &FeatureTable) -> Result<Vec<f64>, ModelError> {
    let out = model.predict(table)?;
    if out.len() != table.len() {
        return Err(ModelError::OutputLength {
            expected: table.len(),
            found: out.len(),
        });
    }
    Ok(out)
}
