use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::dataset::DatasetIndex;
use crate::error::StartupError;
use crate::forecast::ForecastService;
use crate::ml::ModelRegistry;

/// Process-wide, read-only state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub service: Arc<ForecastService>,
}

impl AppState {
    /// Load the dataset and model artifacts named by `cfg`
    pub fn load(cfg: Config) -> Result<Self, StartupError> {
        let index = DatasetIndex::load(&cfg.dataset)?;
        let registry = ModelRegistry::load(&cfg.models)?;
        info!(
            models = ?registry.available(),
            countries = index.countries().len(),
            "forecast service ready"
        );
        let service = ForecastService::new(Arc::new(index), Arc::new(registry));
        Ok(Self::new(cfg, service))
    }

    pub fn new(cfg: Config, service: ForecastService) -> Self {
        Self {
            cfg,
            service: Arc::new(service),
        }
    }
}
