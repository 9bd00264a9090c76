//! Model Registry
//!
//! Holds the regressors loaded at startup. The registry is immutable once
//! built and is shared read-only by every request.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use strum::IntoEnumIterator;
use tracing::{info, warn};

use super::{ModelArtifact, ModelError, ModelKey, Regressor};
use crate::config::ModelsConfig;

#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<ModelKey, Arc<dyn Regressor>>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.available())
            .finish()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the three served artifacts.
    ///
    /// With `require_all` set, the first missing or unreadable artifact is
    /// returned as an error. Otherwise failures are logged and skipped.
    pub fn load(cfg: &ModelsConfig) -> Result<Self, ModelError> {
        let mut registry = Self::new();
        for key in ModelKey::iter() {
            let path = cfg.artifact_path(key);
            match ModelArtifact::load_expecting(&path, key) {
                Ok(artifact) => {
                    info!(
                        model = %key,
                        path = %path.display(),
                        version = %artifact.metadata.version,
                        "loaded model artifact"
                    );
                    registry = registry.with_model(key, Arc::new(artifact));
                }
                Err(e) if cfg.require_all => return Err(e),
                Err(e) => warn!(model = %key, error = %e, "model unavailable, continuing without it"),
            }
        }
        Ok(registry)
    }

    pub fn with_model(mut self, key: ModelKey, model: Arc<dyn Regressor>) -> Self {
        self.models.insert(key, model);
        self
    }

    pub fn get(&self, key: ModelKey) -> Option<&Arc<dyn Regressor>> {
        self.models.get(&key)
    }

    pub fn contains(&self, key: ModelKey) -> bool {
        self.models.contains_key(&key)
    }

    /// Loaded model keys, in canonical order
    pub fn available(&self) -> Vec<ModelKey> {
        self.models.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Pick the first requested name that parses (case-insensitively) to a
    /// loaded model; fall back to [`ModelKey::DEFAULT`].
    pub fn select<S: AsRef<str>>(&self, requested: &[S]) -> ModelKey {
        requested
            .iter()
            .filter_map(|name| name.as_ref().parse::<ModelKey>().ok())
            .find(|key| self.contains(*key))
            .unwrap_or(ModelKey::DEFAULT)
    }
}
