use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ml::ModelKey;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            enable_cors: true,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub target_column: String,
    pub country_column: String,
    pub year_column: String,
    pub categorical_columns: Vec<String>,
    /// Columns whose values may carry `,` thousands separators
    pub thousands_separator_columns: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/WaterConsumptionDataset(Finalized).csv"),
            target_column: "Total Water Consumption(Billion Cubic Meters)".to_string(),
            country_column: "Country".to_string(),
            year_column: "Year".to_string(),
            categorical_columns: vec!["Country".to_string(), "Water Scarcity Level".to_string()],
            thousands_separator_columns: vec!["Population".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub dir: PathBuf,
    pub lasso: String,
    pub ridge: String,
    pub knn: String,
    /// Refuse to start unless every artifact loads
    pub require_all: bool,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            lasso: "lasso.bin".to_string(),
            ridge: "ridge.bin".to_string(),
            knn: "knn.bin".to_string(),
            require_all: true,
        }
    }
}

impl ModelsConfig {
    pub fn artifact_path(&self, key: ModelKey) -> PathBuf {
        let file = match key {
            ModelKey::Lasso => &self.lasso,
            ModelKey::Ridge => &self.ridge,
            ModelKey::Knn => &self.knn,
        };
        self.dir.join(file)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::figment().extract().map_err(Into::into)
    }

    /// Defaults, then `config/default.toml`, then `WATER__` environment overrides
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("WATER__").split("__"))
    }
}
