use std::{fs, sync::Arc};

use serde::Deserialize;

use crate::{
    model::{EtsModel, MIN_FIT_OBSERVATIONS},
    policy::{ForecastPolicy, DEFAULT_FORECAST_VALUE, MIN_OBSERVATIONS},
};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub default_value: f64,
    pub min_observations: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_value: DEFAULT_FORECAST_VALUE,
            min_observations: MIN_OBSERVATIONS,
        }
    }
}

impl ForecastConfig {
    pub fn policy(&self) -> anyhow::Result<ForecastPolicy> {
        if !self.default_value.is_finite() {
            anyhow::bail!("forecast.default_value must be finite, got {}", self.default_value);
        }
        // Below this the model would be asked to fit series it always rejects.
        if self.min_observations < MIN_FIT_OBSERVATIONS {
            anyhow::bail!(
                "forecast.min_observations must be at least {MIN_FIT_OBSERVATIONS}, got {}",
                self.min_observations
            );
        }
        Ok(ForecastPolicy::new(Arc::new(EtsModel::new()))
            .with_default_value(self.default_value)
            .with_min_observations(self.min_observations))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path =
            env::var("FORECAST_CONFIG").unwrap_or_else(|_| "forecast-config.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config file '{path}': {e}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}
