use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::models::{ModelConfig, SeasonalityMode};

pub const MIN_HORIZON: usize = 6;
pub const MAX_HORIZON: usize = 36;

/// Input file locations, tried in order: processed first, then raw FAO export.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub processed: PathBuf,
    pub raw: PathBuf,
}

impl DataPaths {
    pub fn from_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            processed: data_dir.join("processed").join("maize_prices_monthly.csv"),
            raw: data_dir.join("raw").join("producer-prices_ben.csv"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data: DataPaths,
    pub bind_address: String,
    pub default_horizon: usize,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let mut data = DataPaths::from_dir(&data_dir);
        if let Ok(path) = std::env::var("PROCESSED_CSV") {
            data.processed = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("RAW_CSV") {
            data.raw = PathBuf::from(path);
        }

        let defaults = ModelConfig::default();
        let model = ModelConfig {
            changepoint_prior_scale: env_parse("CHANGEPOINT_PRIOR_SCALE", defaults.changepoint_prior_scale),
            seasonality_mode: env_parse::<SeasonalityMode>("SEASONALITY_MODE", defaults.seasonality_mode),
            interval_width: env_parse("INTERVAL_WIDTH", defaults.interval_width),
            uncertainty_samples: env_parse("UNCERTAINTY_SAMPLES", defaults.uncertainty_samples),
            seed: env_parse("RANDOM_SEED", defaults.seed),
            ..defaults
        };

        Self {
            data,
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            default_horizon: env_parse("DEFAULT_HORIZON", 24),
            model,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_HORIZON..=MAX_HORIZON).contains(&self.default_horizon) {
            return Err(format!(
                "DEFAULT_HORIZON must be between {} and {}, got {}",
                MIN_HORIZON, MAX_HORIZON, self.default_horizon
            ));
        }
        self.model.validate()
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    parse_setting(key, std::env::var(key).ok().as_deref(), default)
}

/// Unset keeps the default quietly; a value that does not parse keeps it with a warning.
fn parse_setting<T: FromStr>(key: &str, raw: Option<&str>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Ignoring invalid {}={:?}, using the default", key, raw);
            default
        }
    }
}
