use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How seasonal terms combine with the trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalityMode {
    Additive,
    Multiplicative,
}

impl FromStr for SeasonalityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "additive" => Ok(SeasonalityMode::Additive),
            "multiplicative" => Ok(SeasonalityMode::Multiplicative),
            other => Err(format!("Unknown seasonality mode: {}", other)),
        }
    }
}

/// A Fourier seasonality: `fourier_order` sin/cos pairs over `period_days`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityConfig {
    pub name: String,
    pub period_days: f64,
    pub fourier_order: usize,
    pub prior_scale: f64,
}

impl SeasonalityConfig {
    pub fn yearly() -> Self {
        Self {
            name: "yearly".to_string(),
            period_days: 365.25,
            fourier_order: 10,
            prior_scale: 10.0,
        }
    }

    pub fn semiannual() -> Self {
        Self {
            name: "semiannual".to_string(),
            period_days: 365.25 / 2.0,
            fourier_order: 8,
            prior_scale: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub changepoint_prior_scale: f64,
    pub n_changepoints: usize,
    /// Share of the history in which changepoints may be placed
    pub changepoint_range: f64,
    pub seasonality_mode: SeasonalityMode,
    pub seasonalities: Vec<SeasonalityConfig>,
    pub interval_width: f64,
    pub uncertainty_samples: usize,
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            changepoint_prior_scale: 0.12,
            n_changepoints: 25,
            changepoint_range: 0.8,
            seasonality_mode: SeasonalityMode::Multiplicative,
            seasonalities: vec![SeasonalityConfig::yearly(), SeasonalityConfig::semiannual()],
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 42,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.changepoint_prior_scale > 0.0) {
            return Err("CHANGEPOINT_PRIOR_SCALE must be positive".to_string());
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err("changepoint_range must be in (0, 1]".to_string());
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(format!(
                "INTERVAL_WIDTH must be strictly between 0 and 1, got {}",
                self.interval_width
            ));
        }
        for s in &self.seasonalities {
            if !(s.period_days > 0.0) || s.fourier_order == 0 || !(s.prior_scale > 0.0) {
                return Err(format!("Invalid seasonality '{}'", s.name));
            }
        }
        Ok(())
    }
}

/// One row of the forecast frame. Seasonal component values follow the
/// order of `Forecast::seasonality_names`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub trend: f64,
    pub trend_lower: f64,
    pub trend_upper: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub multiplicative_terms: f64,
    pub additive_terms: f64,
    pub seasonal: Vec<f64>,
    pub yhat: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub rows: Vec<ForecastRow>,
    pub seasonality_names: Vec<String>,
    pub history_end: NaiveDate,
    pub horizon: usize,
}

impl Forecast {
    /// Rows strictly after the last observed date
    pub fn future(&self) -> impl Iterator<Item = &ForecastRow> {
        let end = self.history_end;
        self.rows.iter().filter(move |r| r.ds > end)
    }

    pub fn history(&self) -> impl Iterator<Item = &ForecastRow> {
        let end = self.history_end;
        self.rows.iter().filter(move |r| r.ds <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seasonality_mode_parse() {
        assert_eq!("Multiplicative".parse::<SeasonalityMode>(), Ok(SeasonalityMode::Multiplicative));
        assert_eq!(" additive ".parse::<SeasonalityMode>(), Ok(SeasonalityMode::Additive));
        assert!("log".parse::<SeasonalityMode>().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ModelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seasonalities.len(), 2);
        assert_eq!(config.seasonalities[1].fourier_order, 8);
    }

    #[test]
    fn test_invalid_interval_width() {
        let config = ModelConfig {
            interval_width: 1.0,
            ..ModelConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
