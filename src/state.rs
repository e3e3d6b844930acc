use std::sync::Arc;

use tracing::info;

use crate::errors::AppError;
use crate::models::{Dataset, Forecast};
use crate::services::forecast_cache::ForecastCache;
use crate::services::forecasting_service;
use crate::services::seasonal_model::SeasonalModel;

/// Dataset and fitted model are loaded once at startup and shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<Dataset>,
    pub model: Arc<SeasonalModel>,
    pub forecast_cache: ForecastCache,
    pub default_horizon: usize,
}

impl AppState {
    pub fn new(dataset: Dataset, model: SeasonalModel, default_horizon: usize) -> Self {
        Self {
            dataset: Arc::new(dataset),
            model: Arc::new(model),
            forecast_cache: ForecastCache::new(),
            default_horizon,
        }
    }

    /// Cached forecast for `horizon`, computed on the blocking pool on a miss.
    pub async fn forecast(&self, horizon: usize) -> Result<Arc<Forecast>, AppError> {
        let horizon = forecasting_service::validate_horizon(horizon)?;
        if let Some(forecast) = self.forecast_cache.get(horizon) {
            return Ok(forecast);
        }

        let model = Arc::clone(&self.model);
        let dataset = Arc::clone(&self.dataset);
        let forecast = tokio::task::spawn_blocking(move || {
            forecasting_service::build_forecast(&model, &dataset, horizon)
        })
        .await
        .map_err(|e| AppError::Model(format!("Forecast task failed: {}", e)))??;

        info!("Cached forecast for horizon {}", horizon);
        Ok(self.forecast_cache.insert(horizon, forecast))
    }
}
