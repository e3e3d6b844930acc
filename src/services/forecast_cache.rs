use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::models::Forecast;

#[derive(Debug, Clone)]
pub struct CachedForecast {
    pub forecast: Arc<Forecast>,
    pub computed_at: DateTime<Utc>,
}

/// Thread-safe cache of forecasts keyed by horizon.
/// Every forecast is derived from the same fitted model, so entries never go stale.
#[derive(Clone, Default)]
pub struct ForecastCache {
    cache: Arc<DashMap<usize, CachedForecast>>,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, horizon: usize) -> Option<Arc<Forecast>> {
        let entry = self.cache.get(&horizon)?;
        debug!(
            "Forecast cache hit for horizon {} (computed at {})",
            horizon,
            entry.value().computed_at
        );
        Some(Arc::clone(&entry.value().forecast))
    }

    pub fn insert(&self, horizon: usize, forecast: Forecast) -> Arc<Forecast> {
        let forecast = Arc::new(forecast);
        self.cache.insert(
            horizon,
            CachedForecast {
                forecast: Arc::clone(&forecast),
                computed_at: Utc::now(),
            },
        );
        forecast
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
