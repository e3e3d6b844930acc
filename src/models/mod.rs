mod forecast;
mod observation;
mod summary;

pub use forecast::{Forecast, ForecastRow, ModelConfig, SeasonalityConfig, SeasonalityMode};
pub use observation::{DataSource, Dataset, Observation};
pub use summary::{AccuracyMetrics, DatasetSummary, Extremum, KeyForecasts};
