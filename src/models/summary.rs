use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Extreme point of the future forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub ds: NaiveDate,
    pub yhat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyForecasts {
    pub peak: Extremum,
    pub trough: Extremum,
}

/// In-sample accuracy over the observed dates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub mae: f64,
    pub mape_pct: f64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub observations: usize,
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
    pub source_path: String,
}
