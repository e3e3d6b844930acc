use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use tracing::{info, warn};

use crate::config::{MAX_HORIZON, MIN_HORIZON};
use crate::errors::AppError;
use crate::models::{AccuracyMetrics, Dataset, DatasetSummary, Extremum, Forecast, KeyForecasts};
use crate::services::seasonal_model::SeasonalModel;

pub fn validate_horizon(horizon: usize) -> Result<usize, AppError> {
    if !(MIN_HORIZON..=MAX_HORIZON).contains(&horizon) {
        return Err(AppError::Validation(format!(
            "Horizon must be between {} and {} months, got {}",
            MIN_HORIZON, MAX_HORIZON, horizon
        )));
    }
    Ok(horizon)
}

/// `periods` month-start dates strictly after `last`.
pub fn make_future_dates(last: NaiveDate, periods: usize) -> Vec<NaiveDate> {
    let first_of_month = last.with_day(1).unwrap_or(last);
    (1..=periods as u32)
        .filter_map(|i| first_of_month.checked_add_months(Months::new(i)))
        .collect()
}

/// Forecast over the full history followed by `horizon` future months
pub fn build_forecast(model: &SeasonalModel, dataset: &Dataset, horizon: usize) -> Result<Forecast, AppError> {
    let horizon = validate_horizon(horizon)?;
    let history_end = dataset
        .last_date()
        .ok_or(AppError::InsufficientData { needed: 2, got: 0 })?;

    // one frame row per distinct observed date
    let mut dates = dataset.dates();
    dates.dedup();
    dates.extend(make_future_dates(history_end, horizon));

    info!(
        "Forecasting {} months ahead of {} ({} rows)",
        horizon,
        history_end,
        dates.len()
    );

    Ok(Forecast {
        rows: model.predict(&dates),
        seasonality_names: model.seasonality_names(),
        history_end,
        horizon,
    })
}

/// Highest and lowest point forecasts after the last observation.
pub fn key_forecasts(forecast: &Forecast) -> Result<KeyForecasts, AppError> {
    let mut future = forecast.future();
    let first = future
        .next()
        .ok_or_else(|| AppError::Validation("Forecast has no future rows".to_string()))?;

    let mut peak = Extremum { ds: first.ds, yhat: first.yhat };
    let mut trough = peak;
    for row in future {
        // strict comparisons keep the first occurrence on ties
        if row.yhat > peak.yhat {
            peak = Extremum { ds: row.ds, yhat: row.yhat };
        }
        if row.yhat < trough.yhat {
            trough = Extremum { ds: row.ds, yhat: row.yhat };
        }
    }
    Ok(KeyForecasts { peak, trough })
}

/// In-sample MAE and MAPE (percent) over observed dates.
pub fn accuracy_metrics(dataset: &Dataset, forecast: &Forecast) -> Result<AccuracyMetrics, AppError> {
    let fitted: HashMap<NaiveDate, f64> = forecast.history().map(|r| (r.ds, r.yhat)).collect();
    let mut abs_sum = 0.0;
    let mut pct_sum = 0.0;
    let mut n = 0usize;

    for obs in &dataset.observations {
        let Some(&yhat) = fitted.get(&obs.ds) else {
            warn!("No forecast row for observed date {}", obs.ds);
            continue;
        };
        let err = (obs.y - yhat).abs();
        abs_sum += err;
        pct_sum += err / obs.y.abs().max(f64::EPSILON);
        n += 1;
    }

    if n == 0 {
        return Err(AppError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(AccuracyMetrics {
        mae: abs_sum / n as f64,
        mape_pct: pct_sum / n as f64 * 100.0,
        n,
    })
}

pub fn dataset_summary(dataset: &Dataset) -> Result<DatasetSummary, AppError> {
    match (dataset.first_date(), dataset.last_date()) {
        (Some(date_min), Some(date_max)) => Ok(DatasetSummary {
            observations: dataset.len(),
            date_min,
            date_max,
            source_path: dataset.source.path().display().to_string(),
        }),
        _ => Err(AppError::InsufficientData { needed: 1, got: 0 }),
    }
}
