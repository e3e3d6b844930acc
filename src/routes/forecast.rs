use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{AccuracyMetrics, Forecast, KeyForecasts};
use crate::services::{export_service, forecasting_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forecast", get(get_forecast))
        .route("/forecast/key", get(get_key_forecasts))
        .route("/forecast/csv", get(download_forecast_csv))
        .route("/metrics", get(get_metrics))
}

#[derive(Debug, Deserialize)]
pub struct HorizonQuery {
    pub horizon: Option<usize>,
}

async fn get_forecast(
    Query(params): Query<HorizonQuery>,
    State(state): State<AppState>,
) -> Result<Json<Forecast>, AppError> {
    let horizon = params.horizon.unwrap_or(state.default_horizon);
    info!("GET /api/forecast - horizon {}", horizon);
    let forecast = state.forecast(horizon).await?;
    Ok(Json(Forecast::clone(&forecast)))
}

async fn get_key_forecasts(
    Query(params): Query<HorizonQuery>,
    State(state): State<AppState>,
) -> Result<Json<KeyForecasts>, AppError> {
    let horizon = params.horizon.unwrap_or(state.default_horizon);
    info!("GET /api/forecast/key - horizon {}", horizon);
    let forecast = state.forecast(horizon).await?;
    forecasting_service::key_forecasts(&forecast).map(Json)
}

async fn download_forecast_csv(
    Query(params): Query<HorizonQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let horizon = params.horizon.unwrap_or(state.default_horizon);
    info!("GET /api/forecast/csv - horizon {}", horizon);
    let forecast = state.forecast(horizon).await?;
    let body = export_service::forecast_to_csv(&forecast).map_err(|e| {
        error!("Failed to export forecast CSV: {}", e);
        e
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export_service::EXPORT_FILE_NAME),
            ),
        ],
        body,
    ))
}

async fn get_metrics(State(state): State<AppState>) -> Result<Json<AccuracyMetrics>, AppError> {
    info!("GET /api/metrics - in-sample accuracy");
    // In-sample rows do not depend on the horizon
    let forecast = state.forecast(state.default_horizon).await?;
    forecasting_service::accuracy_metrics(&state.dataset, &forecast).map(Json)
}
