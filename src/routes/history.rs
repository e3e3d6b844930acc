use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{DatasetSummary, Observation};
use crate::services::forecasting_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/history", get(get_history))
        .route("/summary", get(get_summary))
}

async fn get_history(State(state): State<AppState>) -> Json<Vec<Observation>> {
    info!("GET /api/history - {} observations", state.dataset.len());
    Json(state.dataset.observations.clone())
}

async fn get_summary(State(state): State<AppState>) -> Result<Json<DatasetSummary>, AppError> {
    info!("GET /api/summary");
    forecasting_service::dataset_summary(&state.dataset).map(Json)
}
