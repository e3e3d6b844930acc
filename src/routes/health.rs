use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

async fn health(State(state): State<AppState>) -> &'static str {
    info!(
        "GET /health - {} observations, {} cached forecasts",
        state.dataset.len(),
        state.forecast_cache.len()
    );
    "OK"
}
