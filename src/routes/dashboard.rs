use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::services::dashboard_service::{self, DashboardParams, DashboardView};
use crate::services::{chart_service, forecasting_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Unchecked checkboxes are absent from a submitted form, so `submitted`
/// distinguishes "unchecked" from "first visit".
#[derive(Debug, Deserialize)]
struct DashboardQuery {
    horizon: Option<usize>,
    show_components: Option<bool>,
    show_metrics: Option<bool>,
    #[serde(default)]
    submitted: bool,
}

impl DashboardQuery {
    fn params(&self, default_horizon: usize) -> DashboardParams {
        let default_flag = !self.submitted;
        DashboardParams {
            horizon: self.horizon.unwrap_or(default_horizon),
            show_components: self.show_components.unwrap_or(default_flag),
            show_metrics: self.show_metrics.unwrap_or(default_flag),
        }
    }
}

async fn dashboard(
    Query(query): Query<DashboardQuery>,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let params = query.params(state.default_horizon);
    info!("GET / - dashboard {:?}", params);

    let forecast = state.forecast(params.horizon).await?;
    let summary = forecasting_service::dataset_summary(&state.dataset)?;
    let key = forecasting_service::key_forecasts(&forecast)?;
    let metrics = if params.show_metrics {
        Some(forecasting_service::accuracy_metrics(&state.dataset, &forecast)?)
    } else {
        None
    };

    let forecast_chart = chart_service::render_inline(
        &chart_service::forecast_chart(&state.dataset, &forecast),
        "forecast-chart",
    );
    let components_chart = params.show_components.then(|| {
        chart_service::render_inline(
            &chart_service::components_chart(&state.model, &forecast),
            "components-chart",
        )
    });

    let view = DashboardView {
        params,
        summary: &summary,
        forecast: &forecast,
        key: &key,
        metrics: metrics.as_ref(),
        forecast_chart,
        components_chart,
    };
    dashboard_service::render_dashboard(&view).map(Html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_visit_shows_everything() {
        let query = DashboardQuery {
            horizon: None,
            show_components: None,
            show_metrics: None,
            submitted: false,
        };
        let params = query.params(24);
        assert_eq!(params.horizon, 24);
        assert!(params.show_components);
        assert!(params.show_metrics);
    }

    #[test]
    fn test_submitted_form_treats_missing_checkbox_as_off() {
        let query = DashboardQuery {
            horizon: Some(12),
            show_components: None,
            show_metrics: Some(true),
            submitted: true,
        };
        let params = query.params(24);
        assert_eq!(params.horizon, 12);
        assert!(!params.show_components);
        assert!(params.show_metrics);
    }
}
