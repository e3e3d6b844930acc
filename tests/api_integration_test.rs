/// HTTP API integration tests
///
/// Builds the router over a synthetic monthly series and drives it with
/// `tower::ServiceExt::oneshot`, without binding a socket.
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Datelike, NaiveDate};
use maize_forecast::app::create_app;
use maize_forecast::models::{
    AccuracyMetrics, DataSource, Dataset, Forecast, KeyForecasts, ModelConfig, Observation,
};
use maize_forecast::services::seasonal_model::SeasonalModel;
use maize_forecast::state::AppState;
use tower::ServiceExt;

const HISTORY_MONTHS: u32 = 96;

fn month_start(i: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2015 + (i / 12) as i32, i % 12 + 1, 1).unwrap()
}

fn synthetic_state() -> AppState {
    let observations = (0..HISTORY_MONTHS)
        .map(|i| {
            let ds = month_start(i);
            let lean_season = 0.15 * (2.0 * std::f64::consts::PI * (ds.month0() as f64 - 3.0) / 12.0).sin();
            Observation {
                ds,
                y: (110_000.0 + 350.0 * i as f64) * (1.0 + lean_season),
            }
        })
        .collect();
    let dataset = Dataset {
        observations,
        source: DataSource::Processed(PathBuf::from("data/processed/maize_prices_monthly.csv")),
    };
    let config = ModelConfig {
        uncertainty_samples: 200,
        ..ModelConfig::default()
    };
    let model = SeasonalModel::fit(&dataset, &config).unwrap();
    AppState::new(dataset, model, 24)
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, headers, body)
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(create_app(synthetic_state()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_forecast_covers_history_and_horizon() {
    let (status, _, body) = get(create_app(synthetic_state()), "/api/forecast?horizon=12").await;
    assert_eq!(status, StatusCode::OK);

    let forecast: Forecast = serde_json::from_slice(&body).unwrap();
    assert_eq!(forecast.horizon, 12);
    assert_eq!(forecast.rows.len(), HISTORY_MONTHS as usize + 12);

    assert_eq!(forecast.history().count(), HISTORY_MONTHS as usize);
    assert!(forecast.rows.iter().all(|r| r.seasonal.len() == forecast.seasonality_names.len()));

    let future: Vec<NaiveDate> = forecast.future().map(|r| r.ds).collect();
    let expected: Vec<NaiveDate> = (HISTORY_MONTHS..HISTORY_MONTHS + 12).map(month_start).collect();
    assert_eq!(future, expected);
}

#[tokio::test]
async fn test_horizon_outside_slider_bounds_is_rejected() {
    let state = synthetic_state();
    for uri in ["/api/forecast?horizon=5", "/api/forecast?horizon=37", "/?horizon=40"] {
        let (status, _, _) = get(create_app(state.clone()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }
    let (status, _, _) = get(create_app(state), "/api/forecast?horizon=36").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_key_forecasts_come_from_future_slice() {
    let state = synthetic_state();
    let (status, _, body) = get(create_app(state.clone()), "/api/forecast/key?horizon=18").await;
    assert_eq!(status, StatusCode::OK);
    let key: KeyForecasts = serde_json::from_slice(&body).unwrap();

    let forecast = state.forecast(18).await.unwrap();
    let future: Vec<f64> = forecast.future().map(|r| r.yhat).collect();
    let max = future.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = future.iter().cloned().fold(f64::INFINITY, f64::min);

    assert_eq!(key.peak.yhat, max);
    assert_eq!(key.trough.yhat, min);
    assert!(key.peak.ds > forecast.history_end);
    assert!(key.trough.ds > forecast.history_end);
}

#[tokio::test]
async fn test_csv_download() {
    let (status, headers, body) = get(create_app(synthetic_state()), "/api/forecast/csv?horizon=6").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("previsions_mais_benin.csv"));

    let text = String::from_utf8(body).unwrap();
    let mut lines = text.lines();
    let header_line = lines.next().unwrap();
    assert!(header_line.starts_with("ds,trend,yhat_lower,yhat_upper"));
    assert!(header_line.ends_with(",yhat"));
    assert_eq!(lines.count(), HISTORY_MONTHS as usize + 6);
}

#[tokio::test]
async fn test_metrics_on_clean_seasonal_series() {
    let (status, _, body) = get(create_app(synthetic_state()), "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let metrics: AccuracyMetrics = serde_json::from_slice(&body).unwrap();
    assert_eq!(metrics.n, HISTORY_MONTHS as usize);
    assert!(metrics.mape_pct < 5.0, "MAPE {}", metrics.mape_pct);
    assert!(metrics.mae >= 0.0);
}

#[tokio::test]
async fn test_history_and_summary() {
    let state = synthetic_state();
    let (status, _, body) = get(create_app(state.clone()), "/api/history").await;
    assert_eq!(status, StatusCode::OK);
    let history: Vec<Observation> = serde_json::from_slice(&body).unwrap();
    assert_eq!(history.len(), HISTORY_MONTHS as usize);

    let (status, _, body) = get(create_app(state), "/api/summary").await;
    assert_eq!(status, StatusCode::OK);
    let summary: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(summary["observations"], 96);
    assert_eq!(summary["date_min"], "2015-01-01");
    assert_eq!(summary["date_max"], "2022-12-01");
}

#[tokio::test]
async fn test_dashboard_page() {
    let state = synthetic_state();
    let (status, _, body) = get(create_app(state.clone()), "/").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Prevision des prix du mais au Benin"));
    assert!(html.contains("Pic attendu"));
    assert!(html.contains("Creux attendu"));
    assert!(html.contains("forecast-chart"));
    assert!(html.contains("components-chart"));
    assert!(html.contains("Performance du modele sur historique"));
    assert!(html.contains("2015-01"));

    let (status, _, body) = get(create_app(state.clone()), "/?horizon=12&submitted=true").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(!html.contains("components-chart"));
    assert!(!html.contains("Performance du modele sur historique"));
    assert!(html.contains("/api/forecast/csv?horizon=12"));

    // the two horizons are cached independently
    assert_eq!(state.forecast_cache.len(), 2);
}
