pub mod chart_service;
pub mod dashboard_service;
pub mod data_loader;
pub mod export_service;
pub mod forecast_cache;
pub mod forecasting_service;
pub mod linalg;
pub mod seasonal_model;
