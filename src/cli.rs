use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use crate::app;
use crate::config::{AppConfig, DataPaths};
use crate::models::Dataset;
use crate::services::dashboard_service::format_thousands;
use crate::services::data_loader;
use crate::services::export_service::{self, EXPORT_FILE_NAME};
use crate::services::forecasting_service;
use crate::services::seasonal_model::SeasonalModel;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "maize-forecast")]
#[command(about = "Monthly maize price forecast for Benin: dashboard server and CLI tools")]
#[command(version)]
pub struct Cli {
    /// Base data directory containing processed/ and raw/ CSV files.
    /// Overrides DATA_DIR, PROCESSED_CSV and RAW_CSV.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the dashboard web server
    Serve {
        /// Bind address for the web server
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080)
        #[arg(short, long)]
        bind_address: Option<String>,
    },
    /// Write the full forecast table to a CSV file
    Forecast {
        /// Number of future months to project (6 to 36); defaults to DEFAULT_HORIZON
        #[arg(long)]
        horizon: Option<usize>,

        #[arg(short, long, default_value = EXPORT_FILE_NAME)]
        output: PathBuf,
    },
    /// Print dataset KPIs, expected peak/trough and in-sample accuracy
    Summary {
        /// Defaults to DEFAULT_HORIZON
        #[arg(long)]
        horizon: Option<usize>,
    },
}

impl Cli {
    pub async fn run(self, mut config: AppConfig) -> Result<()> {
        if let Some(dir) = self.data_dir {
            config.data = DataPaths::from_dir(dir);
        }
        config.validate().map_err(anyhow::Error::msg)?;

        match self.command.unwrap_or(Commands::Serve { bind_address: None }) {
            Commands::Serve { bind_address } => {
                let bind_address = bind_address.unwrap_or_else(|| config.bind_address.clone());
                serve(&config, &bind_address).await
            }
            Commands::Forecast { horizon, output } => {
                export_forecast(&config, horizon.unwrap_or(config.default_horizon), &output)
            }
            Commands::Summary { horizon } => {
                print_summary(&config, horizon.unwrap_or(config.default_horizon))
            }
        }
    }
}

fn load_and_fit(config: &AppConfig) -> Result<(Dataset, SeasonalModel)> {
    let dataset = data_loader::load_dataset(&config.data).context("Failed to load price history")?;
    let model = SeasonalModel::fit(&dataset, &config.model).context("Failed to fit forecast model")?;
    Ok((dataset, model))
}

async fn serve(config: &AppConfig, bind_address: &str) -> Result<()> {
    let (dataset, model) = load_and_fit(config)?;
    let state = AppState::new(dataset, model, config.default_horizon);

    // Warm the cache for the default view
    state.forecast(config.default_horizon).await?;

    let app = app::create_app(state);
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Maize forecast dashboard running at http://{}/", bind_address);
    axum::serve(listener, app).await?;
    Ok(())
}

fn export_forecast(config: &AppConfig, horizon: usize, output: &Path) -> Result<()> {
    let (dataset, model) = load_and_fit(config)?;
    let forecast = forecasting_service::build_forecast(&model, &dataset, horizon)?;
    let bytes = export_service::forecast_to_csv(&forecast)?;
    std::fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} forecast rows to {}", forecast.rows.len(), output.display());
    Ok(())
}

fn print_summary(config: &AppConfig, horizon: usize) -> Result<()> {
    let (dataset, model) = load_and_fit(config)?;
    let forecast = forecasting_service::build_forecast(&model, &dataset, horizon)?;
    let summary = forecasting_service::dataset_summary(&dataset)?;
    let key = forecasting_service::key_forecasts(&forecast)?;
    let metrics = forecasting_service::accuracy_metrics(&dataset, &forecast)?;

    println!("Source de donnees: {}", summary.source_path);
    println!("Observations historiques: {}", format_thousands(summary.observations as f64));
    println!("Date min: {}", summary.date_min.format("%Y-%m"));
    println!("Date max: {}", summary.date_max.format("%Y-%m"));
    println!(
        "Pic attendu: {} FCFA ({})",
        format_thousands(key.peak.yhat),
        key.peak.ds.format("%b %Y")
    );
    println!(
        "Creux attendu: {} FCFA ({})",
        format_thousands(key.trough.yhat),
        key.trough.ds.format("%b %Y")
    );
    println!(
        "Changepoints: {} (dernier: {})",
        model.changepoints().len(),
        model
            .changepoints()
            .last()
            .map(|d| d.format("%Y-%m").to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Bruit residuel: {} FCFA/tonne", format_thousands(model.sigma()));
    println!("MAE: {} FCFA/tonne", format_thousands(metrics.mae));
    println!("MAPE: {:.1} %", metrics.mape_pct);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_is_optional_on_subcommands() {
        let cli = Cli::parse_from(["maize-forecast", "summary"]);
        assert!(matches!(cli.command, Some(Commands::Summary { horizon: None })));

        let cli = Cli::parse_from(["maize-forecast", "forecast", "--horizon", "12"]);
        match cli.command {
            Some(Commands::Forecast { horizon, output }) => {
                assert_eq!(horizon, Some(12));
                assert_eq!(output, PathBuf::from(EXPORT_FILE_NAME));
            }
            _ => panic!("expected forecast subcommand"),
        }
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::parse_from(["maize-forecast", "--data-dir", "/srv/maize"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/maize")));
    }
}
