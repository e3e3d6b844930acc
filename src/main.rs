use clap::Parser;

use maize_forecast::cli::Cli;
use maize_forecast::config::AppConfig;
use maize_forecast::logging::{init_logging, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env()?)?;

    let cli = Cli::parse();
    cli.run(AppConfig::from_env()).await
}
