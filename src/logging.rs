use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Where to ship logs besides stdout
#[derive(Debug, Clone)]
pub struct LokiTarget {
    pub url: Url,
    pub service_name: String,
    pub environment: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info,maize_forecast=debug`
    pub filter: String,
    pub loki: Option<LokiTarget>,
}

impl LoggingConfig {
    /// Reads `RUST_LOG`, `LOKI_ENABLED`, `LOKI_URL`, `SERVICE_NAME` and `ENVIRONMENT`.
    pub fn from_env() -> anyhow::Result<Self> {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
        let loki_enabled = std::env::var("LOKI_ENABLED")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let loki = if loki_enabled {
            let raw = std::env::var("LOKI_URL")
                .map_err(|_| anyhow::anyhow!("LOKI_ENABLED is true but LOKI_URL is not set"))?;
            Some(LokiTarget {
                url: Url::parse(&raw)?,
                service_name: std::env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "maize-forecast".to_string()),
                environment: std::env::var("ENVIRONMENT")
                    .unwrap_or_else(|_| "development".to_string()),
            })
        } else {
            None
        };

        Ok(Self { filter, loki })
    }
}

/// Installs the global subscriber. Must run inside a tokio runtime when a
/// Loki target is configured, since the shipping task is spawned here.
pub fn init_logging(config: LoggingConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.filter)?)
        .with(fmt::layer().with_target(false));

    #[cfg(feature = "loki")]
    {
        let loki_layer = match &config.loki {
            Some(target) => {
                let (layer, task) = tracing_loki::builder()
                    .label("service", target.service_name.as_str())?
                    .label("environment", target.environment.as_str())?
                    .build_url(target.url.clone())?;
                tokio::spawn(task);
                Some(layer)
            }
            None => None,
        };
        registry.with(loki_layer).try_init()?;
    }

    #[cfg(not(feature = "loki"))]
    registry.try_init()?;

    match &config.loki {
        Some(target) if cfg!(feature = "loki") => {
            tracing::info!("Logging to stdout and Loki at {} ({})", target.url, config.filter)
        }
        Some(target) => tracing::warn!(
            "Built without the loki feature; ignoring LOKI_URL {}",
            target.url
        ),
        None => tracing::info!("Logging to stdout ({})", config.filter),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = LoggingConfig {
            filter: "maize_forecast=verbose".to_string(),
            loki: None,
        };
        assert!(init_logging(config).is_err());
    }
}
