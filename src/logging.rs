use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub type LoggingError = Box<dyn std::error::Error + Send + Sync>;

/// Install the global subscriber: env filter + console output, plus a Loki
/// layer when a push URL is configured and the `loki` feature is on.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.filter)?)
        .with(fmt::layer());

    match config.loki_url.as_deref() {
        #[cfg(feature = "loki")]
        Some(loki_url) => {
            let (loki_layer, task) = tracing_loki::builder()
                .label("service", config.service_name.as_str())?
                .label("environment", config.environment.as_str())?
                .build_url(url::Url::parse(loki_url)?)?;
            registry.with(loki_layer).try_init()?;
            tokio::spawn(task);
            tracing::info!("📊 Logging to console and Loki at {}", loki_url);
        }
        #[cfg(not(feature = "loki"))]
        Some(_) => {
            registry.try_init()?;
            tracing::warn!("LOKI_URL is set but the `loki` feature is disabled; console only");
        }
        None => {
            registry.try_init()?;
            tracing::info!("📊 Logging to console (filter: {})", config.filter);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_is_reported() {
        let config = LoggingConfig {
            filter: "market_intel=loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(init_logging(&config).is_err());
    }
}
