use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::gateway::error::GatewayError;
use crate::models::LoggingConfig;

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "gateway.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the env filter; `RUST_LOG` wins over the configured level.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.level).unwrap_or_else(|e| {
            eprintln!("Invalid log level '{}': {}, using info", config.level, e);
            EnvFilter::new("info")
        })
    })
}

/// Install the global tracing subscriber.
///
/// Stdout always; a daily-rolling file under `<data_dir>/logs` when
/// `log_to_file` is set. Records from `log`-based crates are bridged in.
pub fn init_logger(config: &LoggingConfig, data_dir: Option<&Path>) -> Result<(), GatewayError> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.json {
        layers.push(fmt::layer().json().with_target(true).boxed());
    } else {
        layers.push(fmt::layer().with_target(true).boxed());
    }

    if config.log_to_file {
        if let Some(dir) = data_dir {
            let appender = tracing_appender::rolling::daily(dir.join(LOG_DIR), LOG_FILE_PREFIX);
            let file_layer = fmt::layer().with_writer(appender).with_ansi(false);
            if config.json {
                layers.push(file_layer.json().boxed());
            } else {
                layers.push(file_layer.boxed());
            }
        }
    }

    let subscriber = Registry::default().with(layers).with(build_filter(config));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| GatewayError::Config(format!("failed_to_install_logger: {}", e)))?;

    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!("log bridge already installed: {}", e);
    }

    tracing::info!(level = %config.level, file = config.log_to_file, "Logger initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_directives() {
        let config = LoggingConfig {
            level: "grounded_gateway_lib=debug,info".to_string(),
            ..LoggingConfig::default()
        };
        // Must not panic on compound directives
        let _ = build_filter(&config);
    }

    #[test]
    fn test_build_filter_falls_back_on_garbage() {
        let config = LoggingConfig {
            level: "[[[not a filter".to_string(),
            ..LoggingConfig::default()
        };
        let _ = build_filter(&config);
    }
}
