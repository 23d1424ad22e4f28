//! Structured logging setup.
//!
//! Installs a global `tracing` subscriber from a [`LoggingConfig`]. `RUST_LOG`
//! takes precedence over the configured level when it is set.

use crate::config::LoggingConfig;
use crate::error::{PacketError, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global subscriber.
///
/// # Errors
/// `PacketError::ConfigError` if the configuration is invalid, the log file
/// cannot be opened, or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(PacketError::ConfigError(errors.join("; ")));
    }

    let level = config.log_level.as_str().to_ascii_lowercase();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| PacketError::ConfigError(format!("Failed to create log filter: {e}")))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.log_to_console {
        let layer = fmt::layer().with_target(true);
        layers.push(if config.json_format {
            layer.json().boxed()
        } else {
            layer.compact().boxed()
        });
    }

    if let (true, Some(path)) = (config.log_to_file, config.log_file_path.as_deref()) {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| PacketError::ConfigError(format!("Failed to open log file: {e}")))?;

        let layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_thread_ids(true);
        layers.push(if config.json_format {
            layer.json().boxed()
        } else {
            layer.boxed()
        });
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| PacketError::ConfigError(format!("Failed to install subscriber: {e}")))?;

    tracing::info!(app = %config.app_name, "Logging initialized");
    Ok(())
}
