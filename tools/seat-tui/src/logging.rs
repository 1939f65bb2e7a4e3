//! Tracing subscriber setup.
//!
//! The terminal UI owns stdout, so interactive runs log to a file. Headless
//! runs log to stderr and keep stdout for the rendered snapshots.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

/// Logging setup errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Build the filter: `RUST_LOG` wins, otherwise `level`.
pub fn env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| LoggingError::Filter(e.to_string()))
}

/// Install the global subscriber.
pub fn init_logging(level: &str, target: LogTarget) -> Result<(), LoggingError> {
    let filter = env_filter(level)?;

    match target {
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| LoggingError::File {
                    path: path.clone(),
                    source,
                })?;

            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_target(true)
                .with_ansi(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| LoggingError::Init(e.to_string()))?;
        }
        LogTarget::Stderr => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .map_err(|e| LoggingError::Init(e.to_string()))?;
        }
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Logging initialized");
    Ok(())
}
