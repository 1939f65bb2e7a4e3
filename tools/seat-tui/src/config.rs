//! Dashboard configuration with validation.
//!
//! Values come from an optional JSON file, then CLI overrides. The endpoint
//! is always injected here; nothing downstream hardcodes a URL.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::sync::{Backoff, RetryPolicy, DEFAULT_STALE_AFTER};

/// Default live feed endpoint (local backend).
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {field} URL: {url}")]
    InvalidUrl { field: &'static str, url: String },

    #[error("Invalid retry interval: {0}")]
    InvalidInterval(String),

    #[error("stale_after cannot be 0")]
    InvalidStaleAfter,

    #[error("connect_timeout cannot be 0")]
    InvalidConnectTimeout,
}

/// Live sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// WebSocket endpoint (`ws://` or `wss://`).
    pub ws_url: String,
    /// Optional HTTP endpoint for the initial snapshot.
    pub seed_url: Option<String>,
    /// Reconnection policy.
    pub retry: RetryPolicy,
    /// Silence on a live connection before the feed shows as paused.
    #[serde(with = "humantime_serde")]
    pub stale_after: Duration,
    /// Limit for the socket handshake and the seed request.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            seed_url: None,
            retry: RetryPolicy::default(),
            stale_after: DEFAULT_STALE_AFTER,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl SyncConfig {
    /// Config pointing at `ws_url` with everything else defaulted.
    pub fn for_url(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("ws_url", &self.ws_url, &["ws", "wss"])?;
        if let Some(seed_url) = &self.seed_url {
            check_url("seed_url", seed_url, &["http", "https"])?;
        }

        if self.retry.interval.is_zero() {
            return Err(ConfigError::InvalidInterval(
                "interval cannot be 0".into(),
            ));
        }
        if let Backoff::Exponential { max } = self.retry.backoff {
            if max < self.retry.interval {
                return Err(ConfigError::InvalidInterval(format!(
                    "backoff max {max:?} is below interval {:?}",
                    self.retry.interval
                )));
            }
        }

        if self.stale_after.is_zero() {
            return Err(ConfigError::InvalidStaleAfter);
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidConnectTimeout);
        }

        Ok(())
    }
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Live sync settings.
    pub sync: SyncConfig,
    /// Static notices shown in the footer.
    pub notices: Vec<String>,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            notices: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sync.validate()
    }
}

/// Parse `url` and require one of `schemes` plus a host.
fn check_url(field: &'static str, url: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let valid = Url::parse(url)
        .map(|parsed| schemes.contains(&parsed.scheme()) && parsed.host_str().is_some())
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field,
            url: url.to_string(),
        })
    }
}
