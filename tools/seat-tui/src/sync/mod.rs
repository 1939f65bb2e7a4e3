//! Live synchronisation with the occupancy backend.
//!
//! A single background task owns the WebSocket connection, the reconnect
//! timer and the optional initial HTTP fetch. It reports everything through
//! [`SyncEvent`]s; the dashboard folds those into a [`LiveState`].

mod client;
mod policy;
mod seed;
mod state;

use std::time::{Duration, Instant};

use occupancy_types::OccupancySnapshot;
use thiserror::Error;

pub use client::LiveSyncClient;
pub use policy::{Backoff, RetryPolicy, DEFAULT_RETRY_INTERVAL};
pub use seed::{adopt_seed, SeedClient};
pub use state::{ConnectionStatus, LiveState, DEFAULT_STALE_AFTER};

/// Events emitted by the sync task, in the order they happened.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Initial snapshot fetched over HTTP.
    Seeded(OccupancySnapshot),
    /// Socket opened.
    Connected,
    /// Valid frame received.
    Snapshot {
        snapshot: OccupancySnapshot,
        received_at: Instant,
    },
    /// Frame dropped because it was not a valid snapshot.
    Rejected(String),
    /// Socket closed; one reconnect is scheduled after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Socket closed and the retry policy declined to reconnect.
    Disconnected,
    /// Connection-level failure (connect refused, read error).
    Error(String),
}

/// Failures inside the sync task.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("Timed out connecting to {url} after {timeout:?}")]
    ConnectTimeout { url: String, timeout: Duration },

    #[error("Initial snapshot request failed: {0}")]
    Seed(#[from] reqwest::Error),

    #[error("Initial snapshot rejected: {0}")]
    SeedRejected(String),
}
