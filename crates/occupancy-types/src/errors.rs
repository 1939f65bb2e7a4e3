//! # Error Types
//!
//! Decoding failures for inbound occupancy frames.

use thiserror::Error;

/// Why an inbound payload was not accepted as an [`crate::OccupancySnapshot`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The payload is not JSON at all.
    #[error("Malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The payload is JSON but does not have the snapshot shape.
    #[error("Schema violation: {0}")]
    Schema(#[source] serde_json::Error),
}

impl SnapshotError {
    /// Short label for logs and the event panel.
    pub fn kind(&self) -> &'static str {
        match self {
            SnapshotError::Malformed(_) => "malformed",
            SnapshotError::Schema(_) => "schema",
        }
    }
}
