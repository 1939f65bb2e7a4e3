//! One-shot HTTP fetch of the initial snapshot.

use std::time::Duration;

use occupancy_types::OccupancySnapshot;

use super::SyncError;

/// HTTP client for the backend's status endpoint.
pub struct SeedClient {
    http_client: reqwest::Client,
    seed_url: String,
}

impl SeedClient {
    /// Create a seed client whose request gives up after `timeout`.
    pub fn new(seed_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            seed_url: seed_url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.seed_url
    }

    /// GET the status endpoint and validate the body.
    pub async fn fetch(&self) -> Result<OccupancySnapshot, SyncError> {
        let body: serde_json::Value = self
            .http_client
            .get(&self.seed_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        adopt_seed(body)
    }
}

/// Accept a seed body only if it carries `last_updated` and has the
/// snapshot shape.
pub fn adopt_seed(body: serde_json::Value) -> Result<OccupancySnapshot, SyncError> {
    if body.get("last_updated").is_none() {
        return Err(SyncError::SeedRejected(
            "response has no last_updated field".to_string(),
        ));
    }

    OccupancySnapshot::from_value(body).map_err(|e| SyncError::SeedRejected(e.to_string()))
}
