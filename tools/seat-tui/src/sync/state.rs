//! Connection status and the latest snapshot as seen by the dashboard.

use std::time::{Duration, Instant};

use occupancy_types::OccupancySnapshot;

use super::SyncEvent;

/// Default silence on a live connection before the feed counts as paused.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_millis(5000);

/// Connection lifecycle of the live feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Not connected and not going to retry (or not yet connected).
    #[default]
    Disconnected,
    /// Socket open.
    Connected,
    /// Socket closed, a reconnect is scheduled.
    Reconnecting,
}

impl ConnectionStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Reconnecting => "Reconnecting...",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

/// Latest snapshot plus the flags the view derives from.
#[derive(Debug, Clone)]
pub struct LiveState {
    snapshot: OccupancySnapshot,
    status: ConnectionStatus,
    /// Arrival of the last accepted frame. Starts at creation time.
    last_packet: Instant,
    stale_after: Duration,
    /// Set once a frame has arrived over the socket; seeds never override it.
    live_received: bool,
}

impl LiveState {
    pub fn new(stale_after: Duration) -> Self {
        Self::starting_at(stale_after, Instant::now())
    }

    /// Create a state whose packet clock starts at `now`.
    pub fn starting_at(stale_after: Duration, now: Instant) -> Self {
        Self {
            snapshot: OccupancySnapshot::waiting(),
            status: ConnectionStatus::Disconnected,
            last_packet: now,
            stale_after,
            live_received: false,
        }
    }

    pub fn snapshot(&self) -> &OccupancySnapshot {
        &self.snapshot
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Connected but silent for longer than `stale_after`.
    pub fn is_stale(&self, now: Instant) -> bool {
        self.status.is_connected() && now.saturating_duration_since(self.last_packet) > self.stale_after
    }

    /// Apply one event from the sync client. Returns true if anything the
    /// view depends on changed.
    pub fn apply(&mut self, event: &SyncEvent) -> bool {
        match event {
            SyncEvent::Seeded(snapshot) => {
                if self.live_received {
                    return false;
                }
                self.snapshot = snapshot.clone();
                true
            }
            SyncEvent::Connected => self.set_status(ConnectionStatus::Connected),
            SyncEvent::Snapshot {
                snapshot,
                received_at,
            } => {
                self.snapshot = snapshot.clone();
                self.last_packet = *received_at;
                self.live_received = true;
                true
            }
            SyncEvent::Reconnecting { .. } => self.set_status(ConnectionStatus::Reconnecting),
            SyncEvent::Disconnected => self.set_status(ConnectionStatus::Disconnected),
            SyncEvent::Rejected(_) | SyncEvent::Error(_) => false,
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) -> bool {
        let changed = self.status != status;
        self.status = status;
        changed
    }
}
