//! Application state management.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::DashboardConfig;
use crate::sync::{ConnectionStatus, LiveState, SyncEvent};
use crate::view::DashboardView;

/// Maximum number of events to keep in history.
pub const MAX_EVENTS: usize = 100;

/// An entry in the event log panel.
#[derive(Debug, Clone)]
pub struct LiveEvent {
    /// Timestamp when event was received.
    pub timestamp: Instant,
    /// Event type string.
    pub event_type: &'static str,
    /// Event description.
    pub description: String,
}

/// Application state holding all dashboard data.
pub struct App {
    /// Snapshot, connection status and packet clock.
    pub live: LiveState,

    /// Endpoint shown in the header.
    pub ws_url: String,

    /// Static footer notices.
    pub notices: Vec<String>,

    /// Event log, newest first.
    pub live_events: VecDeque<LiveEvent>,

    /// Snapshots accepted since start.
    pub snapshots_received: u64,

    /// Frames dropped as invalid since start.
    pub frames_rejected: u64,

    /// Whether the app should quit.
    pub should_quit: bool,

    /// Application start time.
    pub start_time: Instant,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            live: LiveState::new(config.sync.stale_after),
            ws_url: config.sync.ws_url.clone(),
            notices: config.notices.clone(),
            live_events: VecDeque::with_capacity(MAX_EVENTS),
            snapshots_received: 0,
            frames_rejected: 0,
            should_quit: false,
            start_time: Instant::now(),
        }
    }

    /// Handle a sync event. Returns true if the view may have changed.
    pub fn handle_sync_event(&mut self, event: SyncEvent) -> bool {
        let changed = self.live.apply(&event);

        match &event {
            SyncEvent::Seeded(snapshot) => {
                if changed {
                    self.add_event(
                        "seed",
                        format!("Initial snapshot loaded ({})", snapshot.last_updated),
                    );
                } else {
                    self.add_event("seed", "Initial snapshot ignored, live data already shown");
                }
            }
            SyncEvent::Connected => {
                self.add_event("ws", format!("Connected to {}", self.ws_url));
            }
            SyncEvent::Snapshot { snapshot, .. } => {
                self.snapshots_received += 1;
                self.add_event(
                    "snapshot",
                    format!(
                        "{}/{} occupied at {}",
                        snapshot.occupied, snapshot.total, snapshot.last_updated
                    ),
                );
            }
            SyncEvent::Rejected(reason) => {
                self.frames_rejected += 1;
                self.add_event("rejected", reason.clone());
            }
            SyncEvent::Reconnecting { attempt, delay } => {
                self.add_event(
                    "ws",
                    format!("Reconnecting in {} (attempt {})", format_delay(*delay), attempt),
                );
            }
            SyncEvent::Disconnected => {
                self.add_event("ws", "Disconnected, not retrying");
            }
            SyncEvent::Error(msg) => {
                self.add_event("error", msg.clone());
            }
        }

        changed
    }

    /// Add an event to the live events log.
    fn add_event(&mut self, event_type: &'static str, description: impl Into<String>) {
        self.live_events.push_front(LiveEvent {
            timestamp: Instant::now(),
            event_type,
            description: description.into(),
        });

        if self.live_events.len() > MAX_EVENTS {
            self.live_events.pop_back();
        }
    }

    /// Build the display model as of `now`.
    pub fn view(&self, now: Instant) -> DashboardView {
        DashboardView::build(
            self.live.snapshot(),
            self.live.status(),
            self.live.is_stale(now),
            &self.notices,
        )
    }

    pub fn status(&self) -> ConnectionStatus {
        self.live.status()
    }

    /// Get uptime duration.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Format uptime as human-readable string.
    pub fn uptime_str(&self) -> String {
        let secs = self.uptime().as_secs();

        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;

        if hours > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}m", mins)
        }
    }

    /// Handle key press events.
    pub fn on_key(&mut self, key: crossterm::event::KeyCode) {
        use crossterm::event::KeyCode;

        if let KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc = key {
            self.should_quit = true;
        }
    }
}

fn format_delay(delay: Duration) -> String {
    if delay.as_millis() % 1000 == 0 {
        format!("{}s", delay.as_secs())
    } else {
        format!("{}ms", delay.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;
    use occupancy_types::OccupancySnapshot;

    fn app() -> App {
        App::new(&DashboardConfig::default())
    }

    fn snapshot_event(label: &str) -> SyncEvent {
        SyncEvent::Snapshot {
            snapshot: OccupancySnapshot {
                last_updated: label.to_string(),
                ..OccupancySnapshot::waiting()
            },
            received_at: Instant::now(),
        }
    }

    #[test]
    fn test_events_logged_newest_first() {
        let mut app = app();
        app.handle_sync_event(SyncEvent::Connected);
        app.handle_sync_event(snapshot_event("10:00:00"));

        assert_eq!(app.live_events.len(), 2);
        assert_eq!(app.live_events[0].event_type, "snapshot");
        assert_eq!(app.live_events[1].event_type, "ws");
        assert_eq!(app.snapshots_received, 1);
    }

    #[test]
    fn test_event_log_bounded() {
        let mut app = app();
        for i in 0..(MAX_EVENTS + 25) {
            app.handle_sync_event(snapshot_event(&i.to_string()));
        }
        assert_eq!(app.live_events.len(), MAX_EVENTS);
        assert!(app.live_events[0].description.ends_with(&(MAX_EVENTS + 24).to_string()));
    }

    #[test]
    fn test_rejected_counted() {
        let mut app = app();
        assert!(!app.handle_sync_event(SyncEvent::Rejected("Malformed frame".into())));
        assert_eq!(app.frames_rejected, 1);
        assert_eq!(app.live_events[0].event_type, "rejected");
    }

    #[test]
    fn test_reconnect_description() {
        let mut app = app();
        app.handle_sync_event(SyncEvent::Reconnecting {
            attempt: 2,
            delay: Duration::from_secs(3),
        });
        assert_eq!(app.status(), ConnectionStatus::Reconnecting);
        assert_eq!(
            app.live_events[0].description,
            "Reconnecting in 3s (attempt 2)"
        );
        assert_eq!(format_delay(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn test_quit_keys() {
        for key in [KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc] {
            let mut app = app();
            app.on_key(key);
            assert!(app.should_quit);
        }
        let mut app = app();
        app.on_key(KeyCode::Char('x'));
        assert!(!app.should_quit);
    }
}
