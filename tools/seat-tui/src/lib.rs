//! Seat-TUI: live library seat occupancy in the terminal.
//!
//! A background [`sync::LiveSyncClient`] keeps one WebSocket open to the
//! occupancy backend and reconnects according to a [`sync::RetryPolicy`].
//! The terminal loop folds its events into [`app::App`] and redraws a
//! [`view::DashboardView`], which is a pure function of the latest snapshot
//! and the connection flags.
//!
//! ```text
//! ┌ LIBRARY LIVE SEAT OCCUPANCY ─────────────────────────────────────┐
//! │ ● Live    Feed: ws://localhost:8000/ws    Uptime: 3m              │
//! ├─ Total Capacity ──┬─ Available Now ──┬─ Occupied ────────────────┤
//! │       100         │        60        │        40                 │
//! ├─ LIVE FLOOR MAP ──┴──────────────────┴───────────────────────────┤
//! │  1   2   3   4   5   6 ...                                        │
//! ├─ LIVE EVENTS ────────────────────────────────────────────────────┤
//! │ Last Sync: 12:00:01                                               │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod config;
pub mod logging;
pub mod sync;
pub mod ui;
pub mod view;

pub use app::App;
pub use config::{ConfigError, DashboardConfig, SyncConfig};
pub use sync::{ConnectionStatus, LiveState, LiveSyncClient, RetryPolicy, SyncEvent};
pub use view::{render_plain, DashboardView, StatusPill};
