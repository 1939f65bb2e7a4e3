//! # Occupancy Types Crate
//!
//! The Occupancy Snapshot pushed by the seat-detection backend, plus the
//! validation and ordering rules every consumer of that snapshot shares.
//!
//! ## Design Principles
//!
//! - **Whole-snapshot replacement**: a snapshot is never merged; each valid
//!   frame supersedes the previous one entirely.
//! - **Server-trusted counts**: `total`, `occupied` and `empty` are carried
//!   verbatim. [`OccupancySnapshot::is_consistent`] reports disagreement but
//!   nothing reconciles it.
//! - **Recoverable decoding**: malformed or schema-violating frames surface
//!   as a [`SnapshotError`], never a panic.

pub mod errors;
pub mod seats;
pub mod snapshot;

pub use errors::SnapshotError;
pub use seats::{compare_seat_ids, SeatState};
pub use snapshot::{OccupancySnapshot, WAITING_LABEL};
