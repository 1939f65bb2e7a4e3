//! The Occupancy Snapshot entity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::SnapshotError;
use crate::seats::{compare_seat_ids, SeatState};

/// Freshness label shown before any data has arrived.
pub const WAITING_LABEL: &str = "Waiting...";

/// A full picture of library occupancy at one moment.
///
/// Unknown fields are ignored so the backend can grow the payload without
/// breaking older dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    /// Total seat capacity.
    pub total: u64,
    /// Seats currently occupied.
    pub occupied: u64,
    /// Seats currently free, as reported by the server.
    pub empty: u64,
    /// Seat id to raw status string.
    #[serde(default)]
    pub seats: BTreeMap<String, String>,
    /// Display-only timestamp, never parsed.
    pub last_updated: String,
}

impl Default for OccupancySnapshot {
    fn default() -> Self {
        Self::waiting()
    }
}

impl OccupancySnapshot {
    /// The placeholder shown until the first snapshot is adopted.
    pub fn waiting() -> Self {
        Self {
            total: 0,
            occupied: 0,
            empty: 0,
            seats: BTreeMap::new(),
            last_updated: WAITING_LABEL.to_string(),
        }
    }

    /// Decode and validate a text frame.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(SnapshotError::Malformed)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SnapshotError> {
        serde_json::from_value(value).map_err(SnapshotError::Schema)
    }

    /// `total - occupied`, saturating at zero.
    pub fn derived_empty(&self) -> u64 {
        self.total.saturating_sub(self.occupied)
    }

    /// Whether the server's `empty` agrees with `total - occupied`.
    ///
    /// Informational only: the dashboard always shows the server's numbers.
    pub fn is_consistent(&self) -> bool {
        self.occupied <= self.total && self.empty == self.derived_empty()
    }

    /// Seats in display order (see [`compare_seat_ids`]).
    pub fn ordered_seats(&self) -> Vec<(&str, SeatState)> {
        let mut seats: Vec<(&str, SeatState)> = self
            .seats
            .iter()
            .map(|(id, status)| (id.as_str(), SeatState::from_status(status)))
            .collect();
        seats.sort_by(|(a, _), (b, _)| compare_seat_ids(a, b));
        seats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "total": 100,
        "occupied": 40,
        "empty": 60,
        "seats": {"1": "OCCUPIED", "2": "FREE"},
        "last_updated": "12:00:01"
    }"#;

    #[test]
    fn test_snapshot_parsing() {
        let snapshot = OccupancySnapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.total, 100);
        assert_eq!(snapshot.occupied, 40);
        assert_eq!(snapshot.empty, 60);
        assert_eq!(snapshot.last_updated, "12:00:01");
        assert!(snapshot.is_consistent());
        assert_eq!(
            snapshot.ordered_seats(),
            vec![("1", SeatState::Occupied), ("2", SeatState::Empty)]
        );
    }

    #[test]
    fn test_missing_seats_defaults_to_empty() {
        let snapshot = OccupancySnapshot::from_json(
            r#"{"total": 3, "occupied": 0, "empty": 3, "last_updated": "09:15:00"}"#,
        )
        .unwrap();
        assert!(snapshot.seats.is_empty());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let snapshot = OccupancySnapshot::from_json(
            r#"{"total": 1, "occupied": 1, "empty": 0, "seats": {}, "last_updated": "x", "camera": "cam-2"}"#,
        )
        .unwrap();
        assert_eq!(snapshot.total, 1);
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = OccupancySnapshot::from_json("{total: 1").unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed(_)));
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn test_wrong_shape_is_schema_error() {
        let cases = [
            r#"[1, 2, 3]"#,
            r#"{"occupied": 1, "empty": 0, "last_updated": "x"}"#,
            r#"{"total": -1, "occupied": 0, "empty": 0, "last_updated": "x"}"#,
            r#"{"total": 1.5, "occupied": 0, "empty": 0, "last_updated": "x"}"#,
            r#"{"total": 1, "occupied": 0, "empty": 1, "seats": {"1": 1}, "last_updated": "x"}"#,
            r#"{"total": 1, "occupied": 0, "empty": 1, "seats": {}}"#,
        ];
        for case in cases {
            let err = OccupancySnapshot::from_json(case).unwrap_err();
            assert!(matches!(err, SnapshotError::Schema(_)), "case: {case}");
        }
    }

    #[test]
    fn test_inconsistent_counts_are_kept_verbatim() {
        let snapshot = OccupancySnapshot::from_json(
            r#"{"total": 10, "occupied": 4, "empty": 9, "last_updated": "x"}"#,
        )
        .unwrap();
        assert_eq!(snapshot.empty, 9);
        assert_eq!(snapshot.derived_empty(), 6);
        assert!(!snapshot.is_consistent());
    }

    #[test]
    fn test_ordered_seats_numeric() {
        let snapshot = OccupancySnapshot::from_json(
            r#"{"total": 3, "occupied": 1, "empty": 2,
                "seats": {"10": "FREE", "2": "OCCUPIED", "1": "FREE"},
                "last_updated": "x"}"#,
        )
        .unwrap();
        let ids: Vec<&str> = snapshot.ordered_seats().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_waiting_placeholder() {
        let waiting = OccupancySnapshot::default();
        assert_eq!(waiting.last_updated, WAITING_LABEL);
        assert_eq!(waiting.total, 0);
        assert!(waiting.seats.is_empty());
    }
}
