//! Per-seat status and the display order of seat ids.

use std::cmp::Ordering;

/// The only status string that marks a seat as taken.
const OCCUPIED_STATUS: &str = "OCCUPIED";

/// Display state of a single seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeatState {
    Occupied,
    Empty,
}

impl SeatState {
    /// Map a raw status string. Anything other than `"OCCUPIED"` is free.
    pub fn from_status(status: &str) -> Self {
        if status == OCCUPIED_STATUS {
            SeatState::Occupied
        } else {
            SeatState::Empty
        }
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self, SeatState::Occupied)
    }
}

fn is_numeric(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Total order over seat ids.
///
/// Numeric ids come first, ascending by value (any length, no overflow),
/// with equal values such as `"01"` and `"1"` broken by the raw string.
/// Non-numeric ids follow, in plain lexicographic order.
pub fn compare_seat_ids(a: &str, b: &str) -> Ordering {
    match (is_numeric(a), is_numeric(b)) {
        (true, true) => {
            let a_digits = a.trim_start_matches('0');
            let b_digits = b.trim_start_matches('0');
            a_digits
                .len()
                .cmp(&b_digits.len())
                .then_with(|| a_digits.cmp(b_digits))
                .then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}
