//! Display model: a pure function of the snapshot and connection flags.

use occupancy_types::{OccupancySnapshot, SeatState};

use crate::sync::ConnectionStatus;

/// Shown in the seat grid before any layout arrives.
pub const WAITING_FOR_LAYOUT: &str = "Waiting for seat layout...";

/// Header status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPill {
    /// Connected and receiving.
    Live,
    /// Connected but silent past the staleness window.
    Paused,
    /// Anything other than connected.
    Offline,
}

impl StatusPill {
    pub fn from_flags(status: ConnectionStatus, is_stale: bool) -> Self {
        match (status, is_stale) {
            (ConnectionStatus::Connected, false) => StatusPill::Live,
            (ConnectionStatus::Connected, true) => StatusPill::Paused,
            _ => StatusPill::Offline,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusPill::Live => "● Live",
            StatusPill::Paused => "⚠ Live Feed Paused",
            StatusPill::Offline => "○ Offline",
        }
    }

    /// The pill reads "online" whenever the socket is open, stale or not.
    pub fn is_online(&self) -> bool {
        !matches!(self, StatusPill::Offline)
    }
}

/// Which count a summary card shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Total,
    Available,
    Occupied,
}

impl CardKind {
    pub fn title(&self) -> &'static str {
        match self {
            CardKind::Total => "Total Capacity",
            CardKind::Available => "Available Now",
            CardKind::Occupied => "Occupied",
        }
    }
}

/// One summary card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryCard {
    pub kind: CardKind,
    pub value: u64,
}

/// One tile in the seat grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatTile {
    pub id: String,
    pub state: SeatState,
}

/// Everything the screen shows, already ordered and labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub pill: StatusPill,
    /// Total, available, occupied; values exactly as the server sent them.
    pub cards: [SummaryCard; 3],
    pub seats: Vec<SeatTile>,
    pub last_sync: String,
    pub notices: Vec<String>,
}

impl DashboardView {
    pub fn build(
        snapshot: &OccupancySnapshot,
        status: ConnectionStatus,
        is_stale: bool,
        notices: &[String],
    ) -> Self {
        let seats = snapshot
            .ordered_seats()
            .into_iter()
            .map(|(id, state)| SeatTile {
                id: id.to_string(),
                state,
            })
            .collect();

        Self {
            pill: StatusPill::from_flags(status, is_stale),
            cards: [
                SummaryCard {
                    kind: CardKind::Total,
                    value: snapshot.total,
                },
                SummaryCard {
                    kind: CardKind::Available,
                    value: snapshot.empty,
                },
                SummaryCard {
                    kind: CardKind::Occupied,
                    value: snapshot.occupied,
                },
            ],
            seats,
            last_sync: snapshot.last_updated.clone(),
            notices: notices.to_vec(),
        }
    }

    pub fn card(&self, kind: CardKind) -> u64 {
        self.cards
            .iter()
            .find(|card| card.kind == kind)
            .map(|card| card.value)
            .unwrap_or_default()
    }

    pub fn footer_text(&self) -> String {
        format!("Last Sync: {}", self.last_sync)
    }

    /// Width of the widest seat label, at least one column.
    pub fn widest_seat_label(&self) -> usize {
        self.seats
            .iter()
            .map(|tile| tile.id.chars().count())
            .max()
            .unwrap_or(1)
            .max(1)
    }
}

/// Render the view as plain text for headless mode.
pub fn render_plain(view: &DashboardView) -> String {
    let mut out = String::new();

    out.push_str(&format!("[{}]", view.pill.label()));
    for card in &view.cards {
        out.push_str(&format!(" {}: {}", card.kind.title(), card.value));
    }
    out.push('\n');

    if view.seats.is_empty() {
        out.push_str(WAITING_FOR_LAYOUT);
    } else {
        let tiles: Vec<String> = view
            .seats
            .iter()
            .map(|tile| {
                let mark = if tile.state.is_occupied() { "occupied" } else { "empty" };
                format!("{}:{}", tile.id, mark)
            })
            .collect();
        out.push_str("Seats: ");
        out.push_str(&tiles.join(" "));
    }
    out.push('\n');

    out.push_str(&view.footer_text());
    for notice in &view.notices {
        out.push('\n');
        out.push_str(notice);
    }

    out
}
