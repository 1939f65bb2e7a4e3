//! Dashboard UI rendering.

use crate::app::App;
use crate::view::{CardKind, DashboardView, StatusPill, WAITING_FOR_LAYOUT};
use occupancy_types::SeatState;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Render the main dashboard.
pub fn render(frame: &mut Frame, app: &App, view: &DashboardView) {
    let footer_height = 4 + view.notices.len() as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Length(5),             // Summary cards
            Constraint::Min(6),                // Seat map
            Constraint::Length(8),             // Live events
            Constraint::Length(footer_height), // Footer
        ])
        .split(frame.area());

    render_header(frame, app, view, chunks[0]);
    render_cards(frame, view, chunks[1]);
    render_seat_map(frame, view, chunks[2]);
    render_live_events(frame, app, chunks[3]);
    render_footer(frame, view, chunks[4]);
}

/// Colour of the status pill.
pub fn pill_color(pill: StatusPill) -> Color {
    match pill {
        StatusPill::Live => Color::Green,
        StatusPill::Paused => Color::Yellow,
        StatusPill::Offline => Color::Red,
    }
}

/// Header border: tinted by the pill while the socket is open.
pub fn header_border_style(pill: StatusPill) -> Style {
    if pill.is_online() {
        Style::default().fg(pill_color(pill))
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Style of a seat tile.
pub fn seat_style(state: SeatState) -> Style {
    match state {
        SeatState::Occupied => Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
        SeatState::Empty => Style::default().fg(Color::Black).bg(Color::Green),
    }
}

/// Render the header bar.
fn render_header(frame: &mut Frame, app: &App, view: &DashboardView, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(
            view.pill.label(),
            Style::default()
                .fg(pill_color(view.pill))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("    Feed: "),
        Span::styled(app.ws_url.clone(), Style::default().fg(Color::Cyan)),
        Span::raw("    Uptime: "),
        Span::styled(app.uptime_str(), Style::default().fg(Color::Cyan)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(header_border_style(view.pill))
            .title(" LIBRARY LIVE SEAT OCCUPANCY ")
            .title_alignment(Alignment::Left),
    );

    frame.render_widget(header, area);
}

/// Render the three summary cards.
fn render_cards(frame: &mut Frame, view: &DashboardView, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(34),
            Constraint::Percentage(33),
        ])
        .split(area);

    for (card, chunk) in view.cards.iter().zip(chunks.iter()) {
        let color = match card.kind {
            CardKind::Total => Color::Blue,
            CardKind::Available => Color::Green,
            CardKind::Occupied => Color::Red,
        };

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                card.value.to_string(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", card.kind.title()))
            .border_style(Style::default().fg(color));

        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, *chunk);
    }
}

/// Lay seat tiles out in rows that fit `inner_width` columns.
pub fn seat_lines(view: &DashboardView, inner_width: u16) -> Vec<Line<'static>> {
    let label_width = view.widest_seat_label();
    let tile_width = label_width + 2;
    let per_row = ((inner_width as usize + 1) / (tile_width + 1)).max(1);

    view.seats
        .chunks(per_row)
        .map(|row| {
            let mut spans = Vec::with_capacity(row.len() * 2);
            for (i, tile) in row.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::raw(" "));
                }
                spans.push(Span::styled(
                    format!(" {:^width$} ", tile.id, width = label_width),
                    seat_style(tile.state),
                ));
            }
            Line::from(spans)
        })
        .collect()
}

/// Render the seat grid with its legend.
fn render_seat_map(frame: &mut Frame, view: &DashboardView, area: Rect) {
    let mut text = vec![
        Line::from(vec![
            Span::raw(" "),
            Span::styled("■", Style::default().fg(Color::Green)),
            Span::raw(" Available  "),
            Span::styled("■", Style::default().fg(Color::Red)),
            Span::raw(" Occupied"),
        ]),
        Line::from(""),
    ];

    if view.seats.is_empty() {
        text.push(Line::from(Span::styled(
            format!(" {}", WAITING_FOR_LAYOUT),
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        text.extend(seat_lines(view, area.width.saturating_sub(2)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" LIVE FLOOR MAP ")
        .border_style(Style::default().fg(Color::Blue));

    frame.render_widget(Paragraph::new(text).block(block), area);
}

/// Render live events panel.
fn render_live_events(frame: &mut Frame, app: &App, area: Rect) {
    let max_events = (area.height as usize).saturating_sub(2);

    let items: Vec<ListItem> = app
        .live_events
        .iter()
        .take(max_events)
        .map(|event| {
            let time_str = format_elapsed(event.timestamp.elapsed());

            let type_color = match event.event_type {
                "snapshot" => Color::Green,
                "seed" => Color::Blue,
                "ws" => Color::Cyan,
                "rejected" => Color::Yellow,
                "error" => Color::Red,
                _ => Color::Gray,
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!(" {:<8}", time_str), Style::default().fg(Color::DarkGray)),
                Span::raw(" │ "),
                Span::styled(format!("{:<9}", event.event_type), Style::default().fg(type_color)),
                Span::raw(" │ "),
                Span::raw(event.description.as_str()),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            " LIVE EVENTS ({} received, {} rejected) ",
            app.snapshots_received, app.frames_rejected
        ))
        .border_style(Style::default().fg(Color::Green));

    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            " Waiting for events...",
            Style::default().fg(Color::DarkGray),
        ))])
    } else {
        List::new(items)
    };

    frame.render_widget(list.block(block), area);
}

/// Render the footer: sync label, notices, key hints.
fn render_footer(frame: &mut Frame, view: &DashboardView, area: Rect) {
    let mut text = vec![Line::from(vec![
        Span::raw(" Last Sync: "),
        Span::styled(
            view.last_sync.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ])];

    for notice in &view.notices {
        text.push(Line::from(Span::styled(
            format!(" {}", notice),
            Style::default().fg(Color::DarkGray),
        )));
    }

    text.push(Line::from(vec![
        Span::styled(" [Q] ", Style::default().fg(Color::Yellow)),
        Span::raw("Quit"),
    ]));

    frame.render_widget(Paragraph::new(text).block(Block::default().borders(Borders::ALL)), area);
}

/// Format elapsed time as a human-readable string.
fn format_elapsed(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::sync::SyncEvent;
    use occupancy_types::OccupancySnapshot;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Instant;

    const SAMPLE: &str = r#"{"total":100,"occupied":40,"empty":60,"seats":{"1":"OCCUPIED","2":"FREE"},"last_updated":"12:00:01"}"#;

    fn draw(app: &App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal
            .draw(|frame| crate::ui::render(frame, app))
            .unwrap();
        terminal
    }

    fn screen_lines(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    fn has_cell(terminal: &Terminal<TestBackend>, symbol: &str, bg: Color) -> bool {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height).any(|y| {
            (0..buffer.area.width).any(|x| {
                let cell = &buffer[(x, y)];
                cell.symbol() == symbol && cell.bg == bg
            })
        })
    }

    fn connected_app_with(json: &str) -> App {
        let mut app = App::new(&DashboardConfig {
            notices: vec!["Quiet zone: floor 2".to_string()],
            ..DashboardConfig::default()
        });
        app.handle_sync_event(SyncEvent::Connected);
        app.handle_sync_event(SyncEvent::Snapshot {
            snapshot: OccupancySnapshot::from_json(json).unwrap(),
            received_at: Instant::now(),
        });
        app
    }

    #[test]
    fn test_end_to_end_screen() {
        let app = connected_app_with(SAMPLE);
        let terminal = draw(&app);
        let screen = screen_lines(&terminal).join("\n");

        assert!(screen.contains("● Live"));
        assert!(screen.contains("Total Capacity"));
        assert!(screen.contains("100"));
        assert!(screen.contains("Available Now"));
        assert!(screen.contains("60"));
        assert!(screen.contains("40"));
        assert!(screen.contains("Last Sync: 12:00:01"));
        assert!(screen.contains("Quiet zone: floor 2"));

        assert!(has_cell(&terminal, "1", Color::Red));
        assert!(has_cell(&terminal, "2", Color::Green));
        assert!(!has_cell(&terminal, "1", Color::Green));
        assert!(!has_cell(&terminal, "2", Color::Red));
        assert_eq!(terminal.backend().buffer()[(0, 0)].fg, Color::Green);
    }

    #[test]
    fn test_offline_waiting_screen() {
        let app = App::new(&DashboardConfig::default());
        let terminal = draw(&app);
        let screen = screen_lines(&terminal).join("\n");

        assert!(screen.contains("○ Offline"));
        assert!(screen.contains(WAITING_FOR_LAYOUT));
        assert!(screen.contains("Last Sync: Waiting..."));
        assert_eq!(terminal.backend().buffer()[(0, 0)].fg, Color::DarkGray);
    }

    #[test]
    fn test_header_border_follows_socket() {
        assert_eq!(header_border_style(StatusPill::Live).fg, Some(Color::Green));
        assert_eq!(header_border_style(StatusPill::Paused).fg, Some(Color::Yellow));
        assert_eq!(header_border_style(StatusPill::Offline).fg, Some(Color::DarkGray));
    }

    #[test]
    fn test_same_snapshot_renders_identically() {
        let mut app = connected_app_with(SAMPLE);
        let view = app.view(Instant::now());
        let first = screen_lines(&draw(&app));

        app.handle_sync_event(SyncEvent::Snapshot {
            snapshot: OccupancySnapshot::from_json(SAMPLE).unwrap(),
            received_at: Instant::now(),
        });
        assert_eq!(app.view(Instant::now()), view);

        // The event panel grows by one entry; everything above it is unchanged.
        let second = screen_lines(&draw(&app));
        assert_eq!(first[..16], second[..16]);
    }

    #[test]
    fn test_seat_lines_wrap() {
        let seats = (1..=12)
            .map(|i| format!("\"{i}\":\"FREE\""))
            .collect::<Vec<_>>()
            .join(",");
        let json = format!(
            r#"{{"total":12,"occupied":0,"empty":12,"seats":{{{seats}}},"last_updated":"x"}}"#
        );
        let app = connected_app_with(&json);
        let view = app.view(Instant::now());

        // Tiles are 4 wide (" 1  " .. " 12 ") plus a gap: 3 fit in 15 columns.
        let lines = seat_lines(&view, 15);
        assert_eq!(lines.len(), 4);
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, " 1    2    3  ");
    }
}
