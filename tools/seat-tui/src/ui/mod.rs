//! UI module for TUI rendering.

pub mod dashboard;

use std::time::Instant;

use crate::app::App;
use ratatui::Frame;

/// Render the dashboard for the current instant.
pub fn render(frame: &mut Frame, app: &App) {
    let view = app.view(Instant::now());
    dashboard::render(frame, app, &view);
}
