mod footer;
mod header;
mod main;
mod toast;

use crate::ui::theme::Theme;
use crate::ui::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::Block,
    Frame,
};
use std::time::Instant;

use footer::render_footer;
use header::render_header;
use main::render_main;
use toast::render_toast;

/// Main render function
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Clear with dark background
    frame.render_widget(Block::default().style(Style::default().bg(Theme::BG)), area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Scan result
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(frame, layout[0], app);
    render_main(frame, layout[1], app, Instant::now());
    render_footer(frame, layout[2], app);

    if let Some(toast) = &app.toast {
        render_toast(frame, toast);
    }
}
