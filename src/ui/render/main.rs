use crate::ui::theme::Theme;
use crate::ui::App;
use ratatui::{
    layout::{Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Instant;

pub(super) fn render_main(frame: &mut Frame, area: Rect, app: &mut App, now: Instant) {
    let inner = area.inner(Margin {
        horizontal: 3,
        vertical: 0,
    });

    if app.static_tree.is_none() && app.controller.session().is_none() {
        let hint = vec![
            Line::from(""),
            Line::from(Span::styled("No scan running.", Theme::text_muted())),
            Line::from(Span::styled("Press n to start one.", Theme::text_dim())),
        ];
        frame.render_widget(Paragraph::new(hint).style(Style::default().bg(Theme::BG)), inner);
        return;
    }

    let lines = app.main_view(inner.width, now).flatten();

    // Keep scroll inside the content
    let max_scroll = lines.len().saturating_sub(inner.height as usize);
    app.scroll = app.scroll.min(max_scroll);

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(app.scroll)
        .take(inner.height as usize)
        .collect();
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().bg(Theme::BG)),
        inner,
    );
}
