use crate::session::ScanStatus;
use crate::ui::helpers::truncate_to_width;
use crate::ui::theme::Theme;
use crate::ui::App;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const SUBJECT_WIDTH: usize = 32;

pub(super) fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            format!("   {}", Theme::APP_LOGO),
            Style::default()
                .fg(Theme::WHITE)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}  ", Theme::DOT_SEPARATOR), Theme::text_dim()),
        Span::styled(app.profile.label(), Style::default().fg(Theme::GREY_200)),
    ];

    let status = match (app.static_tree.is_some(), app.status()) {
        (true, _) => Some(("tree", Theme::GREY_400)),
        (false, Some(ScanStatus::Streaming)) => Some(("scanning", Theme::GREY_200)),
        (false, Some(ScanStatus::Complete)) => Some(("done", Theme::GREEN)),
        (false, Some(ScanStatus::Failed)) => Some(("failed", Theme::RED)),
        (false, None) => None,
    };
    if let Some((label, color)) = status {
        spans.push(Span::styled(format!("  {}  ", Theme::DOT_SEPARATOR), Theme::text_dim()));
        spans.push(Span::styled(label, Style::default().fg(color)));
    }
    if let Some(session) = app.controller.session() {
        spans.push(Span::styled(
            format!("  {}", truncate_to_width(session.subject(), SUBJECT_WIDTH)),
            Theme::text_muted(),
        ));
    }

    let lines = vec![Line::from(""), Line::from(spans)];
    let header = Paragraph::new(lines).style(Style::default().bg(Theme::BG));
    frame.render_widget(header, area);
}
