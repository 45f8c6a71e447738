use crate::ui::theme::Theme;
use crate::ui::App;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

fn key_hint(spans: &mut Vec<Span<'static>>, key: &'static str, label: &'static str) {
    spans.push(Span::styled(
        format!(" {} ", key),
        Style::default().fg(Theme::GREY_900).bg(Theme::GREY_500),
    ));
    spans.push(Span::styled(
        format!(" {}  ", label),
        Style::default().fg(Theme::GREY_400),
    ));
}

pub(super) fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled("  ", Style::default())];

    if app.is_streaming() {
        let spinner = Theme::SPINNER_BRAILLE[app.loading_frame % Theme::SPINNER_BRAILLE.len()];
        spans.push(Span::styled(
            format!("{} streaming", spinner),
            Style::default().fg(Theme::GREY_200),
        ));
    } else if let Some(chosen) = app.chosen {
        spans.push(Span::styled(
            format!("{} option {} chosen", Theme::CHECK_MARK, chosen + 1),
            Style::default().fg(Theme::GREEN),
        ));
    }

    // Spacer before buttons
    let status_len: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let mut hints = Vec::new();
    if let Some(controls) = app.option_controls() {
        if controls[0].enabled() {
            key_hint(&mut hints, "1", "first");
        }
        if controls[1].enabled() {
            key_hint(&mut hints, "2", "second");
        }
    }
    key_hint(&mut hints, "n", "new scan");
    key_hint(&mut hints, "r", "reset");
    key_hint(&mut hints, "↑↓", "scroll");
    key_hint(&mut hints, "q", "quit");
    let hints_len: usize = hints.iter().map(|s| s.content.chars().count()).sum();

    let spacer_len = (area.width as usize).saturating_sub(status_len + hints_len);
    if spacer_len > 0 {
        spans.push(Span::styled(" ".repeat(spacer_len), Style::default()));
    }
    spans.extend(hints);

    let footer = Paragraph::new(vec![Line::from(""), Line::from(spans)])
        .style(Style::default().bg(Theme::BG));
    frame.render_widget(footer, area);
}
