use super::PartialContext;
use crate::ui::theme::Theme;
use crate::ui::view::View;
use ratatui::text::{Line, Span};
use std::time::Duration;

pub fn view(ctx: &PartialContext) -> View {
    let spinner = Theme::SPINNER_BRAILLE[ctx.frame % Theme::SPINNER_BRAILLE.len()];
    let mut children = vec![View::new(vec![
        Line::from(vec![
            Span::styled(format!("{} ", spinner), Theme::key()),
            Span::styled("Thinking", Theme::headline()),
        ]),
        Line::from(Span::styled(
            format!("Checking for {} ({})", ctx.profile.label(), ctx.profile.focus()),
            Theme::caption(),
        )),
        Line::from(""),
    ])
    .with_motion("thinking/header", Duration::ZERO)];

    let last = ctx.reasoning.len().saturating_sub(1);
    for (index, step) in ctx.reasoning.iter().enumerate() {
        let mark = if index == last && ctx.streaming {
            Span::styled(format!("  {} ", spinner), Theme::text_muted())
        } else {
            Span::styled(format!("  {} ", Theme::CHECK_MARK), Theme::text_dim())
        };
        children.push(
            View::line(Line::from(vec![mark, Span::styled(step.clone(), Theme::text_muted())]))
                .with_motion(format!("thinking/{}", index), Duration::ZERO),
        );
    }
    View::group(children)
}
