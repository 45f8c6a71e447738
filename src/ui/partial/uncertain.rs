use super::{text_or_skeleton, PartialContext};
use crate::schema::PartialUncertain;
use crate::ui::theme::Theme;
use crate::ui::view::View;
use ratatui::text::{Line, Span};
use std::time::Duration;

pub fn view(uncertain: &PartialUncertain, ctx: &PartialContext) -> View {
    let heading = View::new(vec![
        Line::from(Span::styled(
            format!("Not sure about this one ({})", ctx.profile.label()),
            Theme::headline(),
        )),
        Line::from(""),
    ])
    .with_motion("uncertain/heading", Duration::ZERO);

    View::group(vec![
        heading,
        text_or_skeleton(uncertain.raw_text.as_deref(), Theme::text_muted(), 3, ctx)
            .with_motion("uncertain/text", ctx.stagger),
    ])
}
