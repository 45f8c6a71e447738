use super::{skeleton_spans, text_or_skeleton, PartialContext};
use crate::component::BadgeVariant;
use crate::motion::stagger_delay;
use crate::schema::PartialSafe;
use crate::ui::theme::Theme;
use crate::ui::view::View;
use ratatui::text::{Line, Span};

const BADGE_PLACEHOLDER: usize = 10;

pub fn view(safe: &PartialSafe, ctx: &PartialContext) -> View {
    let badge = match safe.safe_badge {
        Some(flag) => {
            let (label, variant) = if flag {
                ("SAFE", BadgeVariant::Success)
            } else {
                ("NO FLAGS", BadgeVariant::Neutral)
            };
            Line::from(Span::styled(
                format!(
                    " {} {} {} {} {} ",
                    Theme::BADGE_OPEN,
                    label,
                    Theme::DOT_SEPARATOR,
                    ctx.profile.label().to_uppercase(),
                    Theme::BADGE_CLOSE
                ),
                Theme::badge_style(variant),
            ))
        }
        None => {
            let mut spans = vec![Span::styled(format!(" {} ", Theme::BADGE_OPEN), Theme::text_dim())];
            spans.extend(skeleton_spans(BADGE_PLACEHOLDER, ctx));
            spans.push(Span::styled(format!(" {} ", Theme::BADGE_CLOSE), Theme::text_dim()));
            Line::from(spans)
        }
    };

    View::group(vec![
        View::new(vec![badge, Line::from("")]).with_motion("safe/badge", stagger_delay(0, ctx.stagger)),
        text_or_skeleton(safe.summary.as_deref(), Theme::text(), 2, ctx)
            .with_motion("safe/summary", stagger_delay(1, ctx.stagger)),
    ])
}
