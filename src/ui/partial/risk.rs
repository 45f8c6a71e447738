//! RISK while streaming
//!
//! Items are grouped high, then medium, then a trailing group whose severity
//! has not arrived yet. Entrance delay counts across groups so high items
//! always animate first, however the stream interleaves them.

use super::{skeleton_line, skeleton_spans, text_or_skeleton, PartialContext};
use crate::component::Severity;
use crate::motion::group_delay;
use crate::schema::{PartialRisk, PartialRiskItem, RiskSeverity};
use crate::ui::leaf::{card_bottom, card_gutter, card_top};
use crate::ui::theme::Theme;
use crate::ui::view::View;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::time::Duration;

const HIGH_SKELETON_CARDS: usize = 2;
const MED_SKELETON_BARS: usize = 3;
const PENDING_CHIP: &str = "···";

#[derive(Debug, Default)]
struct Groups {
    high: Vec<usize>,
    med: Vec<usize>,
    pending: Vec<usize>,
}

fn group(items: &[PartialRiskItem]) -> Groups {
    let mut groups = Groups::default();
    for (index, item) in items.iter().enumerate() {
        match item.severity {
            Some(RiskSeverity::High) => groups.high.push(index),
            Some(RiskSeverity::Med) => groups.med.push(index),
            None => groups.pending.push(index),
        }
    }
    groups
}

pub fn view(risk: &PartialRisk, ctx: &PartialContext) -> View {
    let items = risk.items();
    let groups = group(items);

    let mut children = vec![text_or_skeleton(risk.headline.as_deref(), Theme::headline(), 1, ctx)
        .with_motion("risk/headline", Duration::ZERO)];
    children.push(View::line("").with_motion("risk/spacer", Duration::ZERO));

    // Both skeletons stay up for an empty list, streaming or not
    let high_skeleton = groups.high.is_empty() && (items.is_empty() || ctx.streaming);
    let med_skeleton = groups.med.is_empty() && (items.is_empty() || ctx.streaming);

    if !groups.high.is_empty() || high_skeleton {
        children.push(
            group_header("High risk", Some(RiskSeverity::High))
                .with_motion("risk/high", Duration::ZERO),
        );
    }
    if high_skeleton {
        children.push(high_skeleton_view(ctx).with_motion("risk/skeleton/high", Duration::ZERO));
    }
    for (position, &index) in groups.high.iter().enumerate() {
        children.push(
            item_card(&items[index], ctx)
                .with_motion(format!("risk/item/{}", index), group_delay(0, position, ctx.stagger)),
        );
    }

    let prior = groups.high.len();
    if !groups.med.is_empty() || med_skeleton {
        children.push(
            group_header("Medium risk", Some(RiskSeverity::Med))
                .with_motion("risk/med", group_delay(prior, 0, ctx.stagger)),
        );
    }
    if med_skeleton {
        children.push(
            med_skeleton_view(ctx).with_motion("risk/skeleton/med", group_delay(prior, 0, ctx.stagger)),
        );
    }
    for (position, &index) in groups.med.iter().enumerate() {
        children.push(
            item_card(&items[index], ctx)
                .with_motion(format!("risk/item/{}", index), group_delay(prior, position, ctx.stagger)),
        );
    }

    let prior = prior + groups.med.len();
    for (position, &index) in groups.pending.iter().enumerate() {
        children.push(
            item_card(&items[index], ctx)
                .with_motion(format!("risk/item/{}", index), group_delay(prior, position, ctx.stagger)),
        );
    }

    View::group(children)
}

fn severity_style(severity: Option<RiskSeverity>) -> Style {
    Style::default().fg(Theme::severity_color(severity.map(Severity::from)))
}

fn group_header(label: &str, severity: Option<RiskSeverity>) -> View {
    View::line(Line::from(Span::styled(
        label.to_uppercase(),
        severity_style(severity).add_modifier(Modifier::BOLD),
    )))
}

/// Card shell for an item; every sub-field may still be missing.
fn item_card(item: &PartialRiskItem, ctx: &PartialContext) -> View {
    let width = ctx.cells();
    let style = severity_style(item.severity);
    let chip = item.severity.map(|s| s.label()).unwrap_or(PENDING_CHIP);
    let title = item.ingredient.as_deref().unwrap_or("");

    let inner = PartialContext {
        width: ctx.width.saturating_sub(2),
        ..*ctx
    };
    let body = text_or_skeleton(item.reason.as_deref(), Theme::text_muted(), 1, &inner);

    View::new(vec![card_top(title, Some(chip), width, style)])
        .with_children(vec![body])
        .with_tail(vec![card_bottom(width, style), Line::from("")])
        .with_gutter(card_gutter(style))
}

/// Tall empty card outlines
fn high_skeleton_view(ctx: &PartialContext) -> View {
    let width = ctx.cells();
    let style = Theme::border();
    let rows = (0..HIGH_SKELETON_CARDS)
        .map(|_| {
            View::new(vec![card_top("", None, width, style)])
                .with_children(vec![View::new(vec![
                    skeleton_line(width.saturating_sub(4), ctx),
                    skeleton_line(width / 2, ctx),
                ])])
                .with_tail(vec![card_bottom(width, style)])
                .with_gutter(card_gutter(style))
        })
        .collect();
    View::group(rows).with_tail(vec![Line::from("")])
}

/// Short bars
fn med_skeleton_view(ctx: &PartialContext) -> View {
    let width = ctx.cells();
    let lines = (0..MED_SKELETON_BARS)
        .map(|row| {
            let mut spans = vec![Span::styled("  ", Theme::text_dim())];
            spans.extend(skeleton_spans(width / 3 + row * 2, ctx));
            Line::from(spans)
        })
        .collect();
    View::new(lines).with_tail(vec![Line::from("")])
}
