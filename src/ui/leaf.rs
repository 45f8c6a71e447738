//! One view function per component kind
//!
//! `leaf_view` is the closed dispatch table used by the tree renderer. Each
//! function receives its node, the already-rendered child views and the
//! render context, and either returns a view or a `RenderFault` that the
//! fault boundary turns into an inline indicator.

use crate::component::{
    BadgeProps, CardProps, ChartProps, ComponentKind, ComponentProps, ListProps, TextProps,
    TextRole, UiComponent,
};
use crate::ui::helpers::{display_width, pad_to_width, truncate_to_width, wrap_text};
use crate::ui::theme::Theme;
use crate::ui::view::View;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::time::Duration;

pub const DEFAULT_WIDTH: u16 = 72;
const MIN_WIDTH: u16 = 12;
const CHART_LABEL_MAX: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    /// Cells available at this depth
    pub width: u16,
    pub stagger: Duration,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            stagger: crate::motion::DEFAULT_STAGGER,
        }
    }
}

impl RenderContext {
    pub fn new(width: u16, stagger: Duration) -> Self {
        Self { width, stagger }
    }

    /// Context for content drawn `columns` further in.
    pub fn inset(&self, columns: u16) -> Self {
        Self {
            width: self.width.saturating_sub(columns).max(MIN_WIDTH),
            ..*self
        }
    }

    fn cells(&self) -> usize {
        self.width.max(MIN_WIDTH) as usize
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderFault {
    #[error("chart has no data points")]
    EmptyChart,
    #[error("chart value for '{label}' is not a finite number")]
    NonFiniteValue { label: String },
    #[error("badge label is empty")]
    EmptyLabel,
    #[error("{expected} view received {found} properties")]
    KindMismatch {
        expected: ComponentKind,
        found: ComponentKind,
    },
    #[error("view panicked: {0}")]
    Panicked(String),
}

pub type LeafView = fn(&UiComponent, Vec<View>, &RenderContext) -> Result<View, RenderFault>;

pub fn leaf_view(kind: ComponentKind) -> LeafView {
    match kind {
        ComponentKind::Text => text_view,
        ComponentKind::Badge => badge_view,
        ComponentKind::Card => card_view,
        ComponentKind::List => list_view,
        ComponentKind::Chart => chart_view,
    }
}

/// Columns a kind indents its children by
pub fn child_inset(kind: ComponentKind) -> u16 {
    match kind {
        ComponentKind::Card => 2,
        _ => 0,
    }
}

fn mismatch(expected: ComponentKind, node: &UiComponent) -> RenderFault {
    RenderFault::KindMismatch {
        expected,
        found: node.kind(),
    }
}

fn text_props(node: &UiComponent) -> Result<&TextProps, RenderFault> {
    match node.props() {
        ComponentProps::Text(props) => Ok(props),
        _ => Err(mismatch(ComponentKind::Text, node)),
    }
}

fn text_style(role: TextRole) -> Style {
    match role {
        TextRole::Body => Theme::text(),
        TextRole::Headline => Theme::headline(),
        TextRole::Caption => Theme::caption(),
    }
}

pub fn text_view(
    node: &UiComponent,
    children: Vec<View>,
    ctx: &RenderContext,
) -> Result<View, RenderFault> {
    let props = text_props(node)?;
    let style = text_style(props.role);
    let mut lines: Vec<Line<'static>> = Vec::new();
    for paragraph in props.content.split('\n') {
        for row in wrap_text(paragraph, ctx.cells()) {
            lines.push(Line::from(Span::styled(row, style)));
        }
    }
    if props.role == TextRole::Headline {
        lines.push(Line::from(""));
    }
    Ok(View::new(lines).with_children(children))
}

fn badge_props(node: &UiComponent) -> Result<&BadgeProps, RenderFault> {
    match node.props() {
        ComponentProps::Badge(props) => Ok(props),
        _ => Err(mismatch(ComponentKind::Badge, node)),
    }
}

pub fn badge_view(
    node: &UiComponent,
    children: Vec<View>,
    ctx: &RenderContext,
) -> Result<View, RenderFault> {
    let props = badge_props(node)?;
    let label = props.label.trim();
    if label.is_empty() {
        return Err(RenderFault::EmptyLabel);
    }
    let label = truncate_to_width(label, ctx.cells().saturating_sub(4));
    let chip = Span::styled(
        format!(" {} {} {} ", Theme::BADGE_OPEN, label, Theme::BADGE_CLOSE),
        Theme::badge_style(props.variant),
    );
    Ok(View::new(vec![Line::from(chip), Line::from("")]).with_children(children))
}

fn card_props(node: &UiComponent) -> Result<&CardProps, RenderFault> {
    match node.props() {
        ComponentProps::Card(props) => Ok(props),
        _ => Err(mismatch(ComponentKind::Card, node)),
    }
}

/// `╭─ title ──── HIGH ─╮`
pub(crate) fn card_top(title: &str, chip: Option<&str>, width: usize, style: Style) -> Line<'static> {
    let chip_text = chip.map(|c| format!(" {} ", c)).unwrap_or_default();
    let chip_width = display_width(&chip_text);
    let title_room = width.saturating_sub(6 + chip_width);
    let title = if title.is_empty() {
        String::new()
    } else {
        format!(" {} ", truncate_to_width(title, title_room))
    };
    let fill = width.saturating_sub(3 + display_width(&title) + chip_width + 1);

    let mut spans = vec![
        Span::styled(format!("{}{}", Theme::BOX_ROUND_TL, Theme::BOX_HORIZONTAL), style),
        Span::styled(title, Theme::headline()),
        Span::styled(Theme::BOX_HORIZONTAL.to_string().repeat(fill), style),
    ];
    if !chip_text.is_empty() {
        spans.push(Span::styled(chip_text, style.add_modifier(Modifier::BOLD | Modifier::REVERSED)));
    }
    spans.push(Span::styled(
        format!("{}{}", Theme::BOX_HORIZONTAL, Theme::BOX_ROUND_TR),
        style,
    ));
    Line::from(spans)
}

pub(crate) fn card_bottom(width: usize, style: Style) -> Line<'static> {
    Line::from(Span::styled(
        format!(
            "{}{}{}",
            Theme::BOX_ROUND_BL,
            Theme::BOX_HORIZONTAL.to_string().repeat(width.saturating_sub(2)),
            Theme::BOX_ROUND_BR
        ),
        style,
    ))
}

pub(crate) fn card_gutter(style: Style) -> Span<'static> {
    Span::styled(format!("{} ", Theme::BOX_VERTICAL), style)
}

pub fn card_view(
    node: &UiComponent,
    children: Vec<View>,
    ctx: &RenderContext,
) -> Result<View, RenderFault> {
    let props = card_props(node)?;
    let width = ctx.cells();
    let frame = Style::default().fg(Theme::card_color(props.visual_variant()));
    let chip = props.severity.map(|s| match s {
        crate::component::Severity::High => "HIGH",
        crate::component::Severity::Med => "MED",
        crate::component::Severity::Low => "LOW",
    });

    // A title too long for the border moves into the body in full
    let title = props.title.as_deref().unwrap_or("");
    let chip_width = chip.map(|c| display_width(c) + 2).unwrap_or(0);
    let fits = display_width(title) <= width.saturating_sub(6 + chip_width);
    let border_title = if fits { title } else { "" };

    let mut body = Vec::new();
    if !fits {
        let rows: Vec<Line<'static>> = wrap_text(title, width.saturating_sub(2))
            .into_iter()
            .map(|row| Line::from(Span::styled(row, Theme::headline())))
            .collect();
        body.push(View::new(rows));
    }
    if let Some(text) = props.body.as_deref().filter(|b| !b.trim().is_empty()) {
        let rows: Vec<Line<'static>> = wrap_text(text, width.saturating_sub(2))
            .into_iter()
            .map(|row| Line::from(Span::styled(row, Theme::text())))
            .collect();
        body.push(View::new(rows));
    }
    body.extend(children);

    Ok(View::new(vec![card_top(border_title, chip, width, frame)])
        .with_children(body)
        .with_gutter(card_gutter(frame))
        .with_tail(vec![card_bottom(width, frame), Line::from("")]))
}

fn list_props(node: &UiComponent) -> Result<&ListProps, RenderFault> {
    match node.props() {
        ComponentProps::List(props) => Ok(props),
        _ => Err(mismatch(ComponentKind::List, node)),
    }
}

pub fn list_view(
    node: &UiComponent,
    children: Vec<View>,
    ctx: &RenderContext,
) -> Result<View, RenderFault> {
    let props = list_props(node)?;
    let mut lines = Vec::new();
    for (i, item) in props.items.iter().enumerate() {
        let marker = if props.ordered {
            format!("{}. ", i + 1)
        } else {
            format!("{} ", Theme::BULLET_FILLED)
        };
        let hang = " ".repeat(display_width(&marker));
        let rows = wrap_text(item, ctx.cells().saturating_sub(hang.len()));
        for (row_index, row) in rows.into_iter().enumerate() {
            let lead = if row_index == 0 {
                Span::styled(marker.clone(), Theme::key())
            } else {
                Span::raw(hang.clone())
            };
            lines.push(Line::from(vec![lead, Span::styled(row, Theme::text())]));
        }
    }
    lines.push(Line::from(""));
    Ok(View::new(lines).with_children(children))
}

fn chart_props(node: &UiComponent) -> Result<&ChartProps, RenderFault> {
    match node.props() {
        ComponentProps::Chart(props) => Ok(props),
        _ => Err(mismatch(ComponentKind::Chart, node)),
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

pub fn chart_view(
    node: &UiComponent,
    children: Vec<View>,
    ctx: &RenderContext,
) -> Result<View, RenderFault> {
    let props = chart_props(node)?;
    if props.data.is_empty() {
        return Err(RenderFault::EmptyChart);
    }
    if let Some(bad) = props.data.iter().find(|p| !p.value.is_finite()) {
        return Err(RenderFault::NonFiniteValue {
            label: bad.label.clone(),
        });
    }

    let label_width = props
        .data
        .iter()
        .map(|p| display_width(&p.label))
        .max()
        .unwrap_or(0)
        .min(CHART_LABEL_MAX);
    let values: Vec<String> = props.data.iter().map(|p| format_value(p.value)).collect();
    let value_width = values.iter().map(|v| v.len()).max().unwrap_or(1);
    let bar_width = ctx
        .cells()
        .saturating_sub(label_width + value_width + 3)
        .max(4);

    let mut lines = Vec::new();
    if let Some(title) = props.title.as_deref() {
        lines.push(Line::from(Span::styled(title.to_string(), Theme::headline())));
    }
    for ((point, fraction), value) in props.data.iter().zip(props.scaled()).zip(values) {
        let filled = (fraction * bar_width as f64).round() as usize;
        let color = Theme::severity_color(point.severity);
        lines.push(Line::from(vec![
            Span::styled(pad_to_width(&point.label, label_width), Theme::text_muted()),
            Span::raw(" "),
            Span::styled(
                Theme::BAR_FILLED.to_string().repeat(filled),
                Style::default().fg(color),
            ),
            Span::styled(
                Theme::BAR_EMPTY.to_string().repeat(bar_width - filled),
                Theme::text_dim(),
            ),
            Span::raw(" "),
            Span::styled(value, Theme::text()),
        ]));
    }
    lines.push(Line::from(""));
    Ok(View::new(lines).with_children(children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{BadgeVariant, ChartPoint, Severity};

    fn ctx() -> RenderContext {
        RenderContext::new(40, Duration::ZERO)
    }

    #[test]
    fn test_every_kind_has_a_view() {
        for kind in ComponentKind::ALL {
            let _ = leaf_view(kind);
        }
    }

    #[test]
    fn test_text_wraps_to_width() {
        let node = UiComponent::text("word ".repeat(30), TextRole::Body);
        let view = text_view(&node, Vec::new(), &ctx()).unwrap();
        assert!(view.height() > 1);
        for line in view.flatten() {
            assert!(line.width() <= 40);
        }
    }

    #[test]
    fn test_card_frames_body_and_children() {
        let node = UiComponent::card(CardProps {
            title: Some("Sugar".into()),
            body: Some("Spikes glucose".into()),
            severity: Some(Severity::High),
            variant: None,
        });
        let child = View::line("nested");
        let view = card_view(&node, vec![child], &ctx()).unwrap();
        let text = view.plain_text();
        assert!(text.contains("Sugar"));
        assert!(text.contains("HIGH"));
        assert!(text.contains("│ Spikes glucose"));
        assert!(text.contains("│ nested"));
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with('╭'));
        assert_eq!(display_width(lines[0]), 40);
    }

    #[test]
    fn test_list_numbers_ordered_items() {
        let node = UiComponent::list(vec!["A".into(), "B".into()], true);
        let text = list_view(&node, Vec::new(), &ctx()).unwrap().plain_text();
        assert!(text.starts_with("1. A\n2. B"));
    }

    #[test]
    fn test_chart_bars_scale_to_largest_value() {
        let node = UiComponent::chart(
            Some("Overview".into()),
            vec![
                ChartPoint {
                    label: "big".into(),
                    value: 2.0,
                    severity: Some(Severity::High),
                },
                ChartPoint {
                    label: "small".into(),
                    value: 1.0,
                    severity: Some(Severity::Med),
                },
            ],
        );
        let text = chart_view(&node, Vec::new(), &ctx()).unwrap().plain_text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Overview");
        let filled = |line: &str| line.chars().filter(|c| *c == Theme::BAR_FILLED).count();
        let (big, small) = (filled(lines[1]), filled(lines[2]));
        assert!(big > small);
        assert!((big as i64 - 2 * small as i64).abs() <= 1);
        assert!(lines[1].ends_with(" 2"));
        assert!(lines[2].ends_with(" 1"));
    }

    #[test]
    fn test_faults_for_bad_properties() {
        let empty = UiComponent::chart(None, Vec::new());
        assert_eq!(
            chart_view(&empty, Vec::new(), &ctx()),
            Err(RenderFault::EmptyChart)
        );

        let nan = UiComponent::chart(
            None,
            vec![ChartPoint {
                label: "x".into(),
                value: f64::NAN,
                severity: None,
            }],
        );
        assert!(matches!(
            chart_view(&nan, Vec::new(), &ctx()),
            Err(RenderFault::NonFiniteValue { .. })
        ));

        let blank = UiComponent::badge("  ", BadgeVariant::Neutral);
        assert_eq!(
            badge_view(&blank, Vec::new(), &ctx()),
            Err(RenderFault::EmptyLabel)
        );

        let text = UiComponent::text("hi", TextRole::Body);
        assert!(matches!(
            badge_view(&text, Vec::new(), &ctx()),
            Err(RenderFault::KindMismatch { .. })
        ));
    }
}
