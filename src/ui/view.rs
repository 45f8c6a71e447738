//! Backend-neutral view tree
//!
//! Leaf and partial views produce `View`s: styled lines plus nested child
//! views and an optional motion tag. The animator turns a freshly built view
//! into this frame's view (staggered entrances, fades, retained exits) and
//! `flatten` turns it into ratatui lines for a `Paragraph`.

use crate::motion::{Phase, Presence, Spring};
use crate::ui::theme::Theme;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use std::time::{Duration, Instant};

/// Columns an entering element slides in from
pub const SLIDE_COLUMNS: u16 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionTag {
    pub key: String,
    pub delay: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub head: Vec<Line<'static>>,
    pub children: Vec<View>,
    pub tail: Vec<Line<'static>>,
    /// Drawn in front of every child line (a card's left border)
    pub gutter: Option<Span<'static>>,
    pub indent: u16,
    pub motion: Option<MotionTag>,
}

impl View {
    pub fn new(head: Vec<Line<'static>>) -> Self {
        Self {
            head,
            ..Self::default()
        }
    }

    pub fn line(line: impl Into<Line<'static>>) -> Self {
        Self::new(vec![line.into()])
    }

    pub fn group(children: Vec<View>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<View>) -> Self {
        self.children = children;
        self
    }

    pub fn with_tail(mut self, tail: Vec<Line<'static>>) -> Self {
        self.tail = tail;
        self
    }

    pub fn with_gutter(mut self, gutter: Span<'static>) -> Self {
        self.gutter = Some(gutter);
        self
    }

    pub fn with_motion(mut self, key: impl Into<String>, delay: Duration) -> Self {
        self.motion = Some(MotionTag {
            key: key.into(),
            delay,
        });
        self
    }

    /// Terminal lines for this view and all descendants.
    pub fn flatten(&self) -> Vec<Line<'static>> {
        let mut out = Vec::new();
        self.flatten_into(&mut out, &[]);
        out
    }

    fn flatten_into(&self, out: &mut Vec<Line<'static>>, prefix: &[Span<'static>]) {
        let mut own_prefix = prefix.to_vec();
        if self.indent > 0 {
            own_prefix.push(Span::raw(" ".repeat(self.indent as usize)));
        }

        for line in &self.head {
            out.push(prefixed(&own_prefix, line));
        }

        let mut child_prefix = own_prefix.clone();
        if let Some(gutter) = &self.gutter {
            child_prefix.push(gutter.clone());
        }
        for child in &self.children {
            child.flatten_into(out, &child_prefix);
        }

        for line in &self.tail {
            out.push(prefixed(&own_prefix, line));
        }
    }

    pub fn height(&self) -> usize {
        self.flatten().len()
    }

    /// Text content without styling, one terminal line per line.
    pub fn plain_text(&self) -> String {
        self.flatten()
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn fade(&mut self, opacity: f32) {
        self.fade_own(opacity);
        for child in &mut self.children {
            child.fade(opacity);
        }
    }

    /// Fade this level's lines, leaving children alone.
    fn fade_own(&mut self, opacity: f32) {
        if opacity >= 1.0 {
            return;
        }
        for line in self.head.iter_mut().chain(self.tail.iter_mut()) {
            fade_line(line, opacity);
        }
        if let Some(gutter) = &mut self.gutter {
            gutter.style = fade_style(gutter.style, opacity);
        }
    }
}

fn prefixed(prefix: &[Span<'static>], line: &Line<'static>) -> Line<'static> {
    if prefix.is_empty() {
        return line.clone();
    }
    let mut spans = prefix.to_vec();
    spans.extend(line.spans.iter().cloned());
    Line::from(spans).style(line.style)
}

fn fade_style(style: Style, opacity: f32) -> Style {
    let mut faded = style.fg(Theme::fade(style.fg.unwrap_or(Theme::GREY_100), opacity));
    if let Some(bg) = style.bg {
        faded = faded.bg(Theme::fade(bg, opacity));
    }
    faded
}

fn fade_line(line: &mut Line<'static>, opacity: f32) {
    for span in &mut line.spans {
        span.style = fade_style(span.style, opacity);
    }
}

#[derive(Debug, Clone)]
struct Retained {
    view: View,
    top_level: bool,
}

/// Applies entrance and exit motion to successive views of the same screen
#[derive(Debug, Clone)]
pub struct Animator {
    presence: Presence<String, Retained>,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(Spring::default(), crate::motion::DEFAULT_EXIT)
    }
}

impl Animator {
    pub fn new(spring: Spring, exit: Duration) -> Self {
        Self {
            presence: Presence::new(spring, exit),
        }
    }

    pub fn clear(&mut self) {
        self.presence.clear();
    }

    /// True while a top-level element that went away is still fading out.
    pub fn has_exits(&self, now: Instant) -> bool {
        self.presence
            .exiting(now)
            .iter()
            .any(|(_, retained, _)| retained.top_level)
    }

    /// Build this frame's view from a freshly rendered one.
    pub fn frame(&mut self, view: View, now: Instant) -> View {
        let mut tagged = Vec::new();
        for child in &view.children {
            collect_tagged(child, true, &mut tagged);
        }
        collect_own_tag(&view, false, &mut tagged);
        self.presence.sync(now, tagged);

        let mut framed = self.apply(view, now, 1.0).unwrap_or_default();

        for (key, retained, phase) in self.presence.exiting(now) {
            if !retained.top_level {
                continue;
            }
            let mut ghost = retained.view.clone();
            ghost.fade(phase.opacity());
            let order = self.presence.order_of(key).unwrap_or(usize::MAX);
            let position = framed
                .children
                .iter()
                .take_while(|child| {
                    child
                        .motion
                        .as_ref()
                        .and_then(|tag| self.presence.order_of(&tag.key))
                        .is_some_and(|child_order| child_order < order)
                })
                .count();
            framed.children.insert(position, ghost);
        }
        framed
    }

    fn apply(&self, mut view: View, now: Instant, inherited: f32) -> Option<View> {
        let mut opacity = inherited;
        if let Some(tag) = &view.motion {
            let phase = self.presence.phase(&tag.key, now);
            if !phase.is_visible() {
                return None;
            }
            opacity *= phase.opacity();
            if let Phase::Entering(progress) = phase {
                let slide = ((1.0 - progress) * SLIDE_COLUMNS as f32).round() as u16;
                view.indent = view.indent.saturating_add(slide);
            }
        }

        let children = std::mem::take(&mut view.children);
        view.children = children
            .into_iter()
            .filter_map(|child| self.apply(child, now, opacity))
            .collect();
        view.fade_own(opacity);
        Some(view)
    }
}

fn collect_own_tag(view: &View, top_level: bool, out: &mut Vec<(String, Duration, Retained)>) {
    if let Some(tag) = &view.motion {
        out.push((
            tag.key.clone(),
            tag.delay,
            Retained {
                view: view.clone(),
                top_level,
            },
        ));
    }
}

fn collect_tagged(view: &View, top_level: bool, out: &mut Vec<(String, Duration, Retained)>) {
    collect_own_tag(view, top_level, out);
    for child in &view.children {
        collect_tagged(child, false, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::DEFAULT_EXIT;

    fn keyed(text: &'static str, key: &str, delay_ms: u64) -> View {
        View::line(text).with_motion(key, Duration::from_millis(delay_ms))
    }

    #[test]
    fn test_flatten_applies_gutter_to_children_only() {
        let view = View::line("top")
            .with_children(vec![View::line("inner")])
            .with_tail(vec![Line::from("bottom")])
            .with_gutter(Span::raw("| "));
        assert_eq!(view.plain_text(), "top\n| inner\nbottom");
        assert_eq!(view.height(), 3);
    }

    #[test]
    fn test_nested_gutters_accumulate() {
        let inner = View::line("a").with_children(vec![View::line("b")]).with_gutter(Span::raw("> "));
        let outer = View::group(vec![inner]).with_gutter(Span::raw("| "));
        assert_eq!(outer.plain_text(), "| a\n| > b");
    }

    #[test]
    fn test_staggered_children_appear_in_order() {
        let mut animator = Animator::default();
        let start = Instant::now();
        let build = || View::group(vec![keyed("one", "a", 0), keyed("two", "b", 100)]);

        let first = animator.frame(build(), start);
        assert!(first.plain_text().contains("one"));
        assert!(!first.plain_text().contains("two"));

        let later = animator.frame(build(), start + Duration::from_secs(2));
        let text = later.plain_text();
        assert_eq!(text, "one\ntwo");
    }

    #[test]
    fn test_removed_child_fades_out_then_disappears() {
        let mut animator = Animator::default();
        let start = Instant::now();
        animator.frame(
            View::group(vec![keyed("one", "a", 0), keyed("two", "b", 0)]),
            start,
        );
        let settled = start + Duration::from_secs(2);
        animator.frame(
            View::group(vec![keyed("one", "a", 0), keyed("two", "b", 0)]),
            settled,
        );

        let removed = settled + Duration::from_millis(10);
        let ghosted = animator.frame(View::group(vec![keyed("one", "a", 0)]), removed);
        assert_eq!(ghosted.plain_text(), "one\ntwo");
        assert!(animator.has_exits(removed));

        let gone = removed + DEFAULT_EXIT;
        let after = animator.frame(View::group(vec![keyed("one", "a", 0)]), gone);
        assert_eq!(after.plain_text(), "one");
        assert!(!animator.has_exits(gone));
    }

    #[test]
    fn test_settled_view_is_unchanged() {
        let mut animator = Animator::default();
        let start = Instant::now();
        let view = View::group(vec![keyed("steady", "a", 0)]);
        animator.frame(view.clone(), start);
        let framed = animator.frame(view.clone(), start + Duration::from_secs(3));
        assert_eq!(framed, view);
    }
}
