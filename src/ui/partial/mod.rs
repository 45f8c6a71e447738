//! Views for in-flight analyses
//!
//! Each variant has a view that accepts any combination of present and
//! absent fields. Missing scalars draw as shimmering skeleton blocks,
//! missing sections draw a section-shaped skeleton, and every element gets
//! a motion tag so entrances stagger as data arrives.

pub mod decision;
pub mod risk;
pub mod safe;
pub mod thinking;
pub mod uncertain;

use crate::schema::{PartialAnalysis, UserProfile};
use crate::ui::theme::Theme;
use crate::ui::view::View;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use std::time::Duration;

pub use decision::{option_controls, OptionControl};

#[derive(Debug, Clone, Copy)]
pub struct PartialContext<'a> {
    /// The stream is still running
    pub streaming: bool,
    /// Animation frame, advanced by the UI loop
    pub frame: usize,
    pub width: u16,
    pub stagger: Duration,
    pub profile: UserProfile,
    pub reasoning: &'a [String],
}

impl<'a> PartialContext<'a> {
    pub fn new(profile: UserProfile, width: u16) -> Self {
        Self {
            streaming: true,
            frame: 0,
            width,
            stagger: crate::motion::DEFAULT_STAGGER,
            profile,
            reasoning: &[],
        }
    }

    pub fn finished(mut self) -> Self {
        self.streaming = false;
        self
    }

    pub fn cells(&self) -> usize {
        self.width.max(12) as usize
    }
}

/// Render whatever has arrived so far.
pub fn partial_view(snapshot: &PartialAnalysis, ctx: &PartialContext) -> View {
    match snapshot {
        PartialAnalysis::Pending | PartialAnalysis::Unrecognized(_) => thinking::view(ctx),
        PartialAnalysis::Safe(safe) => safe::view(safe, ctx),
        PartialAnalysis::Risk(risk) => risk::view(risk, ctx),
        PartialAnalysis::Decision(decision) => decision::view(decision, ctx),
        PartialAnalysis::Uncertain(uncertain) => uncertain::view(uncertain, ctx),
    }
}

/// A row of shimmering skeleton blocks
pub fn skeleton_spans(width: usize, ctx: &PartialContext) -> Vec<Span<'static>> {
    (0..width)
        .map(|column| {
            Span::styled(
                Theme::SKELETON_BLOCK.to_string(),
                Style::default().fg(Theme::shimmer(ctx.frame, column)),
            )
        })
        .collect()
}

pub fn skeleton_line(width: usize, ctx: &PartialContext) -> Line<'static> {
    Line::from(skeleton_spans(width, ctx))
}

/// Skeleton paragraph: full-width rows with a shorter last row
pub fn skeleton_block(rows: usize, ctx: &PartialContext) -> View {
    let width = ctx.cells();
    let lines = (0..rows)
        .map(|row| {
            let len = if row + 1 == rows { width * 3 / 5 } else { width };
            skeleton_line(len, ctx)
        })
        .collect();
    View::new(lines)
}

/// Present text wrapped to the context width, or a skeleton of `rows`.
pub fn text_or_skeleton(text: Option<&str>, style: Style, rows: usize, ctx: &PartialContext) -> View {
    match text.filter(|t| !t.trim().is_empty()) {
        Some(text) => {
            let mut lines = Vec::new();
            for paragraph in text.split('\n') {
                for row in crate::ui::helpers::wrap_text(paragraph, ctx.cells()) {
                    lines.push(Line::from(Span::styled(row, style)));
                }
            }
            View::new(lines)
        }
        None => skeleton_block(rows, ctx),
    }
}

#[cfg(test)]
mod tests;
