use super::{skeleton_spans, text_or_skeleton, PartialContext};
use crate::motion::stagger_delay;
use crate::schema::PartialDecision;
use crate::ui::theme::Theme;
use crate::ui::view::View;
use ratatui::text::{Line, Span};

const OPTION_PLACEHOLDER: usize = 14;

/// One of the two selectable answers of a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionControl {
    pub index: usize,
    pub label: Option<String>,
}

impl OptionControl {
    /// Only an option whose text has arrived can be chosen.
    pub fn enabled(&self) -> bool {
        self.label.is_some()
    }

    /// Key that selects this option
    pub fn key(&self) -> char {
        char::from_digit(self.index as u32 + 1, 10).unwrap_or('?')
    }
}

pub fn option_controls(decision: &PartialDecision) -> [OptionControl; 2] {
    [0, 1].map(|index| OptionControl {
        index,
        label: decision.option(index).map(str::to_string),
    })
}

pub fn view(decision: &PartialDecision, ctx: &PartialContext) -> View {
    let mut children = vec![text_or_skeleton(decision.question.as_deref(), Theme::headline(), 1, ctx)
        .with_motion("decision/question", stagger_delay(0, ctx.stagger))];

    for control in option_controls(decision) {
        children.push(
            control_view(&control, ctx)
                .with_motion(format!("decision/option/{}", control.index), stagger_delay(control.index + 1, ctx.stagger)),
        );
    }
    View::group(children)
}

fn control_view(control: &OptionControl, ctx: &PartialContext) -> View {
    let mut spans = Vec::new();
    match &control.label {
        Some(label) => {
            spans.push(Span::styled(format!(" [{}] ", control.key()), Theme::key()));
            spans.push(Span::styled(label.clone(), Theme::text()));
        }
        None => {
            spans.push(Span::styled(format!(" [{}] ", control.key()), Theme::text_dim()));
            spans.extend(skeleton_spans(OPTION_PLACEHOLDER, ctx));
        }
    }
    View::line(Line::from(spans))
}
