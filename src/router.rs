//! Type router
//!
//! Decides, per scan, which rendering path is live. The first known `type`
//! tag commits the scan to that variant; a later snapshot with a different
//! known tag is refused so the view never flips shape mid-stream.

use crate::schema::{PartialAnalysis, Variant};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RouteState {
    /// No tag yet
    #[default]
    Pending,
    Streaming(Variant),
    /// A tag we cannot render (yet); shown as the thinking placeholder
    Unrecognized(String),
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("analysis type changed from {from} to {to} mid-stream")]
    VariantChanged { from: Variant, to: Variant },
}

/// What the main panel should draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePath {
    Thinking,
    Partial(Variant),
    Tree,
}

#[derive(Debug, Clone, Default)]
pub struct TypeRouter {
    state: RouteState,
    committed: Option<Variant>,
}

impl TypeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RouteState {
        &self.state
    }

    pub fn committed(&self) -> Option<Variant> {
        self.committed
    }

    pub fn is_terminal(&self) -> bool {
        self.state == RouteState::Finished
    }

    /// Route a new snapshot. Once finished, observations are ignored and the
    /// terminal state is returned unchanged.
    pub fn observe(&mut self, snapshot: &PartialAnalysis) -> Result<RouteState, RouteError> {
        if self.is_terminal() {
            return Ok(RouteState::Finished);
        }

        let next = match (self.committed, snapshot) {
            (Some(from), snapshot) if snapshot.variant().is_some_and(|to| to != from) => {
                let to = snapshot.variant().unwrap_or(from);
                return Err(RouteError::VariantChanged { from, to });
            }
            // A committed scan stays on its variant even if a later snapshot
            // lost the tag
            (Some(variant), _) => RouteState::Streaming(variant),
            (None, PartialAnalysis::Pending) => RouteState::Pending,
            (None, PartialAnalysis::Unrecognized(tag)) => RouteState::Unrecognized(tag.clone()),
            (None, known) => match known.variant() {
                Some(variant) => {
                    self.committed = Some(variant);
                    RouteState::Streaming(variant)
                }
                None => RouteState::Pending,
            },
        };

        self.state = next.clone();
        Ok(next)
    }

    pub fn finish(&mut self) {
        self.state = RouteState::Finished;
    }

    /// The path to draw, given whether a complete tree has been generated.
    pub fn active_path(&self, has_tree: bool) -> ActivePath {
        match (&self.state, self.committed) {
            (RouteState::Finished, _) if has_tree => ActivePath::Tree,
            (_, Some(variant)) => ActivePath::Partial(variant),
            _ => ActivePath::Thinking,
        }
    }
}
