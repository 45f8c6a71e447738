//! Recursive component tree renderer
//!
//! Every node is rendered inside its own fault boundary: a node whose view
//! fails (an error or a panic) is replaced by a one-line indicator and the
//! rest of the tree renders as usual. Nodes carry a motion tag keyed by
//! their path so entrances stagger by sibling index.

use crate::component::{ComponentKind, UiComponent};
use crate::motion::{stagger_delay, Spring};
use crate::ui::leaf::{child_inset, leaf_view, RenderContext, RenderFault};
use crate::ui::theme::Theme;
use crate::ui::view::{Animator, View};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Stateless render of a sibling list.
pub fn render_tree(nodes: &[UiComponent], ctx: &RenderContext) -> View {
    View::group(render_siblings(nodes, ctx, "node"))
}

fn render_siblings(nodes: &[UiComponent], ctx: &RenderContext, parent: &str) -> Vec<View> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| render_node(node, ctx, format!("{}/{}", parent, index), index))
        .collect()
}

fn render_node(node: &UiComponent, ctx: &RenderContext, key: String, index: usize) -> View {
    let kind = node.kind();
    let view = fault_boundary(kind, || {
        let nested_ctx = ctx.inset(child_inset(kind));
        let children = render_siblings(node.children(), &nested_ctx, &key);
        leaf_view(kind)(node, children, ctx)
    });
    view.with_motion(key, stagger_delay(index, ctx.stagger))
}

/// Run one node's view construction, containing errors and panics.
pub fn fault_boundary<F>(kind: ComponentKind, build: F) -> View
where
    F: FnOnce() -> Result<View, RenderFault>,
{
    let fault = match panic::catch_unwind(AssertUnwindSafe(build)) {
        Ok(Ok(view)) => return view,
        Ok(Err(fault)) => fault,
        Err(payload) => RenderFault::Panicked(panic_detail(payload.as_ref())),
    };
    tracing::error!(%kind, error = %fault, "component failed to render");
    fault_indicator(kind)
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

pub fn fault_indicator(kind: ComponentKind) -> View {
    View::line(Line::from(vec![
        Span::styled(format!("{} ", Theme::WARNING_MARK), Style::default().fg(Theme::YELLOW)),
        Span::styled(format!("{} failed to render", kind), Theme::text_muted()),
    ]))
}

/// Stateful renderer that animates a tree across frames
#[derive(Debug, Clone)]
pub struct TreeRenderer {
    ctx: RenderContext,
    animator: Animator,
}

impl Default for TreeRenderer {
    fn default() -> Self {
        Self::new(RenderContext::default(), Spring::default(), crate::motion::DEFAULT_EXIT)
    }
}

impl TreeRenderer {
    pub fn new(ctx: RenderContext, spring: Spring, exit: Duration) -> Self {
        Self {
            ctx,
            animator: Animator::new(spring, exit),
        }
    }

    pub fn set_width(&mut self, width: u16) {
        self.ctx.width = width;
    }

    pub fn render(&mut self, nodes: &[UiComponent], now: Instant) -> View {
        let view = render_tree(nodes, &self.ctx);
        self.animator.frame(view, now)
    }

    /// True while nodes from a previous tree are still animating out.
    pub fn has_exits(&self, now: Instant) -> bool {
        self.animator.has_exits(now)
    }

    pub fn clear(&mut self) {
        self.animator.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{decode_tree, CardProps, TextRole};
    use crate::ui::leaf::DEFAULT_WIDTH;
    use crate::engine::GenerativeEngine;
    use crate::schema::{AnalysisResult, RiskItem, RiskSeverity, UserProfile};
    use serde_json::json;

    fn wide() -> RenderContext {
        RenderContext::new(200, Duration::from_millis(50))
    }

    #[test]
    fn test_faulty_node_does_not_take_down_siblings() {
        let tree = vec![
            UiComponent::text("before", TextRole::Body),
            UiComponent::chart(Some("empty".into()), Vec::new()),
            UiComponent::text("after", TextRole::Body),
        ];
        let text = render_tree(&tree, &wide()).plain_text();
        assert!(text.contains("before"));
        assert!(text.contains("chart failed to render"));
        assert!(text.contains("after"));
    }

    #[test]
    fn test_fault_inside_card_keeps_the_card() {
        let tree = vec![UiComponent::card(CardProps {
            title: Some("Outer".into()),
            ..CardProps::default()
        })
        .with_children(vec![
            UiComponent::chart(None, Vec::new()),
            UiComponent::text("still here", TextRole::Body),
        ])];
        let text = render_tree(&tree, &wide()).plain_text();
        assert!(text.contains("Outer"));
        assert!(text.contains("│ ⚠ chart failed to render"));
        assert!(text.contains("│ still here"));
    }

    #[test]
    fn test_panicking_view_is_contained() {
        let view = fault_boundary(ComponentKind::List, || panic!("boom"));
        assert_eq!(view.plain_text(), "⚠ list failed to render");
    }

    #[test]
    fn test_unknown_kinds_are_dropped_before_rendering() {
        let nodes = vec![
            json!({"kind": "text", "properties": {"content": "kept"}}),
            json!({"kind": "video", "properties": {"src": "x"}}),
        ];
        let tree = decode_tree(&nodes);
        let view = render_tree(&tree, &wide());
        assert_eq!(view.children.len(), 1);
        assert!(view.plain_text().contains("kept"));
    }

    #[test]
    fn test_motion_keys_follow_tree_paths() {
        let tree = vec![
            UiComponent::text("a", TextRole::Body),
            UiComponent::card(CardProps::default())
                .with_children(vec![UiComponent::text("b", TextRole::Body)]),
        ];
        let view = render_tree(&tree, &wide());
        let first = view.children[0].motion.as_ref().unwrap();
        let second = view.children[1].motion.as_ref().unwrap();
        assert_eq!(first.key, "node/0");
        assert_eq!(first.delay, Duration::ZERO);
        assert_eq!(second.key, "node/1");
        assert_eq!(second.delay, Duration::from_millis(50));

        let nested = view.children[1]
            .children
            .iter()
            .find_map(|child| child.motion.as_ref())
            .unwrap();
        assert_eq!(nested.key, "node/1/0");
        assert_eq!(nested.delay, Duration::ZERO);
    }

    /// Frame glyphs dropped and whitespace collapsed, so wrapped rows read
    /// as one run of text
    fn flowed(text: &str) -> String {
        text.replace(['│', '╭', '╮', '╰', '╯', '─'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_long_card_title_is_wrapped_not_truncated() {
        let title = "Partially hydrogenated soybean and cottonseed oil blend with mono and diglycerides";
        let tree = vec![UiComponent::card(CardProps {
            title: Some(title.into()),
            body: Some("Trans fats".into()),
            severity: Some(crate::component::Severity::High),
            variant: None,
        })];
        let ctx = RenderContext::new(DEFAULT_WIDTH, Duration::ZERO);
        let rendered = render_tree(&tree, &ctx).plain_text();
        assert!(!rendered.contains('…'), "{}", rendered);
        assert!(flowed(&rendered).contains(title), "{}", rendered);

        let top = rendered.lines().next().unwrap();
        assert!(top.contains("HIGH"));
        assert!(!top.contains("Partially"));
    }

    #[test]
    fn test_engine_output_round_trips_all_leaf_content() {
        let items: Vec<RiskItem> = (0..12)
            .map(|i| RiskItem {
                ingredient: format!("Additive {}", i),
                severity: if i % 3 == 0 {
                    RiskSeverity::High
                } else {
                    RiskSeverity::Med
                },
                reason: format!("Reason number {}", i),
            })
            .collect();
        let results = vec![
            AnalysisResult::Safe {
                summary: "All clear".into(),
                safe_badge: true,
            },
            AnalysisResult::Risk {
                headline: "Watch out".into(),
                risk_hierarchy: items.clone(),
            },
            AnalysisResult::Decision {
                question: "Q?".into(),
                options: ["A".into(), "B".into()],
            },
            AnalysisResult::Uncertain {
                raw_text: "Para one.\n\nPara two.".into(),
            },
            AnalysisResult::Risk {
                headline: "One long name".into(),
                risk_hierarchy: vec![RiskItem {
                    ingredient:
                        "Partially hydrogenated soybean and cottonseed oil blend with mono and diglycerides"
                            .into(),
                    severity: RiskSeverity::High,
                    reason: "Trans fats".into(),
                }],
            },
        ];

        let engine = GenerativeEngine::default();
        let narrow = RenderContext::new(DEFAULT_WIDTH, Duration::from_millis(50));
        for (result, ctx) in results
            .iter()
            .flat_map(|result| [(result, wide()), (result, narrow)])
        {
            let tree = engine.generate(result, UserProfile::Diabetic);
            let rendered = render_tree(&tree, &ctx).plain_text();
            assert!(!rendered.contains("failed to render"), "{}", rendered);
            let text = flowed(&rendered);

            let mut expected: Vec<String> = Vec::new();
            for node in &tree {
                node.walk(&mut |n| match n.props() {
                    crate::component::ComponentProps::Text(p) => expected.push(p.content.clone()),
                    crate::component::ComponentProps::Badge(p) => expected.push(p.label.clone()),
                    crate::component::ComponentProps::Card(p) => {
                        expected.extend(p.title.clone());
                        expected.extend(p.body.clone());
                    }
                    crate::component::ComponentProps::List(p) => {
                        expected.extend(p.items.iter().cloned())
                    }
                    crate::component::ComponentProps::Chart(p) => {
                        for point in &p.data {
                            expected.push(point.label.clone());
                        }
                    }
                });
            }
            for piece in expected {
                let piece = flowed(&piece);
                assert!(text.contains(&piece), "missing {:?} in\n{}", piece, rendered);
            }
        }
    }

    #[test]
    fn test_tree_renderer_exits_previous_tree() {
        let mut renderer = TreeRenderer::new(wide(), Spring::default(), Duration::from_millis(200));
        let start = Instant::now();
        let tree = vec![UiComponent::text("old", TextRole::Body)];
        renderer.render(&tree, start);
        renderer.render(&tree, start + Duration::from_secs(2));

        let cleared = start + Duration::from_secs(3);
        let view = renderer.render(&[], cleared);
        assert!(view.plain_text().contains("old"));
        assert!(renderer.has_exits(cleared));

        let done = cleared + Duration::from_millis(200);
        let view = renderer.render(&[], done);
        assert!(view.plain_text().is_empty());
        assert!(!renderer.has_exits(done));
    }
}
