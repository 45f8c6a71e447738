use super::*;
use crate::schema::{PartialDecision, PartialRisk, PartialRiskItem, PartialSafe, PartialUncertain, RiskSeverity};
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn ctx() -> PartialContext<'static> {
    PartialContext::new(UserProfile::Diabetic, 64)
}

fn render(value: &Value, ctx: &PartialContext) -> String {
    partial_view(&PartialAnalysis::from_value(value), ctx).plain_text()
}

/// Readable words, ignoring skeleton blocks, borders and spinners.
fn words(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .map(|token| token.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect()
}

fn assert_grows(snapshots: &[Value]) {
    let ctx = ctx();
    let mut previous = BTreeSet::new();
    for snapshot in snapshots {
        let current = words(&render(snapshot, &ctx));
        let lost: Vec<_> = previous.difference(&current).collect();
        assert!(lost.is_empty(), "lost {:?} at {}", lost, snapshot);
        previous = current;
    }
}

#[test]
fn test_bare_risk_tag_renders_skeletons_not_zero_items() {
    let value = json!({"type": "RISK"});
    for ctx in [ctx(), ctx().finished()] {
        let text = render(&value, &ctx);
        assert!(text.contains(Theme::SKELETON_BLOCK));
        assert!(text.contains("HIGH RISK"));
        assert!(text.contains("MEDIUM RISK"));
        assert!(!text.contains("0 items"));
    }
}

#[test]
fn test_empty_risk_list_keeps_both_skeletons_after_completion() {
    let value = json!({"type": "RISK", "headline": "Nothing listed", "riskHierarchy": []});
    let text = render(&value, &ctx().finished());
    assert!(text.contains("Nothing listed"));
    assert!(text.contains("HIGH RISK"));
    assert!(text.contains("MEDIUM RISK"));
    assert!(text.contains(Theme::SKELETON_BLOCK));
}

#[test]
fn test_risk_content_only_grows() {
    assert_grows(&[
        json!({"type": "RISK"}),
        json!({"type": "RISK", "headline": "Careful"}),
        json!({"type": "RISK", "headline": "Careful", "riskHierarchy": [{"ingredient": "Sugar"}]}),
        json!({"type": "RISK", "headline": "Careful", "riskHierarchy": [
            {"ingredient": "Sugar", "severity": "high"}
        ]}),
        json!({"type": "RISK", "headline": "Careful", "riskHierarchy": [
            {"ingredient": "Sugar", "severity": "high", "reason": "Raises glucose"}
        ]}),
        json!({"type": "RISK", "headline": "Careful", "riskHierarchy": [
            {"ingredient": "Sugar", "severity": "high", "reason": "Raises glucose"},
            {"ingredient": "Starch", "severity": "med"}
        ]}),
    ]);
}

#[test]
fn test_decision_content_only_grows() {
    assert_grows(&[
        json!({"type": "DECISION"}),
        json!({"type": "DECISION", "question": "Which snack?"}),
        json!({"type": "DECISION", "question": "Which snack?", "options": ["Almonds"]}),
        json!({"type": "DECISION", "question": "Which snack?", "options": ["Almonds", "Grapes"]}),
    ]);
}

#[test]
fn test_safe_and_uncertain_content_only_grow() {
    assert_grows(&[
        json!({"type": "SAFE"}),
        json!({"type": "SAFE", "safeBadge": true}),
        json!({"type": "SAFE", "safeBadge": true, "summary": "Plain oats"}),
    ]);
    assert_grows(&[
        json!({"type": "UNCERTAIN"}),
        json!({"type": "UNCERTAIN", "rawText": "Label is blurry"}),
    ]);
}

#[test]
fn test_views_are_total_over_field_combinations() {
    let text = |present: bool, s: &str| present.then(|| s.to_string());
    let contexts = [ctx(), ctx().finished(), PartialContext::new(UserProfile::Vegan, 0)];

    for mask in 0..4u8 {
        let safe = PartialSafe {
            summary: text(mask & 1 != 0, "ok"),
            safe_badge: (mask & 2 != 0).then_some(false),
        };
        let uncertain = PartialUncertain {
            raw_text: text(mask & 1 != 0, ""),
        };
        for ctx in &contexts {
            assert!(safe::view(&safe, ctx).height() > 0);
            assert!(uncertain::view(&uncertain, ctx).height() > 0);
        }
    }

    for mask in 0..32u8 {
        let item = PartialRiskItem {
            ingredient: text(mask & 1 != 0, "Whey"),
            severity: (mask & 2 != 0).then_some(RiskSeverity::Med),
            reason: text(mask & 4 != 0, "dairy"),
        };
        let risk = PartialRisk {
            headline: text(mask & 8 != 0, "Heads up"),
            risk_hierarchy: (mask & 16 != 0).then(|| vec![item, PartialRiskItem::default()]),
        };
        let decision = PartialDecision {
            question: text(mask & 1 != 0, "Pick"),
            options: (mask & 2 != 0).then(|| vec![text(mask & 4 != 0, "A"), None, text(true, "C")]),
        };
        for ctx in &contexts {
            assert!(risk::view(&risk, ctx).height() > 0);
            assert!(decision::view(&decision, ctx).height() > 0);
        }
    }
}

#[test]
fn test_option_controls_disabled_until_text_arrives() {
    let decision = PartialDecision {
        question: Some("Q?".into()),
        options: Some(vec![Some("Oat milk".into()), Some("  ".into())]),
    };
    let [first, second] = option_controls(&decision);
    assert!(first.enabled());
    assert_eq!(first.label.as_deref(), Some("Oat milk"));
    assert_eq!(first.key(), '1');
    assert!(!second.enabled());
    assert_eq!(second.key(), '2');

    let none = option_controls(&PartialDecision::default());
    assert!(none.iter().all(|control| !control.enabled()));
}

#[test]
fn test_pending_and_unrecognized_show_thinking_with_reasoning() {
    let reasoning = vec!["Reading the label".to_string(), "Weighing the risks".to_string()];
    let ctx = PartialContext {
        reasoning: &reasoning,
        ..ctx()
    };
    for snapshot in [PartialAnalysis::Pending, PartialAnalysis::Unrecognized("RIS".into())] {
        let text = partial_view(&snapshot, &ctx).plain_text();
        assert!(text.contains("Thinking"));
        assert!(text.contains("Diabetic"));
        assert!(text.contains("Reading the label"));
        assert!(text.contains("Weighing the risks"));
    }
}

#[test]
fn test_safe_badge_placeholder_then_chip() {
    let pending = render(&json!({"type": "SAFE"}), &ctx());
    assert!(pending.contains(Theme::BADGE_OPEN));
    assert!(pending.contains(Theme::SKELETON_BLOCK));

    let flagged = render(&json!({"type": "SAFE", "safeBadge": true, "summary": "Fine"}), &ctx());
    assert!(flagged.contains("SAFE · DIABETIC"));
    assert!(!flagged.contains(Theme::SKELETON_BLOCK));
}
