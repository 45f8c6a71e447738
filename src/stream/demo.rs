//! Canned analyses for the replay source
//!
//! Picked from the scan input so each response shape can be tried without a
//! model behind the stream.

use super::ScanInput;
use crate::schema::{UserProfile, Variant};
use serde_json::json;

const DECISION_KEYWORDS: &[&str] = &["latte", "milk", "swap", "choose", "or "];
const UNCERTAIN_KEYWORDS: &[&str] = &["blur", "torn", "unknown", "???"];
const SAFE_KEYWORDS: &[&str] = &["water", "apple", "spinach", "safe", "plain"];

/// Which canned response a scan input maps to. Anything unrecognised gets
/// the RISK demo, which exercises the most of the view.
pub fn variant_for(input: &ScanInput) -> Variant {
    let text = input.describe().to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));
    if matches(UNCERTAIN_KEYWORDS) {
        Variant::Uncertain
    } else if matches(DECISION_KEYWORDS) {
        Variant::Decision
    } else if matches(SAFE_KEYWORDS) {
        Variant::Safe
    } else {
        Variant::Risk
    }
}

/// The JSON document the replay source streams for this input, wrapped in
/// a markdown fence the way models usually answer.
pub fn document_for(input: &ScanInput, profile: UserProfile) -> String {
    let body = document(variant_for(input), profile);
    format!("```json\n{}\n```", body)
}

pub fn document(variant: Variant, profile: UserProfile) -> String {
    let value = match variant {
        Variant::Safe => json!({
            "type": "SAFE",
            "summary": format!(
                "Nothing on this label conflicts with a {} diet. No {} were found.",
                profile.label().to_lowercase(),
                profile.focus()
            ),
            "safeBadge": true
        }),
        Variant::Risk => json!({
            "type": "RISK",
            "headline": "Several ingredients work against your goals",
            "riskHierarchy": [
                {"ingredient": "High fructose corn syrup", "severity": "high", "reason": "Rapid blood sugar spike; first ingredient by weight."},
                {"ingredient": "Caramel colour", "severity": "med", "reason": "Processed additive with no nutritional value."},
                {"ingredient": "Sucrose", "severity": "high", "reason": "Added sugar on top of the syrup."},
                {"ingredient": "Phosphoric acid", "severity": "med", "reason": "Linked to lower bone density at high intake."},
                {"ingredient": "Maltodextrin", "severity": "high", "reason": "Higher glycaemic index than table sugar."},
                {"ingredient": "Natural flavours", "severity": "med", "reason": "Source is not disclosed and may be animal-derived."},
                {"ingredient": "Dextrose", "severity": "high", "reason": "Pure glucose, absorbed almost immediately."},
                {"ingredient": "Sodium benzoate", "severity": "med", "reason": "Preservative that can form benzene with vitamin C."},
                {"ingredient": "Caffeine", "severity": "med", "reason": "Can raise blood sugar in some people."},
                {"ingredient": "Aspartame", "severity": "high", "reason": "Sweetener that may affect insulin response."},
                {"ingredient": "Citric acid", "severity": "med", "reason": "Usually produced by fermentation on corn."}
            ]
        }),
        Variant::Decision => json!({
            "type": "DECISION",
            "question": format!("This latte can be adapted for a {} diet. Which would you prefer?", profile.label().to_lowercase()),
            "options": ["Swap to unsweetened oat milk", "Keep it as is, half size"]
        }),
        Variant::Uncertain => json!({
            "type": "UNCERTAIN",
            "rawText": "The ingredient list is partly cut off at the fold.\n\nI can read \"wheat flour, sugar, palm oil\" but the rest is illegible.\n\nTry another photo with the whole label flat and in focus."
        }),
    };
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}
