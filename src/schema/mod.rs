//! Analysis response schema
//!
//! The backend answers every scan with exactly one of four shapes, tagged by
//! the `type` field. Complete values live here; the in-flight shapes are in
//! [`partial`], and [`repair`] turns a truncated JSON prefix into something
//! the partial decoder can read.

pub mod partial;
pub mod repair;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use partial::{
    DeepPartial, PartialAnalysis, PartialDecision, PartialRisk, PartialRiskItem, PartialSafe,
    PartialUncertain,
};

/// The discriminant of an [`AnalysisResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Variant {
    Safe,
    Risk,
    Decision,
    Uncertain,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Safe,
        Variant::Risk,
        Variant::Decision,
        Variant::Uncertain,
    ];

    /// Wire tag, exactly as it appears in the `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Safe => "SAFE",
            Variant::Risk => "RISK",
            Variant::Decision => "DECISION",
            Variant::Uncertain => "UNCERTAIN",
        }
    }

    /// Parse a wire tag. Unknown or half-streamed tags return `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == tag)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a single risky ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskSeverity {
    High,
    Med,
}

impl RiskSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            RiskSeverity::High => "HIGH",
            RiskSeverity::Med => "MED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskItem {
    pub ingredient: String,
    pub severity: RiskSeverity,
    pub reason: String,
}

/// A complete, validated analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisResult {
    Safe {
        summary: String,
        #[serde(rename = "safeBadge")]
        safe_badge: bool,
    },
    Risk {
        headline: String,
        /// Ordered; the backend ranks items and that order is kept end to end
        #[serde(rename = "riskHierarchy")]
        risk_hierarchy: Vec<RiskItem>,
    },
    Decision {
        question: String,
        options: [String; 2],
    },
    Uncertain {
        #[serde(rename = "rawText")]
        raw_text: String,
    },
}

impl AnalysisResult {
    pub fn variant(&self) -> Variant {
        match self {
            AnalysisResult::Safe { .. } => Variant::Safe,
            AnalysisResult::Risk { .. } => Variant::Risk,
            AnalysisResult::Decision { .. } => Variant::Decision,
            AnalysisResult::Uncertain { .. } => Variant::Uncertain,
        }
    }
}

/// Dietary profile the scan is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserProfile {
    #[default]
    Diabetic,
    Vegan,
    Paleo,
}

impl UserProfile {
    pub const ALL: [UserProfile; 3] = [UserProfile::Diabetic, UserProfile::Vegan, UserProfile::Paleo];

    pub fn label(&self) -> &'static str {
        match self {
            UserProfile::Diabetic => "Diabetic",
            UserProfile::Vegan => "Vegan",
            UserProfile::Paleo => "Paleo",
        }
    }

    /// What the profile cares about, phrased for the reasoning log
    pub fn focus(&self) -> &'static str {
        match self {
            UserProfile::Diabetic => "sugars and fast carbohydrates",
            UserProfile::Vegan => "animal-derived ingredients",
            UserProfile::Paleo => "grains, legumes and processed additives",
        }
    }
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UserProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "unknown profile '{}' (expected one of: diabetic, vegan, paleo)",
                    wanted
                )
            })
    }
}

/// Errors raised while validating analysis data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("analysis type has not arrived yet")]
    PendingVariant,
    #[error("unrecognized analysis type '{0}'")]
    UnrecognizedVariant(String),
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("expected exactly 2 decision options, got {0}")]
    OptionCount(usize),
    #[error("invalid analysis JSON: {0}")]
    InvalidJson(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_tags_round_trip() {
        for variant in Variant::ALL {
            assert_eq!(Variant::from_tag(variant.as_str()), Some(variant));
        }
        assert_eq!(Variant::from_tag("RIS"), None);
        assert_eq!(Variant::from_tag("risk"), None);
    }

    #[test]
    fn test_decode_complete_risk() {
        let raw = r#"{
            "type": "RISK",
            "headline": "Contains added sugar",
            "riskHierarchy": [
                {"ingredient": "Maltodextrin", "severity": "high", "reason": "Spikes glucose"},
                {"ingredient": "Honey", "severity": "med", "reason": "Simple sugar"}
            ]
        }"#;
        let result: AnalysisResult = serde_json::from_str(raw).unwrap();
        match result {
            AnalysisResult::Risk {
                headline,
                risk_hierarchy,
            } => {
                assert_eq!(headline, "Contains added sugar");
                assert_eq!(risk_hierarchy.len(), 2);
                assert_eq!(risk_hierarchy[0].severity, RiskSeverity::High);
                assert_eq!(risk_hierarchy[1].ingredient, "Honey");
            }
            other => panic!("expected RISK, got {:?}", other),
        }
    }

    #[test]
    fn test_decision_requires_two_options() {
        let three = r#"{"type":"DECISION","question":"Q?","options":["A","B","C"]}"#;
        assert!(serde_json::from_str::<AnalysisResult>(three).is_err());

        let two = r#"{"type":"DECISION","question":"Q?","options":["A","B"]}"#;
        let result: AnalysisResult = serde_json::from_str(two).unwrap();
        assert_eq!(result.variant(), Variant::Decision);
    }

    #[test]
    fn test_profile_parse_is_case_insensitive() {
        assert_eq!("vegan".parse::<UserProfile>(), Ok(UserProfile::Vegan));
        assert_eq!(" PALEO ".parse::<UserProfile>(), Ok(UserProfile::Paleo));
        assert!("keto".parse::<UserProfile>().is_err());
    }

    #[test]
    fn test_safe_serializes_with_wire_names() {
        let result = AnalysisResult::Safe {
            summary: "Fine".into(),
            safe_badge: true,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "SAFE");
        assert_eq!(value["safeBadge"], true);
    }
}
