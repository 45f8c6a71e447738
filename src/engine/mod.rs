//! Generative UI engine
//!
//! Maps a complete analysis plus the user's profile to a list of component
//! nodes. All presentation policy lives here: when a risk list is long
//! enough to get a chart, how severities colour cards, how raw text is split.
//! Pure and deterministic; the same inputs always give the same tree.

use crate::component::{BadgeVariant, CardProps, CardVariant, ChartPoint, TextRole, UiComponent};
use crate::schema::{
    AnalysisResult, PartialAnalysis, RiskItem, RiskSeverity, SchemaError, UserProfile,
};
use serde::{Deserialize, Serialize};

/// Risk lists at least this long also get a chart
pub const DEFAULT_CHART_THRESHOLD: usize = 10;

/// How a risk item maps to a chart bar length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartValue {
    /// Every item counts 1; colour carries the severity
    #[default]
    Uniform,
    /// High counts 2, medium 1
    Weighted,
}

impl ChartValue {
    pub fn value_for(&self, severity: RiskSeverity) -> f64 {
        match (self, severity) {
            (ChartValue::Uniform, _) => 1.0,
            (ChartValue::Weighted, RiskSeverity::High) => 2.0,
            (ChartValue::Weighted, RiskSeverity::Med) => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnginePolicy {
    pub chart_threshold: usize,
    pub chart_value: ChartValue,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            chart_threshold: DEFAULT_CHART_THRESHOLD,
            chart_value: ChartValue::Uniform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("cannot build a view for analysis type '{0}'")]
    UnrecognizedVariant(String),
    #[error("analysis is incomplete: {0}")]
    Incomplete(#[source] SchemaError),
}

#[derive(Debug, Clone, Default)]
pub struct GenerativeEngine {
    policy: EnginePolicy,
}

impl GenerativeEngine {
    pub fn new(policy: EnginePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Build the component list for a complete analysis.
    pub fn generate(&self, result: &AnalysisResult, profile: UserProfile) -> Vec<UiComponent> {
        match result {
            AnalysisResult::Safe {
                summary,
                safe_badge,
            } => self.safe(summary, *safe_badge, profile),
            AnalysisResult::Risk {
                headline,
                risk_hierarchy,
            } => self.risk(headline, risk_hierarchy, profile),
            AnalysisResult::Decision { question, options } => self.decision(question, options),
            AnalysisResult::Uncertain { raw_text } => self.uncertain(raw_text, profile),
        }
    }

    /// Checked entry for streamed data: refuses snapshots whose type is
    /// unknown and snapshots that are still missing fields.
    pub fn generate_snapshot(
        &self,
        snapshot: &PartialAnalysis,
        profile: UserProfile,
    ) -> Result<Vec<UiComponent>, EngineError> {
        match snapshot.complete() {
            Ok(result) => Ok(self.generate(&result, profile)),
            Err(SchemaError::PendingVariant) => {
                Err(EngineError::UnrecognizedVariant("<pending>".to_string()))
            }
            Err(SchemaError::UnrecognizedVariant(tag)) => {
                Err(EngineError::UnrecognizedVariant(tag))
            }
            Err(other) => Err(EngineError::Incomplete(other)),
        }
    }

    fn safe(&self, summary: &str, safe_badge: bool, profile: UserProfile) -> Vec<UiComponent> {
        let badge = if safe_badge {
            UiComponent::badge(
                format!("SAFE · {}", profile.label().to_uppercase()),
                BadgeVariant::Success,
            )
        } else {
            UiComponent::badge(
                format!("NO FLAGS · {}", profile.label().to_uppercase()),
                BadgeVariant::Neutral,
            )
        };
        vec![badge, UiComponent::text(summary, TextRole::Body)]
    }

    fn risk(&self, headline: &str, items: &[RiskItem], profile: UserProfile) -> Vec<UiComponent> {
        let mut nodes = Vec::with_capacity(items.len() + 2);
        nodes.push(UiComponent::text(headline, TextRole::Headline));

        // A chart needs at least one bar, whatever the threshold
        if !items.is_empty() && items.len() >= self.policy.chart_threshold {
            let data = items
                .iter()
                .map(|item| ChartPoint {
                    label: item.ingredient.clone(),
                    value: self.policy.chart_value.value_for(item.severity),
                    severity: Some(item.severity.into()),
                })
                .collect();
            nodes.push(UiComponent::chart(
                Some(format!("{} risk overview", profile.label())),
                data,
            ));
        }

        nodes.extend(items.iter().map(|item| {
            UiComponent::card(CardProps {
                title: Some(item.ingredient.clone()),
                body: Some(item.reason.clone()),
                severity: Some(item.severity.into()),
                variant: None,
            })
        }));
        nodes
    }

    fn decision(&self, question: &str, options: &[String; 2]) -> Vec<UiComponent> {
        vec![
            UiComponent::text(question, TextRole::Headline),
            UiComponent::list(options.to_vec(), true),
        ]
    }

    fn uncertain(&self, raw_text: &str, profile: UserProfile) -> Vec<UiComponent> {
        let mut paragraphs: Vec<UiComponent> = raw_text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| UiComponent::text(p, TextRole::Body))
            .collect();
        if paragraphs.is_empty() {
            paragraphs.push(UiComponent::text(raw_text, TextRole::Body));
        }

        vec![UiComponent::card(CardProps {
            title: Some(format!("Not sure about this one ({})", profile.label())),
            body: None,
            severity: None,
            variant: Some(CardVariant::Neutral),
        })
        .with_children(paragraphs)]
    }
}
