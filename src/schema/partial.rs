//! In-flight ("deep partial") analysis shapes
//!
//! While a response streams, any field at any depth may be missing, including
//! the `type` tag itself. Every field here is an `Option`, sequences are
//! `Option<Vec<_>>` of partial elements, and decoding is lenient: a value of
//! the wrong JSON type (often a half-streamed enum string) reads as absent
//! instead of failing the snapshot.

use super::{AnalysisResult, RiskItem, RiskSeverity, SchemaError, Variant};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A shape whose fields may all be absent, and which can be checked for
/// completeness once the stream is done.
pub trait DeepPartial: Default {
    type Complete;

    /// Returns the complete value, or the first missing field.
    fn complete(&self) -> Result<Self::Complete, SchemaError>;
}

impl<T: DeepPartial> DeepPartial for Vec<T> {
    type Complete = Vec<T::Complete>;

    fn complete(&self) -> Result<Self::Complete, SchemaError> {
        self.iter()
            .enumerate()
            .map(|(i, item)| item.complete().map_err(|e| nested(e, &format!("[{}]", i))))
            .collect()
    }
}

fn required<T: Clone>(field: &Option<T>, name: &str) -> Result<T, SchemaError> {
    field
        .clone()
        .ok_or_else(|| SchemaError::MissingField(name.to_string()))
}

fn nested(err: SchemaError, prefix: &str) -> SchemaError {
    match err {
        SchemaError::MissingField(field) if field.starts_with('[') => {
            SchemaError::MissingField(format!("{}{}", prefix, field))
        }
        SchemaError::MissingField(field) => {
            SchemaError::MissingField(format!("{}.{}", prefix, field))
        }
        other => other,
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Sequence decoder that keeps element positions stable: an element that
/// cannot be read yet becomes its default instead of being dropped.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialSafe {
    #[serde(deserialize_with = "lenient")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub safe_badge: Option<bool>,
}

impl DeepPartial for PartialSafe {
    type Complete = AnalysisResult;

    fn complete(&self) -> Result<AnalysisResult, SchemaError> {
        Ok(AnalysisResult::Safe {
            summary: required(&self.summary, "summary")?,
            safe_badge: required(&self.safe_badge, "safeBadge")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialRiskItem {
    #[serde(deserialize_with = "lenient")]
    pub ingredient: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub severity: Option<RiskSeverity>,
    #[serde(deserialize_with = "lenient")]
    pub reason: Option<String>,
}

impl DeepPartial for PartialRiskItem {
    type Complete = RiskItem;

    fn complete(&self) -> Result<RiskItem, SchemaError> {
        Ok(RiskItem {
            ingredient: required(&self.ingredient, "ingredient")?,
            severity: required(&self.severity, "severity")?,
            reason: required(&self.reason, "reason")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialRisk {
    #[serde(deserialize_with = "lenient")]
    pub headline: Option<String>,
    #[serde(deserialize_with = "lenient_seq")]
    pub risk_hierarchy: Option<Vec<PartialRiskItem>>,
}

impl PartialRisk {
    /// Items received so far; an absent list reads as empty.
    pub fn items(&self) -> &[PartialRiskItem] {
        self.risk_hierarchy.as_deref().unwrap_or(&[])
    }
}

impl DeepPartial for PartialRisk {
    type Complete = AnalysisResult;

    fn complete(&self) -> Result<AnalysisResult, SchemaError> {
        let headline = required(&self.headline, "headline")?;
        let items = required(&self.risk_hierarchy, "riskHierarchy")?;
        let risk_hierarchy = items
            .complete()
            .map_err(|e| nested(e, "riskHierarchy"))?;
        Ok(AnalysisResult::Risk {
            headline,
            risk_hierarchy,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialDecision {
    #[serde(deserialize_with = "lenient")]
    pub question: Option<String>,
    #[serde(deserialize_with = "lenient_seq")]
    pub options: Option<Vec<Option<String>>>,
}

impl PartialDecision {
    /// Text of option `index`, once it has arrived and is non-empty.
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options
            .as_ref()
            .and_then(|options| options.get(index))
            .and_then(|option| option.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

impl DeepPartial for PartialDecision {
    type Complete = AnalysisResult;

    fn complete(&self) -> Result<AnalysisResult, SchemaError> {
        let question = required(&self.question, "question")?;
        let options = required(&self.options, "options")?;
        if options.len() != 2 {
            return Err(SchemaError::OptionCount(options.len()));
        }
        let first = required(&options[0], "options[0]")?;
        let second = required(&options[1], "options[1]")?;
        Ok(AnalysisResult::Decision {
            question,
            options: [first, second],
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialUncertain {
    #[serde(deserialize_with = "lenient")]
    pub raw_text: Option<String>,
}

impl DeepPartial for PartialUncertain {
    type Complete = AnalysisResult;

    fn complete(&self) -> Result<AnalysisResult, SchemaError> {
        Ok(AnalysisResult::Uncertain {
            raw_text: required(&self.raw_text, "rawText")?,
        })
    }
}

/// One streamed snapshot of an analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PartialAnalysis {
    /// No `type` yet
    #[default]
    Pending,
    Safe(PartialSafe),
    Risk(PartialRisk),
    Decision(PartialDecision),
    Uncertain(PartialUncertain),
    /// A `type` that is not one of the four known tags (often a tag that is
    /// still streaming in, e.g. `"RIS"`)
    Unrecognized(String),
}

impl PartialAnalysis {
    /// Decode a (possibly repaired) JSON snapshot. Never fails: anything that
    /// is not an object with a string `type` reads as `Pending` or
    /// `Unrecognized`.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::Pending;
        };
        let tag = match object.get("type") {
            None | Some(Value::Null) => return Self::Pending,
            Some(Value::String(tag)) => tag.as_str(),
            Some(other) => return Self::Unrecognized(other.to_string()),
        };
        let Some(variant) = Variant::from_tag(tag) else {
            return Self::Unrecognized(tag.to_string());
        };

        match variant {
            Variant::Safe => Self::Safe(decode_payload(value)),
            Variant::Risk => Self::Risk(decode_payload(value)),
            Variant::Decision => Self::Decision(decode_payload(value)),
            Variant::Uncertain => Self::Uncertain(decode_payload(value)),
        }
    }

    /// Decode a JSON document that is expected to be well formed.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;
        Ok(Self::from_value(&value))
    }

    /// The committed variant, if the tag is known.
    pub fn variant(&self) -> Option<Variant> {
        match self {
            PartialAnalysis::Safe(_) => Some(Variant::Safe),
            PartialAnalysis::Risk(_) => Some(Variant::Risk),
            PartialAnalysis::Decision(_) => Some(Variant::Decision),
            PartialAnalysis::Uncertain(_) => Some(Variant::Uncertain),
            PartialAnalysis::Pending | PartialAnalysis::Unrecognized(_) => None,
        }
    }

    /// Validate the snapshot into a complete result.
    pub fn complete(&self) -> Result<AnalysisResult, SchemaError> {
        match self {
            PartialAnalysis::Pending => Err(SchemaError::PendingVariant),
            PartialAnalysis::Unrecognized(tag) => {
                Err(SchemaError::UnrecognizedVariant(tag.clone()))
            }
            PartialAnalysis::Safe(safe) => safe.complete(),
            PartialAnalysis::Risk(risk) => risk.complete(),
            PartialAnalysis::Decision(decision) => decision.complete(),
            PartialAnalysis::Uncertain(uncertain) => uncertain.complete(),
        }
    }
}

impl From<&AnalysisResult> for PartialAnalysis {
    fn from(result: &AnalysisResult) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::from_value(&value),
            Err(_) => Self::Pending,
        }
    }
}

fn decode_payload<T: DeserializeOwned + Default>(value: &Value) -> T {
    match T::deserialize(value) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(error = %err, "partial payload unreadable; treating as empty");
            T::default()
        }
    }
}
