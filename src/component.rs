//! UI component tree model
//!
//! A closed set of five node kinds, each with a typed property bag and
//! ordered children. Pure data: the engine builds these and `ui::tree`
//! renders them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The five renderable node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Text,
    Badge,
    Card,
    List,
    Chart,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Text,
        ComponentKind::Badge,
        ComponentKind::Card,
        ComponentKind::List,
        ComponentKind::Chart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Text => "text",
            ComponentKind::Badge => "badge",
            ComponentKind::Card => "card",
            ComponentKind::List => "list",
            ComponentKind::Chart => "chart",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity used for colouring cards and chart bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Med,
    Low,
}

impl From<crate::schema::RiskSeverity> for Severity {
    fn from(severity: crate::schema::RiskSeverity) -> Self {
        match severity {
            crate::schema::RiskSeverity::High => Severity::High,
            crate::schema::RiskSeverity::Med => Severity::Med,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextRole {
    #[default]
    Body,
    Headline,
    Caption,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextProps {
    pub content: String,
    #[serde(default)]
    pub role: TextRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Success,
    Warning,
    Danger,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BadgeProps {
    pub label: String,
    #[serde(default)]
    pub variant: BadgeVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardVariant {
    Danger,
    Warning,
    Success,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<CardVariant>,
}

impl CardProps {
    /// Severity wins over an explicit variant: high is danger, any other
    /// severity is a warning.
    pub fn visual_variant(&self) -> CardVariant {
        match (self.severity, self.variant) {
            (Some(Severity::High), _) => CardVariant::Danger,
            (Some(_), _) => CardVariant::Warning,
            (None, Some(variant)) => variant,
            (None, None) => CardVariant::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListProps {
    pub items: Vec<String>,
    #[serde(default)]
    pub ordered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub data: Vec<ChartPoint>,
}

impl ChartProps {
    /// Bar fractions in `0.0..=1.0`. The divisor never drops below 1 so an
    /// all-zero chart does not divide by zero.
    pub fn scaled(&self) -> Vec<f64> {
        let max = self
            .data
            .iter()
            .map(|p| p.value)
            .fold(f64::NEG_INFINITY, f64::max)
            .max(1.0);
        self.data
            .iter()
            .map(|p| (p.value / max).clamp(0.0, 1.0))
            .collect()
    }
}

/// Typed property bag; the variant is the node's kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComponentProps {
    Text(TextProps),
    Badge(BadgeProps),
    Card(CardProps),
    List(ListProps),
    Chart(ChartProps),
}

impl ComponentProps {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentProps::Text(_) => ComponentKind::Text,
            ComponentProps::Badge(_) => ComponentKind::Badge,
            ComponentProps::Card(_) => ComponentKind::Card,
            ComponentProps::List(_) => ComponentKind::List,
            ComponentProps::Chart(_) => ComponentKind::Chart,
        }
    }
}

/// One node of the rendering tree
#[derive(Debug, Clone, PartialEq)]
pub struct UiComponent {
    props: ComponentProps,
    children: Vec<UiComponent>,
}

impl UiComponent {
    pub fn new(props: ComponentProps) -> Self {
        Self {
            props,
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>, role: TextRole) -> Self {
        Self::new(ComponentProps::Text(TextProps {
            content: content.into(),
            role,
        }))
    }

    pub fn badge(label: impl Into<String>, variant: BadgeVariant) -> Self {
        Self::new(ComponentProps::Badge(BadgeProps {
            label: label.into(),
            variant,
        }))
    }

    pub fn card(props: CardProps) -> Self {
        Self::new(ComponentProps::Card(props))
    }

    pub fn list(items: Vec<String>, ordered: bool) -> Self {
        Self::new(ComponentProps::List(ListProps { items, ordered }))
    }

    pub fn chart(title: Option<String>, data: Vec<ChartPoint>) -> Self {
        Self::new(ComponentProps::Chart(ChartProps { title, data }))
    }

    pub fn with_children(mut self, children: Vec<UiComponent>) -> Self {
        self.children = children;
        self
    }

    pub fn kind(&self) -> ComponentKind {
        self.props.kind()
    }

    pub fn props(&self) -> &ComponentProps {
        &self.props
    }

    pub fn children(&self) -> &[UiComponent] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Visit this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a UiComponent)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[derive(Serialize)]
struct WireNode<'a> {
    kind: ComponentKind,
    properties: &'a ComponentProps,
    #[serde(skip_serializing_if = "no_children")]
    children: &'a [UiComponent],
}

fn no_children(children: &&[UiComponent]) -> bool {
    children.is_empty()
}

impl Serialize for UiComponent {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireNode {
            kind: self.kind(),
            properties: &self.props,
            children: &self.children,
        }
        .serialize(serializer)
    }
}

/// Errors raised while decoding an externally authored component tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    #[error("component node must be a JSON object")]
    NotAnObject,
    #[error("component node has no 'kind'")]
    MissingKind,
    #[error("unknown component kind '{0}'")]
    UnknownKind(String),
    #[error("invalid {kind} properties: {reason}")]
    InvalidProperties { kind: ComponentKind, reason: String },
    #[error("'children' must be an array")]
    InvalidChildren,
}

fn decode_props<T: serde::de::DeserializeOwned>(
    kind: ComponentKind,
    properties: &Value,
) -> Result<T, ComponentError> {
    serde_json::from_value(properties.clone()).map_err(|e| ComponentError::InvalidProperties {
        kind,
        reason: e.to_string(),
    })
}

/// Strictly decode one node `{kind, properties, children}`. Unknown kinds and
/// undeclared property fields are contract violations.
pub fn decode_node(value: &Value) -> Result<UiComponent, ComponentError> {
    let object = value.as_object().ok_or(ComponentError::NotAnObject)?;
    let name = object
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(ComponentError::MissingKind)?;
    let kind =
        ComponentKind::from_name(name).ok_or_else(|| ComponentError::UnknownKind(name.into()))?;

    let empty = Value::Object(Default::default());
    let properties = object.get("properties").unwrap_or(&empty);
    let props = match kind {
        ComponentKind::Text => ComponentProps::Text(decode_props(kind, properties)?),
        ComponentKind::Badge => ComponentProps::Badge(decode_props(kind, properties)?),
        ComponentKind::Card => ComponentProps::Card(decode_props(kind, properties)?),
        ComponentKind::List => ComponentProps::List(decode_props(kind, properties)?),
        ComponentKind::Chart => ComponentProps::Chart(decode_props(kind, properties)?),
    };

    let children = match object.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => decode_tree(items),
        Some(_) => return Err(ComponentError::InvalidChildren),
    };

    Ok(UiComponent { props, children })
}

/// Leniently decode a sibling list: a node that fails to decode is logged and
/// left out, and its siblings still decode.
pub fn decode_tree(nodes: &[Value]) -> Vec<UiComponent> {
    nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| match decode_node(node) {
            Ok(component) => Some(component),
            Err(err) => {
                tracing::warn!(index, error = %err, "dropping undecodable component node");
                None
            }
        })
        .collect()
}

/// Decode a whole document: either a single node or an array of nodes.
pub fn decode_document(value: &Value) -> Vec<UiComponent> {
    match value {
        Value::Array(nodes) => decode_tree(nodes),
        single => decode_tree(std::slice::from_ref(single)),
    }
}
