//! # arbiter-types: Core types for `Arbiter`
//!
//! This crate contains the wire data model shared across the `Arbiter` system:
//! - Attribute values ([`AttributeValue`], [`Attributes`])
//! - Stored attributes ([`Attribute`], [`AttributeInDb`])
//! - Entities ([`EntityType`], [`Entity`], [`EntityCreate`], [`EntityUpdate`])
//! - Decision requests ([`EntityCheck`], [`CheckRequest`], [`CheckResponse`])
//! - Temporal types ([`Timestamp`], [`now_monotonic`])
//! - Identifiers ([`generate_uri`])
//!
//! Every type here serializes to the JSON shapes spoken by the decision
//! service, so the same structs are used by the in-process engine and the
//! HTTP client.

use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt::{Debug, Display},
    str::FromStr,
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Action assumed when a check request does not name one.
pub const DEFAULT_ACTION: &str = "access";

// ============================================================================
// Validation
// ============================================================================

/// A locally detectable problem with a request or entity shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Attribute Values
// ============================================================================

/// A dynamically typed attribute value.
///
/// On the wire this is plain JSON: `"admin"`, `3`, `true`, `["a", "b"]`.
/// Integral numbers serialize without a fractional part so that values
/// written as `3` read back as `3`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns the canonical text form of a scalar value.
    ///
    /// Lists have no text form and return `None`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Number(n) => Some(Cow::Owned(format_number(*n))),
            Self::Bool(true) => Some(Cow::Borrowed("true")),
            Self::Bool(false) => Some(Cow::Borrowed("false")),
            Self::List(_) => None,
        }
    }

    /// Returns the value as a finite decimal number, if it is one.
    ///
    /// Strings are parsed after trimming whitespace. Booleans and lists
    /// are never numbers.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Self::Number(n) => *n,
            Self::String(s) => s.trim().parse::<f64>().ok()?,
            Self::Bool(_) | Self::List(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Returns the list items if this is a list value.
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Parses a command-line style literal.
    ///
    /// JSON scalars and arrays (`42`, `true`, `["a","b"]`) keep their type;
    /// anything else is taken verbatim as a string.
    pub fn parse_literal(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == "true" {
            return Self::Bool(true);
        }
        if trimmed == "false" {
            return Self::Bool(false);
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Self::Number(n);
            }
        }
        if let Some(inner) = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let items = inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Self::parse_literal(item.trim_matches('"')))
                .collect();
            return Self::List(items);
        }
        Self::String(raw.to_string())
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::List(items) => items.serialize(serializer),
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            scalar => match scalar.as_text() {
                Some(text) => write!(f, "{text}"),
                None => Ok(()),
            },
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Integral values within the exactly representable range of `f64`.
fn integral(n: f64) -> Option<i64> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    (n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT).then_some(n as i64)
}

fn format_number(n: f64) -> String {
    match integral(n) {
        Some(i) => i.to_string(),
        None => n.to_string(),
    }
}

/// An entity's attribute map. Keys are unique and iterate in sorted order.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Builds an [`Attributes`] map from key/value pairs.
///
/// Later pairs replace earlier ones with the same key.
pub fn attributes<K, V, I>(pairs: I) -> Attributes
where
    K: Into<String>,
    V: Into<AttributeValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Serde helper accepting attributes either as a JSON object or as a list of
/// `{"key": ..., "value": ...}` objects. Duplicate keys in list form are rejected.
mod attributes_wire {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    use super::{Attribute, Attributes};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Map(Attributes),
        List(Vec<Attribute>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Attributes, D::Error> {
        match Wire::deserialize(deserializer)? {
            Wire::Map(map) => Ok(map),
            Wire::List(list) => {
                let mut map = Attributes::new();
                for (position, attribute) in list.into_iter().enumerate() {
                    if map.contains_key(&attribute.key) {
                        return Err(D::Error::custom(format!(
                            "duplicate attribute key '{}' at position {position}",
                            attribute.key
                        )));
                    }
                    map.insert(attribute.key, attribute.value);
                }
                Ok(map)
            }
        }
    }
}

// ============================================================================
// Timestamp
// ============================================================================

/// Wall-clock UTC timestamp used for attribute and entity bookkeeping.
pub type Timestamp = DateTime<Utc>;

/// Creates a timestamp ensuring monotonicity: `max(now, last + 1µs)`.
///
/// Stored entities carry `registered_at`/`updated_at` pairs that must never
/// go backwards, even if the system clock is adjusted between two updates.
pub fn now_monotonic(last: Option<Timestamp>) -> Timestamp {
    let now = Utc::now();
    match last {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Generates a fresh entity URI (a random UUID v4).
pub fn generate_uri() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// Attributes
// ============================================================================

/// A single key/value attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An attribute as held by the attribute store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeInDb {
    pub key: String,
    pub value: AttributeValue,
    /// Last time the value changed.
    pub updated_at: Timestamp,
    /// First time this key was registered on the entity.
    pub registered_at: Timestamp,
}

// ============================================================================
// Entities
// ============================================================================

/// The role an entity plays in an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Principal,
    Resource,
    #[default]
    Any,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Principal => "principal",
            Self::Resource => "resource",
            Self::Any => "any",
        }
    }

    /// Returns true if an entity of this type may fill a slot of `expected` type.
    pub fn fits(self, expected: EntityType) -> bool {
        self == expected || self == Self::Any || expected == Self::Any
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "principal" => Ok(Self::Principal),
            "resource" => Ok(Self::Resource),
            "any" => Ok(Self::Any),
            other => Err(ValidationError::new(format!(
                "unknown entity type '{other}' (expected principal, resource or any)"
            ))),
        }
    }
}

/// A registered entity, as returned by the attribute store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub uri: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Attributes sorted by key.
    pub attributes: Vec<AttributeInDb>,
    pub registered_at: Timestamp,
    /// Absent when the store does not report it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Entity {
    /// Returns the entity's attributes as a plain key/value map.
    pub fn attributes_map(&self) -> Attributes {
        self.attributes
            .iter()
            .map(|a| (a.key.clone(), a.value.clone()))
            .collect()
    }

    /// Looks up a single stored attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&AttributeInDb> {
        self.attributes.iter().find(|a| a.key == key)
    }
}

/// Request body for registering a new entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCreate {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(deserialize_with = "attributes_wire::deserialize")]
    pub attributes: Attributes,
    /// Generated by the store when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl EntityCreate {
    pub fn new(entity_type: EntityType, attributes: Attributes) -> Self {
        Self {
            entity_type,
            attributes,
            uri: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.attributes.is_empty() {
            return Err(ValidationError::new("at least one attribute must be provided"));
        }
        if self.uri.as_deref().is_some_and(|uri| uri.trim().is_empty()) {
            return Err(ValidationError::new("uri must not be empty when provided"));
        }
        Ok(())
    }
}

/// Request body for updating an entity's attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub uri: String,
    #[serde(deserialize_with = "attributes_wire::deserialize")]
    pub attributes: Attributes,
    /// Optional; when present it must match the stored type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
}

impl EntityUpdate {
    pub fn new(uri: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            uri: uri.into(),
            attributes,
            entity_type: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.uri.trim().is_empty() {
            return Err(ValidationError::new("uri is required"));
        }
        if self.attributes.is_empty() {
            return Err(ValidationError::new("at least one attribute must be provided"));
        }
        Ok(())
    }
}

// ============================================================================
// Decision Requests
// ============================================================================

/// One side of a check request: a registered entity, inline attributes, or both.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityCheck {
    /// URI of a registered entity whose stored attributes join the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, deserialize_with = "attributes_wire::deserialize")]
    pub attributes: Attributes,
    #[serde(rename = "type", default)]
    pub entity_type: EntityType,
}

impl EntityCheck {
    /// An empty principal-side entity.
    pub fn principal() -> Self {
        Self {
            entity_type: EntityType::Principal,
            ..Self::default()
        }
    }

    /// An empty resource-side entity.
    pub fn resource() -> Self {
        Self {
            entity_type: EntityType::Resource,
            ..Self::default()
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Returns the URI if one was given and it is non-empty.
    pub fn registered_uri(&self) -> Option<&str> {
        self.uri.as_deref().filter(|uri| !uri.is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.registered_uri().is_none() && self.attributes.is_empty() {
            return Err(ValidationError::new(
                "either 'uri' or non-empty 'attributes' must be provided",
            ));
        }
        Ok(())
    }
}

fn default_action() -> String {
    DEFAULT_ACTION.to_string()
}

/// A request to decide whether `principal` may perform `action` on `resource`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub principal: EntityCheck,
    pub resource: EntityCheck,
    #[serde(default = "default_action")]
    pub action: String,
}

impl CheckRequest {
    /// Creates a request for the default `access` action.
    pub fn new(principal: EntityCheck, resource: EntityCheck) -> Self {
        Self {
            principal,
            resource,
            action: default_action(),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.principal
            .validate()
            .map_err(|e| ValidationError::new(format!("principal: {e}")))?;
        self.resource
            .validate()
            .map_err(|e| ValidationError::new(format!("resource: {e}")))?;
        if !self.principal.entity_type.fits(EntityType::Principal) {
            return Err(ValidationError::new(format!(
                "principal: entity type must be principal, got {}",
                self.principal.entity_type
            )));
        }
        if !self.resource.entity_type.fits(EntityType::Resource) {
            return Err(ValidationError::new(format!(
                "resource: entity type must be resource, got {}",
                self.resource.entity_type
            )));
        }
        if self.action.trim().is_empty() {
            return Err(ValidationError::new("action must not be empty"));
        }
        Ok(())
    }
}

/// The outcome of a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CheckResponse {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: Some(reason.into()),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
