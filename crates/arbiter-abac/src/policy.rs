//! ABAC policy definitions.
//!
//! A policy is a named, ordered list of rules plus a default effect. Each rule
//! names the actions it covers and the conditions that the principal and the
//! resource must satisfy. Rule order is priority order: the first matching
//! rule determines the policy's outcome.

use std::{collections::HashSet, fmt::Display, str::FromStr};

use arbiter_types::{AttributeValue, Attributes, CheckRequest, ValidationError};
use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, Result};

/// Version of the [`ConditionOperator`] set.
///
/// Bumped whenever an operator is added or its semantics change, so stored
/// policies can be checked against the evaluator that will run them.
pub const OPERATOR_SET_VERSION: u32 = 2;

// ============================================================================
// Effect
// ============================================================================

/// The effect of a policy rule: allow or deny access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Grant access.
    Allow,
    /// Deny access. Also the default when nothing else is specified.
    #[default]
    Deny,
}

impl Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Deny => f.write_str("deny"),
        }
    }
}

impl FromStr for Effect {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            other => Err(ValidationError::new(format!(
                "unknown effect '{other}' (expected allow or deny)"
            ))),
        }
    }
}

// ============================================================================
// Condition
// ============================================================================

/// Comparison applied by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    #[serde(rename = "equals")]
    Equals,
    #[serde(rename = "not_equals")]
    NotEquals,
    // String operators
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "not_contains")]
    NotContains,
    #[serde(rename = "startswith")]
    StartsWith,
    #[serde(rename = "endswith")]
    EndsWith,
    // Number operators
    #[serde(rename = "gt")]
    Greater,
    #[serde(rename = "gte")]
    GreaterOrEqual,
    #[serde(rename = "lt")]
    Less,
    #[serde(rename = "lte")]
    LessOrEqual,
    // Set operators
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    // Presence operators
    #[serde(rename = "exists")]
    Exists,
    #[serde(rename = "not_exists")]
    NotExists,
}

impl ConditionOperator {
    /// Every operator, in wire-name order.
    pub const ALL: [Self; 14] = [
        Self::Equals,
        Self::NotEquals,
        Self::Contains,
        Self::NotContains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Greater,
        Self::GreaterOrEqual,
        Self::Less,
        Self::LessOrEqual,
        Self::In,
        Self::NotIn,
        Self::Exists,
        Self::NotExists,
    ];

    /// The wire name of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Greater => "gt",
            Self::GreaterOrEqual => "gte",
            Self::Less => "lt",
            Self::LessOrEqual => "lte",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Exists => "exists",
            Self::NotExists => "not_exists",
        }
    }
}

impl Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionOperator {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ValidationError::new(format!("unknown condition operator '{s}'")))
    }
}

fn no_value() -> AttributeValue {
    AttributeValue::String(String::new())
}

/// A predicate over one attribute of an entity.
///
/// `path` names the attribute: a plain key (`role`), a key with the
/// `attributes.` prefix (`attributes.role`), or a dotted path that indexes
/// into list values (`groups.0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub path: String,
    pub operator: ConditionOperator,
    /// Ignored by `exists` and `not_exists`.
    #[serde(default = "no_value")]
    pub value: AttributeValue,
}

impl Condition {
    pub fn new(
        path: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self {
            path: path.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equals(path: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::new(path, ConditionOperator::Equals, value)
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Self::new(path, ConditionOperator::Exists, no_value())
    }

    pub fn not_exists(path: impl Into<String>) -> Self {
        Self::new(path, ConditionOperator::NotExists, no_value())
    }
}

// ============================================================================
// Rule
// ============================================================================

/// A single access control rule within a policy.
///
/// A rule matches when the requested action is one of `actions` (an empty list
/// matches every action) and every principal and resource condition holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique within the policy; reported in decisions.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub effect: Effect,
    #[serde(default)]
    pub principal_conditions: Vec<Condition>,
    #[serde(default)]
    pub resource_conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl Rule {
    pub fn new(name: impl Into<String>, effect: Effect) -> Self {
        Self {
            name: name.into(),
            description: None,
            effect,
            principal_conditions: Vec::new(),
            resource_conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn allow(name: impl Into<String>) -> Self {
        Self::new(name, Effect::Allow)
    }

    pub fn deny(name: impl Into<String>) -> Self {
        Self::new(name, Effect::Deny)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an action this rule applies to (builder pattern).
    pub fn for_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn when_principal(mut self, condition: Condition) -> Self {
        self.principal_conditions.push(condition);
        self
    }

    pub fn when_resource(mut self, condition: Condition) -> Self {
        self.resource_conditions.push(condition);
        self
    }

    /// Returns true if this rule covers `action`.
    pub fn applies_to(&self, action: &str) -> bool {
        self.actions.is_empty() || self.actions.iter().any(|a| a == action)
    }
}

// ============================================================================
// Policy
// ============================================================================

fn default_version() -> String {
    "1.0".to_string()
}

/// A named, ordered set of rules with a fallback effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Evaluated in order; the first match wins.
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Effect applied when no rule matches. Defaults to `Deny`.
    #[serde(default)]
    pub default_effect: Effect,
}

impl Policy {
    /// Creates an empty policy that denies by default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            description: None,
            rules: Vec::new(),
            default_effect: Effect::Deny,
        }
    }

    /// Adds a rule to the end of the policy (builder pattern).
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_default_effect(mut self, effect: Effect) -> Self {
        self.default_effect = effect;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Builds a single-rule policy that allows `action` when every given
    /// principal and resource attribute equals the stated value.
    pub fn simple(
        name: impl Into<String>,
        principal: &Attributes,
        resource: &Attributes,
        action: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let mut rule = Rule::allow(format!("{name}-rule"))
            .with_description(format!("Automatically generated rule for {name}"))
            .for_action(action);
        for (key, value) in principal {
            rule = rule.when_principal(Condition::equals(format!("attributes.{key}"), value.clone()));
        }
        for (key, value) in resource {
            rule = rule.when_resource(Condition::equals(format!("attributes.{key}"), value.clone()));
        }
        Self::new(name).with_rule(rule)
    }

    /// Builds a simple policy from the inline attributes of a check request.
    pub fn simple_from_request(name: impl Into<String>, request: &CheckRequest) -> Self {
        Self::simple(
            name,
            &request.principal.attributes,
            &request.resource.attributes,
            request.action.clone(),
        )
    }

    /// Checks the shape of the policy before it is stored.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PolicyError::EmptyName);
        }
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(PolicyError::EmptyRuleName {
                    policy: self.name.clone(),
                });
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(PolicyError::DuplicateRule {
                    policy: self.name.clone(),
                    rule: rule.name.clone(),
                });
            }
            let has_empty_path = rule
                .principal_conditions
                .iter()
                .chain(&rule.resource_conditions)
                .any(|c| c.path.trim().is_empty());
            if has_empty_path {
                return Err(PolicyError::EmptyConditionPath {
                    policy: self.name.clone(),
                    rule: rule.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Parses a JSON policy document holding either one policy or an array of them.
///
/// Every parsed policy is validated.
pub fn parse_policy_document(text: &str) -> Result<Vec<Policy>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Document {
        Many(Vec<Policy>),
        One(Box<Policy>),
    }

    let policies = match serde_json::from_str::<Document>(text) {
        Ok(Document::Many(policies)) => policies,
        Ok(Document::One(policy)) => vec![*policy],
        // Re-parse with the concrete shape so the error names the offending field.
        Err(_) if text.trim_start().starts_with('[') => serde_json::from_str::<Vec<Policy>>(text)?,
        Err(_) => vec![serde_json::from_str::<Policy>(text)?],
    };
    for policy in &policies {
        policy.validate()?;
    }
    Ok(policies)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_types::EntityCheck;

    #[test]
    fn test_effect_defaults_to_deny() {
        assert_eq!(Effect::default(), Effect::Deny);
        assert_eq!(Policy::new("p").default_effect, Effect::Deny);
    }

    #[test]
    fn test_operator_wire_names_round_trip() {
        for op in ConditionOperator::ALL {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
            assert_eq!(op.as_str().parse::<ConditionOperator>().unwrap(), op);
        }
        assert!("starts_with".parse::<ConditionOperator>().is_err());
    }

    #[test]
    fn test_rule_without_actions_applies_to_everything() {
        let rule = Rule::allow("any");
        assert!(rule.applies_to("access"));
        assert!(rule.applies_to("delete"));

        let rule = Rule::allow("read-only").for_action("read");
        assert!(rule.applies_to("read"));
        assert!(!rule.applies_to("write"));
    }

    #[test]
    fn test_policy_json_defaults() {
        let policy: Policy = serde_json::from_value(serde_json::json!({
            "name": "docs",
            "rules": [{
                "name": "admins",
                "effect": "allow",
                "principal_conditions": [
                    {"path": "attributes.role", "operator": "equals", "value": "admin"},
                    {"path": "team", "operator": "exists"}
                ],
                "actions": ["access"]
            }]
        }))
        .unwrap();

        assert_eq!(policy.version, "1.0");
        assert_eq!(policy.default_effect, Effect::Deny);
        assert_eq!(policy.rules[0].principal_conditions.len(), 2);
        assert_eq!(
            policy.rules[0].principal_conditions[1].operator,
            ConditionOperator::Exists
        );
        assert!(policy.rules[0].resource_conditions.is_empty());
    }

    #[test]
    fn test_validate_rejects_duplicate_rule_names() {
        let policy = Policy::new("p")
            .with_rule(Rule::allow("r"))
            .with_rule(Rule::deny("r"));
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::DuplicateRule { rule, .. }) if rule == "r"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        assert!(matches!(Policy::new(" ").validate(), Err(PolicyError::EmptyName)));
        assert!(matches!(
            Policy::new("p").with_rule(Rule::allow("")).validate(),
            Err(PolicyError::EmptyRuleName { .. })
        ));
        assert!(matches!(
            Policy::new("p")
                .with_rule(Rule::allow("r").when_resource(Condition::exists("")))
                .validate(),
            Err(PolicyError::EmptyConditionPath { .. })
        ));
    }

    #[test]
    fn test_simple_policy_from_request() {
        let request = CheckRequest::new(
            EntityCheck::principal().with_attribute("role", "admin"),
            EntityCheck::resource().with_attribute("classification", "confidential"),
        )
        .with_action("read");

        let policy = Policy::simple_from_request("admin-read", &request);

        assert_eq!(policy.default_effect, Effect::Deny);
        assert_eq!(policy.rules.len(), 1);
        let rule = &policy.rules[0];
        assert_eq!(rule.effect, Effect::Allow);
        assert_eq!(rule.actions, vec!["read".to_string()]);
        assert_eq!(
            rule.principal_conditions,
            vec![Condition::equals("attributes.role", "admin")]
        );
        assert_eq!(
            rule.resource_conditions,
            vec![Condition::equals("attributes.classification", "confidential")]
        );
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_simple_policy_without_attributes_matches_action_only() {
        let policy = Policy::simple("open", &Attributes::new(), &Attributes::new(), "ping");
        assert!(policy.rules[0].principal_conditions.is_empty());
        assert!(policy.rules[0].resource_conditions.is_empty());
    }

    #[test]
    fn test_parse_policy_document_single_and_many() {
        let one = r#"{"name": "a", "rules": []}"#;
        let many = r#"[{"name": "a", "rules": []}, {"name": "b", "default_effect": "allow"}]"#;

        let parsed = parse_policy_document(one).unwrap();
        assert_eq!(parsed.len(), 1);

        let parsed = parse_policy_document(many).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].default_effect, Effect::Allow);
    }

    #[test]
    fn test_parse_policy_document_errors() {
        assert!(matches!(
            parse_policy_document(r#"{"rules": []}"#),
            Err(PolicyError::Parse(_))
        ));
        assert!(matches!(
            parse_policy_document(r#"{"name": ""}"#),
            Err(PolicyError::EmptyName)
        ));
    }
}
