//! ABAC rule matching.
//!
//! Evaluates a request against a single policy by checking its rules in stored
//! order. The first matching rule wins. If no rule matches, the policy's default
//! effect applies. Nothing in this module panics or performs I/O.

use std::borrow::Cow;

use arbiter_types::{AttributeValue, Attributes};
use serde::{Deserialize, Serialize};

use crate::policy::{Condition, ConditionOperator, Effect, Policy, Rule};

/// Prefix accepted in front of attribute paths.
const ATTRIBUTES_PREFIX: &str = "attributes.";

// ============================================================================
// PolicyEvaluationResult
// ============================================================================

/// The outcome of evaluating one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEvaluationResult {
    pub effect: Effect,
    /// The rule that matched, or `None` if the default effect was applied.
    pub matched_rule: Option<String>,
    pub policy_name: String,
}

impl PolicyEvaluationResult {
    /// Returns true if a rule (rather than the default) produced the effect.
    pub fn is_explicit(&self) -> bool {
        self.matched_rule.is_some()
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Evaluates a request against one policy.
///
/// # Postcondition
///
/// Always returns a result; the same inputs always produce the same result.
pub fn evaluate_policy(
    policy: &Policy,
    principal: &Attributes,
    resource: &Attributes,
    action: &str,
) -> PolicyEvaluationResult {
    let matched = policy
        .rules
        .iter()
        .find(|rule| rule_matches(rule, principal, resource, action));

    match matched {
        Some(rule) => {
            tracing::debug!(
                policy = %policy.name,
                rule = %rule.name,
                effect = %rule.effect,
                action,
                "rule matched"
            );
            PolicyEvaluationResult {
                effect: rule.effect,
                matched_rule: Some(rule.name.clone()),
                policy_name: policy.name.clone(),
            }
        }
        None => {
            tracing::debug!(
                policy = %policy.name,
                effect = %policy.default_effect,
                action,
                "no rule matched; applying default effect"
            );
            PolicyEvaluationResult {
                effect: policy.default_effect,
                matched_rule: None,
                policy_name: policy.name.clone(),
            }
        }
    }
}

/// Returns true if `rule` covers `action` and all of its conditions hold.
pub fn rule_matches(rule: &Rule, principal: &Attributes, resource: &Attributes, action: &str) -> bool {
    rule.applies_to(action)
        && rule
            .principal_conditions
            .iter()
            .all(|c| evaluate_condition(principal, c))
        && rule
            .resource_conditions
            .iter()
            .all(|c| evaluate_condition(resource, c))
}

/// Evaluates a single condition against an attribute map.
pub fn evaluate_condition(attributes: &Attributes, condition: &Condition) -> bool {
    let Some(actual) = resolve_path(attributes, &condition.path) else {
        return condition.operator == ConditionOperator::NotExists;
    };
    let expected = &condition.value;

    match condition.operator {
        ConditionOperator::Exists => true,
        ConditionOperator::NotExists => false,

        ConditionOperator::Equals => values_equal(actual, expected),
        ConditionOperator::NotEquals => !values_equal(actual, expected),

        ConditionOperator::Contains => texts(actual, expected).is_some_and(|(a, e)| a.contains(&*e)),
        ConditionOperator::NotContains => {
            texts(actual, expected).is_some_and(|(a, e)| !a.contains(&*e))
        }
        ConditionOperator::StartsWith => {
            texts(actual, expected).is_some_and(|(a, e)| a.starts_with(&*e))
        }
        ConditionOperator::EndsWith => texts(actual, expected).is_some_and(|(a, e)| a.ends_with(&*e)),

        ConditionOperator::Greater => numbers(actual, expected).is_some_and(|(a, e)| a > e),
        ConditionOperator::GreaterOrEqual => numbers(actual, expected).is_some_and(|(a, e)| a >= e),
        ConditionOperator::Less => numbers(actual, expected).is_some_and(|(a, e)| a < e),
        ConditionOperator::LessOrEqual => numbers(actual, expected).is_some_and(|(a, e)| a <= e),

        ConditionOperator::In => membership(actual, expected) == Some(true),
        ConditionOperator::NotIn => membership(actual, expected) == Some(false),
    }
}

/// Looks up an attribute by path.
///
/// Lookup order: the exact key, then the key with a leading `attributes.`
/// stripped, then a dotted traversal where numeric segments index into lists.
pub fn resolve_path<'a>(attributes: &'a Attributes, path: &str) -> Option<&'a AttributeValue> {
    if let Some(value) = attributes.get(path) {
        return Some(value);
    }
    let path = match path.strip_prefix(ATTRIBUTES_PREFIX) {
        Some(rest) => {
            if let Some(value) = attributes.get(rest) {
                return Some(value);
            }
            rest
        }
        None => path,
    };

    let mut segments = path.split('.');
    let mut current = attributes.get(segments.next()?)?;
    for segment in segments {
        let index: usize = segment.parse().ok()?;
        current = current.as_list()?.get(index)?;
    }
    Some(current)
}

// ============================================================================
// Helpers
// ============================================================================

/// Scalars compare by canonical text; lists compare element-wise.
fn values_equal(actual: &AttributeValue, expected: &AttributeValue) -> bool {
    match (actual.as_list(), expected.as_list()) {
        (Some(a), Some(e)) => a.len() == e.len() && a.iter().zip(e).all(|(x, y)| values_equal(x, y)),
        (None, None) => actual.as_text() == expected.as_text(),
        _ => false,
    }
}

/// Canonical text of both sides, or `None` if either is a list.
fn texts<'a>(
    actual: &'a AttributeValue,
    expected: &'a AttributeValue,
) -> Option<(Cow<'a, str>, Cow<'a, str>)> {
    Some((actual.as_text()?, expected.as_text()?))
}

fn numbers(actual: &AttributeValue, expected: &AttributeValue) -> Option<(f64, f64)> {
    Some((actual.as_number()?, expected.as_number()?))
}

/// Whether `actual` is a member of the set described by `set`.
///
/// A list set holds its items; a scalar set is split on `,` with whitespace
/// trimmed. Returns `None` when `actual` is a list.
fn membership(actual: &AttributeValue, set: &AttributeValue) -> Option<bool> {
    let needle = actual.as_text()?;
    let found = match set {
        AttributeValue::List(items) => items
            .iter()
            .any(|item| item.as_text().is_some_and(|t| t == needle)),
        scalar => scalar
            .as_text()
            .is_some_and(|text| text.split(',').map(str::trim).any(|member| member == needle)),
    };
    Some(found)
}

// ============================================================================
// Tests
// ============================================================================
