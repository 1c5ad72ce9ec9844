#![no_main]

use arbiter_abac::{
    Condition, ConditionOperator, Policy, PolicyEffect, Rule, decide, evaluate_condition,
    evaluate_policy,
};
use arbiter_types::{AttributeValue, Attributes};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

// ============================================================================
// Arbitrary Implementations
// ============================================================================

#[derive(Debug, Clone, Arbitrary)]
enum FuzzValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl From<&FuzzValue> for AttributeValue {
    fn from(value: &FuzzValue) -> Self {
        match value {
            FuzzValue::Bool(b) => AttributeValue::Bool(*b),
            FuzzValue::Number(n) => AttributeValue::Number(*n),
            FuzzValue::Text(s) => AttributeValue::String(s.clone()),
            FuzzValue::List(items) => {
                AttributeValue::List(items.iter().map(|s| AttributeValue::from(s.as_str())).collect())
            }
        }
    }
}

/// Keys drawn from a small pool so conditions actually hit attributes.
#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzKey {
    Role,
    Level,
    Tags,
    Owner,
}

impl FuzzKey {
    fn name(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Level => "level",
            Self::Tags => "tags",
            Self::Owner => "owner",
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzCondition {
    key: FuzzKey,
    prefixed: bool,
    operator: u8,
    value: FuzzValue,
}

impl FuzzCondition {
    fn to_condition(&self) -> Condition {
        let operator =
            ConditionOperator::ALL[usize::from(self.operator) % ConditionOperator::ALL.len()];
        let path = if self.prefixed {
            format!("attributes.{}", self.key.name())
        } else {
            self.key.name().to_string()
        };
        Condition::new(path, operator, AttributeValue::from(&self.value))
    }
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzRule {
    allow: bool,
    principal: Vec<FuzzCondition>,
    resource: Vec<FuzzCondition>,
    actions: Vec<String>,
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzPolicy {
    rules: Vec<FuzzRule>,
    default_allow: bool,
}

impl FuzzPolicy {
    fn to_policy(&self, index: usize) -> Policy {
        let default_effect = if self.default_allow {
            PolicyEffect::Allow
        } else {
            PolicyEffect::Deny
        };
        let mut policy = Policy::new(format!("policy-{index}")).with_default_effect(default_effect);
        for (i, fuzz_rule) in self.rules.iter().enumerate() {
            let mut rule = if fuzz_rule.allow {
                Rule::allow(format!("rule-{i}"))
            } else {
                Rule::deny(format!("rule-{i}"))
            };
            for condition in &fuzz_rule.principal {
                rule = rule.when_principal(condition.to_condition());
            }
            for condition in &fuzz_rule.resource {
                rule = rule.when_resource(condition.to_condition());
            }
            for action in &fuzz_rule.actions {
                rule = rule.for_action(action.clone());
            }
            policy = policy.with_rule(rule);
        }
        policy
    }
}

fn attributes(pairs: &[(FuzzKey, FuzzValue)]) -> Attributes {
    pairs
        .iter()
        .map(|(key, value)| (key.name().to_string(), AttributeValue::from(value)))
        .collect()
}

fuzz_target!(|input: (Vec<FuzzPolicy>, Vec<(FuzzKey, FuzzValue)>, Vec<(FuzzKey, FuzzValue)>, String)| {
    let (fuzz_policies, principal, resource, action) = input;

    let policies: Vec<Policy> = fuzz_policies
        .iter()
        .enumerate()
        .map(|(i, p)| p.to_policy(i))
        .collect();
    let principal = attributes(&principal);
    let resource = attributes(&resource);

    let decision = decide(&policies, &principal, &resource, &action);
    validate_invariants(&policies, &principal, &resource, &action, &decision);
});

fn validate_invariants(
    policies: &[Policy],
    principal: &Attributes,
    resource: &Attributes,
    action: &str,
    decision: &arbiter_abac::Decision,
) {
    assert!(!decision.reason.is_empty(), "decision must carry a reason");
    assert_eq!(decision.results.len(), policies.len(), "one result per policy");

    // Empty policy set denies
    if policies.is_empty() {
        assert!(!decision.allowed);
    }

    // Deny overrides: allowed only if every policy allowed
    let all_allow = decision
        .results
        .iter()
        .all(|r| r.effect == PolicyEffect::Allow);
    assert_eq!(decision.allowed, !policies.is_empty() && all_allow);

    for (policy, result) in policies.iter().zip(&decision.results) {
        // Determinism
        assert_eq!(&evaluate_policy(policy, principal, resource, action), result);

        match &result.matched_rule {
            Some(name) => {
                let rule = policy.rules.iter().find(|r| &r.name == name);
                let rule = rule.unwrap_or_else(|| panic!("matched rule '{name}' must exist"));
                assert_eq!(rule.effect, result.effect);
            }
            None => assert_eq!(result.effect, policy.default_effect),
        }
    }

    // Absent attributes satisfy only not_exists
    let empty = Attributes::new();
    for operator in ConditionOperator::ALL {
        let condition = Condition::new("attributes.missing", operator, AttributeValue::from("x"));
        assert_eq!(
            evaluate_condition(&empty, &condition),
            operator == ConditionOperator::NotExists
        );
    }
}
