//! Policy-set aggregation.
//!
//! Every policy is evaluated independently and the per-policy results are
//! combined with deny-overrides: a single deny (explicit or default) denies the
//! request, and an empty policy set denies as well.

use arbiter_types::{Attributes, CheckResponse};
use serde::{Deserialize, Serialize};

use crate::evaluator::{PolicyEvaluationResult, evaluate_policy};
use crate::policy::{Effect, Policy};

/// The aggregated outcome of evaluating a request against a policy set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    /// Human-readable explanation of why this decision was made.
    pub reason: String,
    /// Per-policy results in policy order.
    pub results: Vec<PolicyEvaluationResult>,
}

impl Decision {
    pub fn to_response(&self) -> CheckResponse {
        CheckResponse {
            allowed: self.allowed,
            reason: Some(self.reason.clone()),
        }
    }
}

impl From<Decision> for CheckResponse {
    fn from(decision: Decision) -> Self {
        Self {
            allowed: decision.allowed,
            reason: Some(decision.reason),
        }
    }
}

/// Evaluates every policy and combines the results.
pub fn decide(
    policies: &[Policy],
    principal: &Attributes,
    resource: &Attributes,
    action: &str,
) -> Decision {
    let results: Vec<PolicyEvaluationResult> = policies
        .iter()
        .map(|policy| evaluate_policy(policy, principal, resource, action))
        .collect();
    aggregate(results)
}

/// Combines per-policy results with deny-overrides.
///
/// Explicit results are preferred over default ones when choosing the reason.
pub fn aggregate(results: Vec<PolicyEvaluationResult>) -> Decision {
    let first = |effect: Effect, explicit: bool| {
        results
            .iter()
            .find(|r| r.effect == effect && r.is_explicit() == explicit)
    };

    let (allowed, reason) = if results.is_empty() {
        (
            false,
            "Action denied by default because there are no policies".to_string(),
        )
    } else if let Some(r) = first(Effect::Deny, true) {
        (false, explicit_reason(r, "denied"))
    } else if let Some(r) = first(Effect::Deny, false) {
        (
            false,
            format!("Action denied by default effect of policy '{}'", r.policy_name),
        )
    } else if let Some(r) = first(Effect::Allow, true) {
        (true, explicit_reason(r, "allowed"))
    } else {
        // Non-empty with no deny and no explicit allow: every policy allowed by default.
        let policy = results.first().map_or("", |r| r.policy_name.as_str());
        (
            true,
            format!("Action allowed by default effect of policy '{policy}'"),
        )
    };

    tracing::debug!(allowed, reason = %reason, policies = results.len(), "decision aggregated");

    Decision {
        allowed,
        reason,
        results,
    }
}

fn explicit_reason(result: &PolicyEvaluationResult, verb: &str) -> String {
    format!(
        "Rule '{}' {verb} the action in policy '{}'",
        result.matched_rule.as_deref().unwrap_or_default(),
        result.policy_name
    )
}

// ============================================================================
// Tests
// ============================================================================
