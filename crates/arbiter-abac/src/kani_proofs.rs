//! Kani proofs for ABAC policy evaluation
//!
//! These proofs verify correctness properties of the rule matcher and the
//! policy-set aggregation using bounded model checking.
//!
//! **Proof Count**: 4 proofs
//!
//! Run with: `cargo kani --tests --harness verify_*`

#[cfg(kani)]
use crate::decision;
#[cfg(kani)]
use crate::evaluator;
#[cfg(kani)]
use crate::policy::{Condition, Effect, Policy, Rule};
#[cfg(kani)]
use arbiter_types::{Attributes, attributes};

/// Proof #1: Policy evaluation determinism
///
/// **Property**: Same inputs always produce the same result
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(10)]
fn verify_policy_evaluation_determinism() {
    let policy = Policy::new("docs").with_rule(
        Rule::allow("admins")
            .for_action("access")
            .when_principal(Condition::equals("role", "admin")),
    );
    let principal = attributes([("role", "admin")]);
    let resource = Attributes::new();

    let first = evaluator::evaluate_policy(&policy, &principal, &resource, "access");
    let second = evaluator::evaluate_policy(&policy, &principal, &resource, "access");

    // Postcondition: Identical results
    assert_eq!(first.effect, second.effect);
    assert_eq!(first.matched_rule, second.matched_rule);
}

/// Proof #2: First-match conflict resolution
///
/// **Property**: When multiple rules match, the earliest rule wins
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(10)]
fn verify_first_match_wins() {
    let policy = Policy::new("ordered")
        .with_default_effect(Effect::Allow)
        .with_rule(Rule::deny("early-deny"))
        .with_rule(Rule::allow("late-allow"));

    let result =
        evaluator::evaluate_policy(&policy, &Attributes::new(), &Attributes::new(), "access");

    // Postcondition: The earlier Deny wins over the later Allow
    assert_eq!(result.effect, Effect::Deny);
    assert_eq!(result.matched_rule, Some("early-deny".to_string()));
}

/// Proof #3: Default effect fallback
///
/// **Property**: When no rule matches, the default effect is applied
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(10)]
fn verify_default_effect_fallback() {
    let policy = Policy::new("admins-only").with_rule(
        Rule::allow("admin-only").when_principal(Condition::equals("role", "admin")),
    );
    let principal = attributes([("role", "user")]);

    let result = evaluator::evaluate_policy(&policy, &principal, &Attributes::new(), "access");

    // Postcondition: Default Deny applied
    assert_eq!(result.effect, Effect::Deny);
    assert!(result.matched_rule.is_none());
}

/// Proof #4: Empty policy set denies
///
/// **Property**: Without policies nothing is allowed
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(10)]
fn verify_empty_policy_set_denies() {
    let decision = decision::decide(&[], &Attributes::new(), &Attributes::new(), "access");
    assert!(!decision.allowed);
}
