//! # arbiter-abac: Attribute-Based Access Control
//!
//! Decides whether a principal may perform an action on a resource by matching
//! their attributes against ordered policy rules.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Access Request                              │
//! │  (Principal + Resource Attributes + Action)  │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Rule Matcher (per policy)                   │
//! │  ├─ Walk rules in stored order               │
//! │  ├─ Match action and attribute conditions    │
//! │  └─ First match wins, else default effect    │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Policy Set Aggregation                      │
//! │  - Any deny wins                             │
//! │  - No policies means deny                    │
//! │  - Human-readable reason                     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//!
//! ```
//! use arbiter_abac::policy::{Condition, Effect, Policy, Rule};
//! use arbiter_abac::decision;
//! use arbiter_types::attributes;
//!
//! let policy = Policy::new("documents").with_rule(
//!     Rule::allow("admins-access-confidential")
//!         .for_action("access")
//!         .when_principal(Condition::equals("role", "admin"))
//!         .when_resource(Condition::equals("classification", "confidential")),
//! );
//!
//! let principal = attributes([("role", "admin")]);
//! let resource = attributes([("classification", "confidential")]);
//!
//! let allowed = decision::decide(&[policy.clone()], &principal, &resource, "access");
//! assert!(allowed.allowed);
//!
//! let denied = decision::decide(&[policy], &principal, &resource, "delete");
//! assert!(!denied.allowed);
//! ```

pub mod decision;
mod error;
pub mod evaluator;
pub mod policy;

// Kani proofs for bounded model checking
#[cfg(any(test, kani))]
mod kani_proofs;

pub use decision::{Decision, decide};
pub use error::{PolicyError, Result};
pub use evaluator::{PolicyEvaluationResult, evaluate_condition, evaluate_policy, resolve_path};
pub use policy::{
    Condition, ConditionOperator, Effect as PolicyEffect, OPERATOR_SET_VERSION, Policy, Rule,
    parse_policy_document,
};
