//! # Arbiter
//!
//! Attribute-based access decisions for principals and resources.
//!
//! Entities carry key/value attributes. Policies hold ordered rules that match
//! those attributes and yield `allow` or `deny`. A check evaluates a
//! principal/resource/action triple against every policy and combines the
//! results with deny-overrides.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Arbiter                             │
//! │  ┌───────────┐   ┌────────────┐   ┌──────────┐   ┌─────────┐ │
//! │  │ Sources   │ → │  Resolve   │ → │  Match   │ → │ Decide  │ │
//! │  │(by URI)   │   │(merge attrs)│  │(per rule)│   │(deny    │ │
//! │  │           │   │            │   │          │   │ wins)   │ │
//! │  └───────────┘   └────────────┘   └──────────┘   └─────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - **Engine**: [`Arbiter`], [`EngineOptions`], [`AttributeSource`]
//! - **Policy model**: re-exported from `arbiter-abac`
//! - **Data model**: re-exported from `arbiter-types`
//! - **Entity store**: re-exported from `arbiter-registry`

mod arbiter;
mod error;
mod source;

pub use crate::arbiter::{Arbiter, EngineOptions};
pub use error::{ArbiterError, Result};
pub use source::AttributeSource;

// Re-export the policy model
pub use arbiter_abac::{
    Condition, ConditionOperator, Decision, OPERATOR_SET_VERSION, Policy, PolicyEffect,
    PolicyError, PolicyEvaluationResult, Rule, decide, evaluate_condition, evaluate_policy,
};

// Re-export the data model
pub use arbiter_types::{
    Attribute, AttributeInDb, AttributeValue, Attributes, CheckRequest, CheckResponse,
    DEFAULT_ACTION, Entity, EntityCheck, EntityCreate, EntityType, EntityUpdate,
    ValidationError, attributes,
};

// Re-export the entity store
pub use arbiter_registry::{Registry, RegistryError, UpdateMode};
