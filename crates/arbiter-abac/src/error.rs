use thiserror::Error;

pub type Result<T> = std::result::Result<T, PolicyError>;

/// A policy document or policy shape that cannot be used for evaluation.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy name must not be empty")]
    EmptyName,

    #[error("policy '{policy}' has a rule with an empty name")]
    EmptyRuleName { policy: String },

    #[error("policy '{policy}' defines rule '{rule}' more than once")]
    DuplicateRule { policy: String, rule: String },

    #[error("rule '{rule}' in policy '{policy}' has a condition with an empty path")]
    EmptyConditionPath { policy: String, rule: String },

    #[error("invalid policy document: {0}")]
    Parse(#[from] serde_json::Error),
}
