use std::path::PathBuf;

use arbiter_abac::PolicyError;
use arbiter_registry::RegistryError;
use arbiter_types::{EntityType, ValidationError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArbiterError>;

/// Errors returned by the decision engine.
#[derive(Debug, Error)]
pub enum ArbiterError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// Inline attributes disagree with the registered ones.
    #[error("for entity '{uri}', attribute '{key}' has more than one value")]
    AttributeConflict { uri: String, key: String },

    /// A registered entity was used in the wrong slot of a check.
    #[error("entity '{uri}' has type {actual} and cannot be used as a {expected}")]
    EntityTypeMismatch {
        uri: String,
        expected: EntityType,
        actual: EntityType,
    },

    #[error("path uri '{path}' does not match body uri '{body}'")]
    UriMismatch { path: String, body: String },

    #[error("bulk check has {count} requests, the limit is {max}")]
    TooManyRequests { count: usize, max: usize },

    #[error("failed to read policy file {path}: {source}")]
    PolicyFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid policy in {path}: {source}")]
    PolicyDocument { path: PathBuf, source: PolicyError },

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ArbiterError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
