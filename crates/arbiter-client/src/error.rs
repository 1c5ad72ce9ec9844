//! Error types for the Arbiter client.

use arbiter_types::ValidationError;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure or timeout.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Protocol { status: u16, body: String },

    /// The request was rejected locally before being sent.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A 2xx response body did not match the expected shape.
    #[error("unexpected response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl From<ValidationError> for ClientError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl ClientError {
    /// HTTP status of a protocol error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_exposes_status() {
        let err = ClientError::Protocol {
            status: 404,
            body: "Entity not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "server returned 404: Entity not found");
    }

    #[test]
    fn test_validation_error_has_no_status() {
        let err = ClientError::from(ValidationError::new("action must not be empty"));
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("action must not be empty"));
    }
}
