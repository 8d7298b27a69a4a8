//! Client errors

use thiserror::Error;

/// Client error taxonomy
///
/// Only [`ClientError::PersistenceUnavailable`] is worth retrying; the rest
/// report a definitive server answer or a local decision.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The server could not be reached or did not answer in time. The
    /// optimistic view is kept; the caller decides when to retry.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// The payload could not be normalized even after fallback parsing
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Whether a retry of the same request can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::PersistenceUnavailable(_))
    }

    /// Map a server error code (from the response envelope) to an error
    pub fn from_code(code: &str, message: String) -> Self {
        match code {
            "E0002" | "E0006" => ClientError::Validation(message),
            "E0003" => ClientError::NotFound(message),
            "E0004" => ClientError::Conflict(message),
            "E0005" => ClientError::InvalidTransition(message),
            _ => ClientError::Internal(message),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::PersistenceUnavailable(e.to_string())
    }
}

impl From<shared::order::CartError> for ClientError {
    fn from(e: shared::order::CartError) -> Self {
        match e {
            shared::order::CartError::ItemNotFound(id) => {
                ClientError::NotFound(format!("Item {} not found", id))
            }
            other => ClientError::Validation(other.to_string()),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
