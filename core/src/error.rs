//! Error types for the hosting API client.
//!
//! # Design
//! One closed enum covers every failure a manager can report. Unexpected
//! status codes land in `ApiFailure` with the raw status and body text; the
//! body is never JSON-decoded there, so HTML error pages survive intact for
//! diagnostics. Network failures are carried as the transport's own error.

use thiserror::Error;

/// Errors returned by the schedule and website managers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required setting (token, username, category, method) is missing or unknown.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The target resource already exists and creation was meant to be exclusive.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The server answered with a status the operation does not accept.
    #[error("API call failed with HTTP {status}: {body}")]
    ApiFailure { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// Caller-supplied input violates the operation's contract.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A success response body did not decode into the expected type.
    #[error("could not decode response body ({source}): {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl ApiError {
    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ApiFailure { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
