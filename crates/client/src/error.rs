//! Error types for remote simulation calls.

use thiserror::Error;

/// Errors from a single call to the simulation service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service could not be reached, or the call timed out.
    #[error("Simulation service unavailable at {url}: {source}")]
    Unavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("Simulation service rejected {url} with status {status}: {message}")]
    Rejected {
        url: String,
        status: u16,
        message: String,
    },

    /// The service answered successfully but the body could not be understood.
    #[error("Malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The client itself could not be constructed.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the error means the service could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ClientError::Unavailable { .. })
    }
}
