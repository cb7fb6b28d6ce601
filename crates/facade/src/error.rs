//! Facade errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use simbridge_client::ClientError;
use simbridge_core::RunnerError;
use thiserror::Error;

/// Errors returned to facade callers.
///
/// `InvalidAddress` means the request itself was malformed; the other
/// variants mean the simulation behind the facade cannot serve it.
#[derive(Debug, Error)]
pub enum FacadeError {
    /// A point address did not parse or does not belong to this case.
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// A step size the simulation cannot use.
    #[error("Invalid step: {0} seconds")]
    InvalidStep(u64),

    /// The run has stopped, so writes would never be applied.
    #[error("Simulation run is {0}")]
    RunUnavailable(String),

    /// A call to the simulation service failed.
    #[error(transparent)]
    Remote(#[from] ClientError),
}

impl From<RunnerError> for FacadeError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Remote(err) => FacadeError::Remote(err),
            RunnerError::Terminated => FacadeError::RunUnavailable("terminated".to_string()),
        }
    }
}

impl FacadeError {
    pub(crate) fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        FacadeError::InvalidAddress {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status the error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FacadeError::InvalidAddress { .. } | FacadeError::InvalidStep(_) => {
                StatusCode::BAD_REQUEST
            }
            FacadeError::RunUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            FacadeError::Remote(err) if err.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            FacadeError::Remote(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorDescriptionResponse {
    message: String,
}

impl IntoResponse for FacadeError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorDescriptionResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
