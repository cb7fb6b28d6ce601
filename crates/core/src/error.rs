//! Error types for the cache and runner.

use simbridge_client::ClientError;
use thiserror::Error;

/// Errors reading derived values from the state cache.
#[derive(Debug, Error, PartialEq)]
pub enum CacheError {
    /// The cache holds no value for the key, usually because no snapshot
    /// has been installed yet.
    #[error("State unavailable: no value for '{0}'")]
    StateUnavailable(String),

    /// The value exists but has the wrong shape.
    #[error("Type mismatch for '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: String,
    },

    /// Simulated time too far from the start of the year to be a date.
    #[error("Simulated time {0} seconds is out of range")]
    TimeOutOfRange(f64),
}

/// Errors from runner lifecycle operations.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A call to the simulation service failed.
    #[error(transparent)]
    Remote(#[from] ClientError),

    /// The run has stopped; it cannot be started again.
    #[error("Simulation run has terminated")]
    Terminated,
}
