//! Request and response bodies.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use simbridge_core::RunState;
use simbridge_types::Value;

/// An external address and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub key: String,
    pub value: Value,
}

/// Read one or more points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequest {
    pub keys: Vec<String>,
}

/// Values found for a read, with the simulated time they belong to.
///
/// Requested points the simulation does not know are absent from `pairs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    pub time: DateTime<Local>,
    pub pairs: Vec<Pair>,
}

/// Queue writes for the next tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRequest {
    pub pairs: Vec<Pair>,
}

/// Acknowledges the accepted writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetResponse {
    pub pairs: Vec<Pair>,
}

/// Change the simulated step size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRequest {
    pub step: u64,
}

/// Run status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub test_case: String,
    pub case_id: String,
    pub state: RunState,
    pub step: u64,
    pub pending_writes: usize,
}
