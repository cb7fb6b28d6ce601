//! The remote simulation contract.

use crate::ClientError;
use async_trait::async_trait;
use simbridge_types::{PendingWrites, PointCatalog, Snapshot};

/// Calls against the remote simulation service.
///
/// Every call is a synchronous request/response exchange; a non-success
/// answer is a hard failure for that call. Implementations hold no
/// per-case state, so one instance may serve any number of cases.
#[async_trait]
pub trait SimulationService: Send + Sync {
    /// Select a test case by name, returning the case identifier.
    async fn select(&self, name: &str) -> Result<String, ClientError>;

    /// Initialize the case and return the initial snapshot.
    async fn initialize(
        &self,
        case_id: &str,
        start_time: u64,
        warmup_period: u64,
    ) -> Result<Snapshot, ClientError>;

    /// Advance the simulation one step with the given inputs.
    async fn advance(&self, case_id: &str, inputs: &PendingWrites)
        -> Result<Snapshot, ClientError>;

    /// Current step size in simulated seconds.
    async fn step(&self, case_id: &str) -> Result<u64, ClientError>;

    /// Change the step size.
    async fn set_step(&self, case_id: &str, seconds: u64) -> Result<(), ClientError>;

    /// Whether the case is currently running on the service.
    async fn status(&self, case_id: &str) -> Result<bool, ClientError>;

    /// Metadata for every measurement point of the case.
    async fn measurements(&self, case_id: &str) -> Result<PointCatalog, ClientError>;

    /// Metadata for every input point of the case.
    async fn inputs(&self, case_id: &str) -> Result<PointCatalog, ClientError>;

    /// Stop the case and release it on the service.
    async fn stop(&self, case_id: &str) -> Result<(), ClientError>;
}
