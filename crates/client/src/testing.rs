//! In-memory [`SimulationService`] for tests.
//!
//! Each advance moves simulated time forward by the current step and folds
//! the submitted inputs into the state, so tests can observe exactly how
//! many advances happened and which inputs they carried.

use crate::{ClientError, SimulationService};
use async_trait::async_trait;
use parking_lot::Mutex;
use simbridge_types::{PendingWrites, PointCatalog, PointProperties, Snapshot, Value, TIME_KEY};
use std::time::Duration;

/// Case identifier handed out by [`MockSimulation::select`].
pub const MOCK_CASE_ID: &str = "61df7871-dabe-4383-805a-50413c991b85";

#[derive(Debug, Default)]
struct MockState {
    selected: Option<String>,
    running: bool,
    time: f64,
    step: u64,
    points: Snapshot,
    advance_calls: usize,
    stop_calls: usize,
    submitted: Vec<PendingWrites>,
    fail_advance_at: Option<usize>,
    reject_step: bool,
    slow_step_ack: Option<(u64, Duration)>,
}

/// A scripted simulation service.
#[derive(Debug)]
pub struct MockSimulation {
    state: Mutex<MockState>,
    measurements: PointCatalog,
    inputs: PointCatalog,
}

impl MockSimulation {
    /// A simulation with one measurement and one input point.
    pub fn new() -> Self {
        let mut points = Snapshot::new();
        points.insert("zon_reaTRooAir_y".to_string(), Value::Number(293.15));
        points.insert("oveTSetHea_u".to_string(), Value::Number(294.15));

        let mut measurements = PointCatalog::new();
        measurements.insert(
            "zon_reaTRooAir_y".to_string(),
            PointProperties {
                unit: Some("K".to_string()),
                description: "Zone air temperature".to_string(),
                minimum: None,
                maximum: None,
            },
        );

        let mut inputs = PointCatalog::new();
        inputs.insert(
            "oveTSetHea_u".to_string(),
            PointProperties {
                unit: Some("K".to_string()),
                description: "Zone heating setpoint".to_string(),
                minimum: Some(278.15),
                maximum: Some(308.15),
            },
        );

        Self {
            state: Mutex::new(MockState {
                step: 3600,
                points,
                ..Default::default()
            }),
            measurements,
            inputs,
        }
    }

    /// Fail the `n`th advance call (1-based) and every one after it.
    pub fn fail_advance_at(self, n: usize) -> Self {
        self.state.lock().fail_advance_at = Some(n);
        self
    }

    /// Hold back the acknowledgement of a step change to `seconds` for
    /// `delay`. The new step is in effect on the service before the ack.
    pub fn delay_step_ack(self, seconds: u64, delay: Duration) -> Self {
        self.state.lock().slow_step_ack = Some((seconds, delay));
        self
    }

    /// Reject step changes until told otherwise.
    pub fn reject_step_changes(&self, reject: bool) {
        self.state.lock().reject_step = reject;
    }

    /// Number of advance calls received so far, failed ones included.
    pub fn advance_calls(&self) -> usize {
        self.state.lock().advance_calls
    }

    /// Number of stop calls received so far.
    pub fn stop_calls(&self) -> usize {
        self.state.lock().stop_calls
    }

    /// Inputs submitted with each advance, in call order.
    pub fn submitted(&self) -> Vec<PendingWrites> {
        self.state.lock().submitted.clone()
    }

    /// Step size the service currently holds.
    pub fn current_step(&self) -> u64 {
        self.state.lock().step
    }

    fn check_case(state: &MockState, case_id: &str) -> Result<(), ClientError> {
        if state.selected.as_deref() == Some(case_id) {
            Ok(())
        } else {
            Err(rejected(case_id, 400, "Invalid test id"))
        }
    }
}

impl Default for MockSimulation {
    fn default() -> Self {
        Self::new()
    }
}

fn rejected(case_id: &str, status: u16, message: &str) -> ClientError {
    ClientError::Rejected {
        url: format!("mock://{}", case_id),
        status,
        message: message.to_string(),
    }
}

fn snapshot_of(state: &MockState) -> Snapshot {
    let mut snapshot = state.points.clone();
    snapshot.insert(TIME_KEY.to_string(), Value::Number(state.time));
    snapshot
}

#[async_trait]
impl SimulationService for MockSimulation {
    async fn select(&self, name: &str) -> Result<String, ClientError> {
        if name.is_empty() {
            return Err(rejected(name, 400, "Unknown test case"));
        }
        self.state.lock().selected = Some(MOCK_CASE_ID.to_string());
        Ok(MOCK_CASE_ID.to_string())
    }

    async fn initialize(
        &self,
        case_id: &str,
        start_time: u64,
        _warmup_period: u64,
    ) -> Result<Snapshot, ClientError> {
        let mut state = self.state.lock();
        Self::check_case(&state, case_id)?;
        state.running = true;
        state.time = start_time as f64;
        Ok(snapshot_of(&state))
    }

    async fn advance(
        &self,
        case_id: &str,
        inputs: &PendingWrites,
    ) -> Result<Snapshot, ClientError> {
        let mut state = self.state.lock();
        Self::check_case(&state, case_id)?;
        state.advance_calls += 1;
        state.submitted.push(inputs.clone());

        if state
            .fail_advance_at
            .is_some_and(|n| state.advance_calls >= n)
        {
            return Err(rejected(case_id, 500, "Simulation failed to advance"));
        }

        state.time += state.step as f64;
        for (name, value) in inputs {
            state.points.insert(name.clone(), value.clone());
        }
        Ok(snapshot_of(&state))
    }

    async fn step(&self, case_id: &str) -> Result<u64, ClientError> {
        let state = self.state.lock();
        Self::check_case(&state, case_id)?;
        Ok(state.step)
    }

    async fn set_step(&self, case_id: &str, seconds: u64) -> Result<(), ClientError> {
        let delay = {
            let mut state = self.state.lock();
            Self::check_case(&state, case_id)?;
            if state.reject_step {
                return Err(rejected(case_id, 400, "Step change rejected"));
            }
            state.step = seconds;
            state
                .slow_step_ack
                .and_then(|(slow, delay)| (slow == seconds).then_some(delay))
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn status(&self, case_id: &str) -> Result<bool, ClientError> {
        let state = self.state.lock();
        Self::check_case(&state, case_id)?;
        Ok(state.running)
    }

    async fn measurements(&self, case_id: &str) -> Result<PointCatalog, ClientError> {
        Self::check_case(&self.state.lock(), case_id)?;
        Ok(self.measurements.clone())
    }

    async fn inputs(&self, case_id: &str) -> Result<PointCatalog, ClientError> {
        Self::check_case(&self.state.lock(), case_id)?;
        Ok(self.inputs.clone())
    }

    async fn stop(&self, case_id: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        Self::check_case(&state, case_id)?;
        state.stop_calls += 1;
        state.running = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_advances_by_step() {
        let sim = MockSimulation::new();
        let id = sim.select("bestest_air").await.unwrap();
        sim.set_step(&id, 60).await.unwrap();

        let initial = sim.initialize(&id, 3600, 0).await.unwrap();
        assert_eq!(initial[TIME_KEY], Value::Number(3600.0));

        let mut inputs = PendingWrites::new();
        inputs.insert("oveTSetHea_u".to_string(), Value::Number(295.0));
        let next = sim.advance(&id, &inputs).await.unwrap();
        assert_eq!(next[TIME_KEY], Value::Number(3660.0));
        assert_eq!(next["oveTSetHea_u"], Value::Number(295.0));
        assert_eq!(sim.advance_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_rejects_unknown_case() {
        let sim = MockSimulation::new();
        let err = sim.step("nope").await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected { status: 400, .. }));
    }
}
