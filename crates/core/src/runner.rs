//! Periodic simulation advance loop.
//!
//! # Lifecycle
//!
//! A runner is created by [`SimulationRunner::connect`], which selects the
//! test case and applies the configured step. Nothing runs until the caller
//! invokes [`start`](SimulationRunner::start): that initializes the case,
//! installs the initial snapshot, and spawns one periodic task. The first
//! advance happens one full `update_frequency` after start.
//!
//! Each tick drains the [`WriteBuffer`], sends the drained inputs with one
//! advance call, and installs the returned snapshot. An advance failure ends
//! the run; it is never retried.
//!
//! [`stop`](SimulationRunner::stop) is a two-phase shutdown: it cancels the
//! task's token and then waits for the task to finish, which happens only
//! after the task has called the remote stop endpoint. A run that ends on an
//! advance failure releases the case itself. [`release`](SimulationRunner::release)
//! also frees a case that was selected but never started.

use crate::{RunState, RunnerError, StateCache, WriteBuffer};
use parking_lot::Mutex;
use simbridge_client::SimulationService;
use simbridge_types::{TestCaseConfig, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// Handle to the spawned periodic task.
struct RunHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

/// Drives one simulation run against the remote service.
pub struct SimulationRunner {
    service: Arc<dyn SimulationService>,
    case_id: String,
    config: TestCaseConfig,

    /// Last step size the remote service acknowledged.
    step: Mutex<u64>,
    /// Held across the remote call of a step change and the local write.
    step_change: tokio::sync::Mutex<()>,

    cache: Arc<StateCache>,
    writes: Arc<WriteBuffer>,

    state: Arc<watch::Sender<RunState>>,

    /// Serializes start and stop; holds the task handle while running.
    lifecycle: tokio::sync::Mutex<Option<RunHandle>>,
}

impl SimulationRunner {
    /// Select the configured test case and apply its step size.
    ///
    /// The returned runner is in [`RunState::Created`]; no task is spawned.
    /// Callers honouring [`TestCaseConfig::auto_start`] call
    /// [`start`](Self::start) right after.
    pub async fn connect(
        service: Arc<dyn SimulationService>,
        config: TestCaseConfig,
    ) -> Result<Self, RunnerError> {
        let case_id = service.select(&config.name).await?;
        if let Err(err) = service.set_step(&case_id, config.step).await {
            release_case(service.as_ref(), &case_id).await;
            return Err(err.into());
        }

        info!(
            test_case = %config.name,
            case_id = %case_id,
            step = config.step,
            "Connected to simulation"
        );

        let (state, _) = watch::channel(RunState::Created);
        let state = Arc::new(state);
        Ok(Self {
            step: Mutex::new(config.step),
            step_change: tokio::sync::Mutex::new(()),
            service,
            case_id,
            config,
            cache: Arc::new(StateCache::new()),
            writes: Arc::new(WriteBuffer::new()),
            state,
            lifecycle: tokio::sync::Mutex::new(None),
        })
    }

    /// Initialize the case and begin advancing it periodically.
    ///
    /// Starting a running runner is a no-op. Starting a stopped runner fails
    /// with [`RunnerError::Terminated`].
    pub async fn start(&self) -> Result<(), RunnerError> {
        let mut lifecycle = self.lifecycle.lock().await;

        let current = self.state();
        match current {
            RunState::Created => {}
            RunState::Running => {
                warn!(case_id = %self.case_id, "Simulation already running, ignoring start");
                return Ok(());
            }
            RunState::Stopping | RunState::Stopped => return Err(RunnerError::Terminated),
        }

        let initial = self
            .service
            .initialize(
                &self.case_id,
                self.config.start_time,
                self.config.warmup_period,
            )
            .await?;
        debug!(points = initial.len(), "Installed initial snapshot");
        self.cache.replace_all(initial);

        let shutdown = CancellationToken::new();
        let ticker = Ticker {
            service: Arc::clone(&self.service),
            case_id: self.case_id.clone(),
            cache: Arc::clone(&self.cache),
            writes: Arc::clone(&self.writes),
            state: Arc::clone(&self.state),
        };

        // Running must be visible before the task can fail and mark Stopped.
        self.state.send_replace(RunState::Running);
        let task = tokio::spawn(
            ticker
                .run(self.config.update_frequency, shutdown.clone())
                .in_current_span(),
        );
        *lifecycle = Some(RunHandle { shutdown, task });

        info!(
            case_id = %self.case_id,
            start_time = self.config.start_time,
            warmup_period = self.config.warmup_period,
            update_frequency = ?self.config.update_frequency,
            "Simulation started"
        );
        Ok(())
    }

    /// Stop the run and wait until the periodic task has exited.
    ///
    /// On a running runner this returns only after the task has called the
    /// remote stop endpoint. On a runner that never started, or one that
    /// already stopped, it returns immediately. Safe to call concurrently
    /// and repeatedly.
    pub async fn stop(&self) {
        self.shutdown(false).await
    }

    /// Stop the run like [`stop`](Self::stop), and also free the case on the
    /// remote service when it was selected but never started.
    ///
    /// Processes that own the case call this on exit so it never outlives
    /// them.
    pub async fn release(&self) {
        self.shutdown(true).await
    }

    async fn shutdown(&self, release_idle: bool) {
        let mut lifecycle = self.lifecycle.lock().await;

        self.writes.close();

        let Some(handle) = lifecycle.take() else {
            let previous = self.state.send_replace(RunState::Stopped);
            if release_idle && previous == RunState::Created {
                release_case(self.service.as_ref(), &self.case_id).await;
                info!(case_id = %self.case_id, "Released test case that never started");
            }
            return;
        };

        self.state.send_if_modified(|state| {
            if *state == RunState::Running {
                *state = RunState::Stopping;
                true
            } else {
                false
            }
        });

        handle.shutdown.cancel();
        if let Err(err) = handle.task.await {
            error!(case_id = %self.case_id, error = %err, "Simulation task did not exit cleanly");
        }

        self.state.send_replace(RunState::Stopped);
        info!(case_id = %self.case_id, "Simulation stopped");
    }

    /// Change the step size, updating the local value only once the remote
    /// service has accepted it.
    ///
    /// Concurrent changes are applied one at a time, so the local value always
    /// matches the last change the remote service acknowledged.
    pub async fn set_step(&self, seconds: u64) -> Result<(), RunnerError> {
        let _change = self.step_change.lock().await;
        self.service.set_step(&self.case_id, seconds).await?;
        *self.step.lock() = seconds;
        info!(case_id = %self.case_id, step = seconds, "Step size changed");
        Ok(())
    }

    /// Read the step size from the remote service and adopt it locally.
    pub async fn refresh_step(&self) -> Result<u64, RunnerError> {
        let _change = self.step_change.lock().await;
        let seconds = self.service.step(&self.case_id).await?;
        *self.step.lock() = seconds;
        Ok(seconds)
    }

    /// Ask the remote service whether the case is running.
    pub async fn remote_status(&self) -> Result<bool, RunnerError> {
        Ok(self.service.status(&self.case_id).await?)
    }

    /// Queue an input write for the next tick.
    ///
    /// Returns false once the run is stopping, when no tick will follow.
    pub fn set_input(&self, point: impl Into<String>, value: Value) -> bool {
        self.writes.set(point, value)
    }

    /// Last step size the remote service acknowledged.
    pub fn step(&self) -> u64 {
        *self.step.lock()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Receiver notified on every lifecycle transition.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Identifier the remote service assigned to the case.
    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// Configuration the case was created with.
    pub fn config(&self) -> &TestCaseConfig {
        &self.config
    }

    /// The service this runner talks to.
    pub fn service(&self) -> &Arc<dyn SimulationService> {
        &self.service
    }

    /// Shared state cache.
    pub fn cache(&self) -> &Arc<StateCache> {
        &self.cache
    }

    /// Shared write buffer.
    pub fn writes(&self) -> &Arc<WriteBuffer> {
        &self.writes
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        // Dropped without stop: let the task wind down (and release the case) on its own.
        if let Some(handle) = self.lifecycle.get_mut().take() {
            handle.shutdown.cancel();
        }
    }
}

async fn release_case(service: &dyn SimulationService, case_id: &str) {
    if let Err(err) = service.stop(case_id).await {
        warn!(case_id = %case_id, error = %err, "Failed to stop simulation case");
    }
}

/// State moved into the periodic task.
struct Ticker {
    service: Arc<dyn SimulationService>,
    case_id: String,
    cache: Arc<StateCache>,
    writes: Arc<WriteBuffer>,
    state: Arc<watch::Sender<RunState>>,
}

impl Ticker {
    async fn run(self, period: Duration, shutdown: CancellationToken) {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    release_case(self.service.as_ref(), &self.case_id).await;
                    debug!(case_id = %self.case_id, ticks = tick, "Simulation task exiting");
                    return;
                }
                _ = interval.tick() => {
                    tick += 1;
                    if !self.advance(tick).await {
                        self.writes.close();
                        release_case(self.service.as_ref(), &self.case_id).await;
                        self.state.send_replace(RunState::Stopped);
                        return;
                    }
                }
            }
        }
    }

    /// One tick. Returns false when the run must end.
    async fn advance(&self, tick: u64) -> bool {
        let inputs = self.writes.flush();
        let num_inputs = inputs.len();

        match self.service.advance(&self.case_id, &inputs).await {
            Ok(snapshot) => {
                self.cache.replace_all(snapshot);
                debug!(case_id = %self.case_id, tick, num_inputs, "Advanced simulation");
                true
            }
            Err(err) => {
                error!(
                    case_id = %self.case_id,
                    tick,
                    num_inputs,
                    error = %err,
                    "Failed to advance simulation, ending run"
                );
                false
            }
        }
    }
}
