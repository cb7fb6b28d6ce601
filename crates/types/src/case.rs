//! Test case configuration.

use std::time::Duration;

/// How a test case is selected, initialized and advanced.
///
/// `step` and `update_frequency` are independent: `step` is the amount of
/// simulated time one advance covers, `update_frequency` is the wall-clock
/// interval between advances.
#[derive(Clone, Debug, PartialEq)]
pub struct TestCaseConfig {
    /// Name of the test case to select on the remote service.
    pub name: String,

    /// Simulation start, in seconds since the start of the simulated year.
    pub start_time: u64,

    /// Warm-up period simulated before `start_time`, in seconds.
    pub warmup_period: u64,

    /// Simulated seconds covered by one advance.
    pub step: u64,

    /// Wall-clock interval between advances.
    pub update_frequency: Duration,

    /// Whether the caller should start the run as soon as the case is selected.
    pub auto_start: bool,
}

impl TestCaseConfig {
    /// Create a configuration for the named test case with default timing.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_time: 0,
            warmup_period: 0,
            step: 60,
            update_frequency: Duration::from_secs(1),
            auto_start: false,
        }
    }

    /// Set the start time (seconds since the start of the year).
    pub fn with_start_time(mut self, seconds: u64) -> Self {
        self.start_time = seconds;
        self
    }

    /// Set the warm-up period in seconds.
    pub fn with_warmup_period(mut self, seconds: u64) -> Self {
        self.warmup_period = seconds;
        self
    }

    /// Set the simulated step in seconds.
    pub fn with_step(mut self, seconds: u64) -> Self {
        self.step = seconds;
        self
    }

    /// Set the wall-clock interval between advances.
    pub fn with_update_frequency(mut self, interval: Duration) -> Self {
        self.update_frequency = interval;
        self
    }

    /// Ask the caller to start the run immediately after selection.
    pub fn with_auto_start(mut self) -> Self {
        self.auto_start = true;
        self
    }
}

impl Default for TestCaseConfig {
    fn default() -> Self {
        Self::new("bestest_air")
    }
}
