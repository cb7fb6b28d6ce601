//! Server configuration.
//!
//! Values come from an optional TOML file; command-line flags override
//! them. Durations use the [`humantime`] format (`500ms`, `1s`, `2m`).

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use simbridge_client::ClientConfig;
use simbridge_types::TestCaseConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything the server needs at startup. Immutable once loaded.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Name of the test case to select.
    pub test_case: String,

    /// Seconds since the start of the simulated year.
    pub start_time: u64,

    /// Warm-up period before `start_time`, in seconds.
    pub warmup_period: u64,

    /// Simulated seconds per advance.
    pub step: u64,

    /// Wall-clock interval between advances.
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub update_frequency: humantime::Duration,

    /// Address of the simulation service.
    pub remote_addr: String,

    /// Address the facade listens on.
    pub listen_addr: String,

    /// Scheme of external point addresses.
    pub scheme: String,

    /// Start advancing as soon as the case is selected.
    pub auto_start: bool,

    /// Upper bound on any single call to the simulation service.
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub request_timeout: humantime::Duration,

    /// Also write logs to this file.
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            test_case: "bestest_air".to_string(),
            start_time: 2_678_400,
            warmup_period: 0,
            step: 60,
            update_frequency: Duration::from_secs(1).into(),
            remote_addr: "http://localhost:5000".to_string(),
            listen_addr: "0.0.0.0:50066".to_string(),
            scheme: "boptest".to_string(),
            auto_start: true,
            request_timeout: Duration::from_secs(30).into(),
            log_file: None,
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values the runner or facade cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.test_case.is_empty() {
            return Err(ConfigError::Invalid("test_case must not be empty".into()));
        }
        if self.step == 0 {
            return Err(ConfigError::Invalid("step must be at least 1 second".into()));
        }
        if self.update_frequency.is_zero() {
            return Err(ConfigError::Invalid("update_frequency must be positive".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request_timeout must be positive".into()));
        }
        let scheme_ok = self
            .scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && self
                .scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'));
        if !scheme_ok {
            return Err(ConfigError::Invalid(format!(
                "scheme '{}' is not a valid URI scheme",
                self.scheme
            )));
        }
        Ok(())
    }

    /// Test case settings for the runner.
    pub fn test_case_config(&self) -> TestCaseConfig {
        let config = TestCaseConfig::new(self.test_case.clone())
            .with_start_time(self.start_time)
            .with_warmup_period(self.warmup_period)
            .with_step(self.step)
            .with_update_frequency(*self.update_frequency);
        if self.auto_start {
            config.with_auto_start()
        } else {
            config
        }
    }

    /// Settings for the simulation service client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.remote_addr.clone()).with_request_timeout(*self.request_timeout)
    }
}
