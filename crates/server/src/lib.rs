//! Process configuration and logging setup for the simbridge binaries.

pub mod config;
pub mod telemetry;

pub use config::{ConfigError, ServerConfig};
pub use telemetry::{init_logging, TelemetryError};
