//! Logging setup.
//!
//! Logs always go to the terminal. When a log file is configured, the same
//! events are also written there through a non-blocking writer; keep the
//! returned guard alive for the life of the process so buffered lines are
//! flushed on exit.

use std::path::Path;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Errors installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log file path: {0}")]
    LogFile(String),

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Install the global subscriber.
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
pub fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>, TelemetryError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| TelemetryError::LogFile(path.display().to_string()))?;
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    Ok(guard)
}
