//! Run lifecycle states.

use serde::Serialize;
use std::fmt;

/// Lifecycle of a simulation run.
///
/// ```text
/// Created ──start──► Running ──stop──► Stopping ──► Stopped
///    │                  │                              ▲
///    └──────stop────────┴──────advance failure─────────┘
/// ```
///
/// `Stopped` is terminal: no further ticks happen afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Created,
    Running,
    Stopping,
    Stopped,
}

impl RunState {
    /// Whether the run can no longer advance.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Stopped)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Created => "created",
            RunState::Running => "running",
            RunState::Stopping => "stopping",
            RunState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
