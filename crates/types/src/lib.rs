//! Core types for simbridge.
//!
//! These types are shared by the remote simulation client, the state cache
//! and runner, and the point facade:
//!
//! - [`Value`]: a scalar point value (number, boolean or text)
//! - [`Snapshot`]: the complete simulated state, point name to value
//! - [`PendingWrites`]: inputs awaiting submission on the next advance
//! - [`PointProperties`]: metadata the remote service publishes per point
//! - [`TestCaseConfig`]: how a test case is initialized and advanced

mod case;
mod point;
mod value;

pub use case::TestCaseConfig;
pub use point::{PointCatalog, PointProperties};
pub use value::Value;

use std::collections::HashMap;

/// Key under which every snapshot carries simulated elapsed seconds.
pub const TIME_KEY: &str = "time";

/// The entire simulated state at one point in time, keyed by point name.
pub type Snapshot = HashMap<String, Value>;

/// Input writes awaiting the next advance, keyed by internal point name.
pub type PendingWrites = HashMap<String, Value>;
