//! Mirrors a remote simulation into an in-process cache and advances it.
//!
//! # Architecture
//!
//! - [`StateCache`]: the latest complete snapshot, replaced wholesale on
//!   every advance and read through copies
//! - [`WriteBuffer`]: input writes accumulated between advances and drained
//!   once per tick
//! - [`SimulationRunner`]: owns the periodic advance task and its
//!   start/stop lifecycle
//!
//! The runner is the only writer to the cache and the only reader of the
//! buffer; request handlers only read the cache and write the buffer.

mod buffer;
mod cache;
mod error;
mod runner;
mod state;

pub use buffer::WriteBuffer;
pub use cache::{elapsed_since_year_start, StateCache};
pub use error::{CacheError, RunnerError};
pub use runner::SimulationRunner;
pub use state::RunState;
