//! Client for the remote building simulation service.
//!
//! The remote service owns the simulation. This crate speaks its
//! request/response contract (select, initialize, advance, step, status,
//! point metadata, stop) behind the [`SimulationService`] trait so the
//! runner and facade can be exercised without a live service.

mod error;
mod http;
mod service;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::ClientError;
pub use http::{ClientConfig, HttpSimulationClient};
pub use service::SimulationService;
