//! Point-addressed facade over a running simulation.
//!
//! External callers name points as `scheme://case/point`. The facade
//! validates those addresses, translates them to the simulation's internal
//! point names, reads from the state cache and queues writes for the next
//! tick. Responses are always keyed by the caller's original address.

mod address;
mod api;
mod error;
mod facade;
mod types;

pub use address::{AddressResolver, PointAddress};
pub use api::{router, serve};
pub use error::FacadeError;
pub use facade::PointFacade;
pub use types::{
    GetRequest, GetResponse, Pair, SetRequest, SetResponse, StatusResponse, StepRequest,
};
