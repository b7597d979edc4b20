//! callmesh server library.
//!
//! The distributed half of callmesh: the fan-out/fan-in executor that turns
//! one inbound request into a tree of recursive HTTP calls, and the hyper
//! HTTP API wrapping it. `callmesh-core` supplies the pure topology and
//! aggregation logic; `callmesh-tasklets` supplies the per-node workloads.
//!
//! One inbound call is handled entirely by one [`executor::Executor`]
//! invocation that owns its node descriptor, child list, and result map
//! exclusively. The only process-wide shared state is the outbound HTTP
//! client and the server instance ID, both read-only after startup.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod executor;
pub mod observability;

pub use api::ApiServer;
pub use executor::{ExecError, Executor};

/// Version of the callmesh server, logged at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
