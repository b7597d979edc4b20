//! callmesh core library.
//!
//! Foundational types for the callmesh call-topology synthesizer:
//!
//! - **Node descriptor**: the serializable value describing one position in a
//!   simulated call tree, exchanged verbatim between caller and callee.
//! - **Topology algorithm**: the pure function deriving a node's children for
//!   the fan, chain, and tree shapes.
//! - **Aggregate**: the bottom-up result map merged from a node and all of
//!   its descendants.
//! - **Config**: environment-variable configuration for the server shell.
//!
//! Nothing in this crate performs I/O; the distributed recursion itself lives
//! in `callmesh-server`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod node;
pub mod task;
pub mod topology;
pub mod types;

pub use aggregate::Aggregate;
pub use config::Config;
pub use error::{ConfigError, ValidationError};
pub use node::{NodeDescriptor, RootParams};
pub use task::TaskKind;
pub use topology::Topology;
pub use types::{RequestId, ServerId};

/// Largest tree size accepted from an inbound request.
pub const MAX_TREE_SIZE: u32 = 1000;

/// Default tasklet duration in milliseconds when `time` is not given.
pub const DEFAULT_TASK_DURATION_MS: u64 = 50;
