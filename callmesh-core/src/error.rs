//! Error types for callmesh core.
//!
//! Validation errors are boundary errors: they are surfaced to the caller as
//! a client error and never propagate into a call tree.

use thiserror::Error;

/// A malformed inbound request parameter.
///
/// Each variant names the offending parameter and carries the rejected value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// `size` is not an integer in [1, 1000].
    #[error("invalid 'size' parameter '{0}': must be an integer in [1, {max}]", max = crate::MAX_TREE_SIZE)]
    InvalidSize(String),

    /// `topology` is not one of fan, chain, tree.
    #[error("invalid 'topology' parameter '{0}': must be one of fan, chain, tree")]
    UnknownTopology(String),

    /// `time` is not a positive integer.
    #[error("invalid 'time' parameter '{0}': must be a positive integer (milliseconds)")]
    InvalidDuration(String),

    /// The task path segment does not name a known tasklet.
    #[error("unknown task '{0}': must be one of sleep, fail, crash, cpu, ram")]
    UnknownTask(String),

    /// A node descriptor received on the internal endpoint violates the
    /// tree invariants.
    #[error("invalid node descriptor: {0}")]
    InvalidDescriptor(String),
}

/// A configuration value that could not be loaded from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong type.
    #[error("environment variable {name} has invalid value '{value}': {cause}")]
    InvalidValue {
        /// The environment variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        cause: String,
    },
}
