//! Shared application state for the API.

use crate::executor::Executor;
use callmesh_core::ServerId;

/// State shared by all request handlers.
///
/// Read-only after startup; each inbound call otherwise owns its data
/// exclusively.
#[derive(Debug)]
pub struct AppState {
    /// The fan-out/fan-in executor.
    pub executor: Executor,
}

impl AppState {
    /// Create application state around an executor.
    #[must_use]
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// The identifier of this server instance.
    #[must_use]
    pub fn server_id(&self) -> ServerId {
        self.executor.server_id()
    }
}
