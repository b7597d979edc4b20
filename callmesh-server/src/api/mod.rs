//! HTTP API for callmesh.
//!
//! A thin transport shell around the executor: connection handling
//! ([`server`]), method/path dispatch ([`router`]), handlers, and response
//! builders. Routing is deliberately hand-rolled over `(Method, path)`.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod server;
mod state;

pub use error::{ApiError, ConnectionSevered};
pub use server::{ApiServer, ShutdownHandle};
pub use state::AppState;
