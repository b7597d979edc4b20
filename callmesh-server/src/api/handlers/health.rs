//! Health endpoint handler.

use crate::api::response;
use crate::api::state::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;

/// GET /healthz
///
/// Returns the server instance identifier and liveness confirmation.
pub fn get_healthz(state: &AppState) -> Response<Full<Bytes>> {
    response::text(format!("{} OK\n", state.server_id()))
}
