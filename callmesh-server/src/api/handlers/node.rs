//! Node handlers: the root entry point and the recursive internal endpoint.

use crate::api::error::{ApiError, ConnectionSevered};
use crate::api::response;
use crate::api::state::AppState;
use crate::executor::ExecError;
use bytes::Bytes;
use callmesh_core::{NodeDescriptor, RootParams};
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET / and GET /<task>
///
/// Constructs the root node of a fresh call tree from the task path segment
/// and the query string, then hands it to the executor. Invalid parameters
/// produce a 400 naming the offending parameter and never enter the tree.
pub async fn root(
    task_segment: &str,
    query: &str,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, ConnectionSevered> {
    let params = match RootParams::from_query(task_segment, query) {
        Ok(params) => params,
        Err(e) => {
            tracing::debug!(error = %e, "rejected entry-point request");
            return Ok(ApiError::from(e).into_response());
        }
    };

    handle_node(NodeDescriptor::root(params), state).await
}

/// POST /internal
///
/// The recursive entry point used for every non-root node. The body is the
/// serialized node descriptor produced by the parent.
pub async fn internal(
    body: &Bytes,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, ConnectionSevered> {
    let node: NodeDescriptor = match serde_json::from_slice(body) {
        Ok(node) => node,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable internal node descriptor");
            return Ok(
                ApiError::bad_request(format!("invalid node descriptor: {e}")).into_response(),
            );
        }
    };

    // The endpoint is public: a forged descriptor must not enter the tree
    // walk, where an out-of-range position breaks termination.
    if let Err(e) = node.validate() {
        tracing::warn!(error = %e, "rejected forged node descriptor");
        return Ok(ApiError::from(e).into_response());
    }

    handle_node(node, state).await
}

/// Run the executor for one node and encode the outcome.
async fn handle_node(
    node: NodeDescriptor,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, ConnectionSevered> {
    match state.executor.handle(node).await {
        Ok(aggregate) => {
            let status = if aggregate.degraded {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::OK
            };
            Ok(response::json(status, &aggregate.entries))
        }
        Err(ExecError::ConnectionDrop) => Err(ConnectionSevered),
        Err(e) => Ok(ApiError::from(&e).into_response()),
    }
}
