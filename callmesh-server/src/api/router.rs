//! Request routing for the API.
//!
//! Dispatches on `(Method, path)`. Any single-segment GET path is treated as
//! a root entry point whose segment names the tasklet; validation of the
//! segment happens in the handler so unknown tasks produce a 400 naming the
//! task rather than a bare 404.

use super::error::ConnectionSevered;
use super::handlers;
use super::response;
use super::state::AppState;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use std::sync::Arc;

/// Route an incoming request to the appropriate handler.
///
/// # Errors
///
/// Returns [`ConnectionSevered`] when the handled node ran the `fail`
/// tasklet; hyper reacts by dropping the connection without a response.
pub async fn route(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, ConnectionSevered> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    tracing::debug!(method = %method, path = %path, "routing request");

    match (method, path.as_str()) {
        (Method::GET, "/healthz") => Ok(handlers::health::get_healthz(&state)),
        (Method::GET, "/help") => Ok(handlers::help::get_help()),
        (Method::POST, "/internal") => {
            let body = match req.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    return Ok(super::ApiError::bad_request(format!(
                        "failed to read request body: {e}"
                    ))
                    .into_response())
                }
            };
            handlers::node::internal(&body, &state).await
        }
        (Method::GET, path) => {
            let segment = path.trim_start_matches('/');
            if segment.contains('/') {
                return Ok(response::not_found());
            }
            let query = req.uri().query().unwrap_or("").to_string();
            handlers::node::root(segment, &query, &state).await
        }
        _ => Ok(response::not_found()),
    }
}
