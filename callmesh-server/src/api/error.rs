//! API error types and their HTTP mapping.

use crate::executor::ExecError;
use bytes::Bytes;
use callmesh_core::ValidationError;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use thiserror::Error;

/// Signal that the connection must be terminated without a response.
///
/// Returned as the hyper service error for requests whose node ran the
/// `fail` tasklet; hyper drops the connection, so the peer sees a severed
/// stream instead of an HTTP reply.
#[derive(Debug, Error)]
#[error("connection severed by fail tasklet")]
pub struct ConnectionSevered;

/// An error that maps to an ordinary HTTP error response.
#[derive(Debug)]
pub struct ApiError {
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    pub status: StatusCode,
}

impl ApiError {
    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to an HTTP response.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let body = serde_json::json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16()
            }
        });
        super::response::json(self.status, &body)
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<&ExecError> for ApiError {
    fn from(e: &ExecError) -> Self {
        // ConnectionDrop never reaches this mapping; the handler turns it
        // into ConnectionSevered before building a response.
        Self::internal(e.to_string())
    }
}
