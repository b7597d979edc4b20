//! Response builders for the API.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Build a JSON response with the given status code.
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|e| {
        serde_json::json!({
            "error": {
                "message": format!("serialization error: {e}"),
                "status": 500
            }
        })
        .to_string()
    });

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .expect("response builder should not fail")
}

/// Build a 200 OK plain-text response.
pub fn text(body: impl Into<String>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body.into())))
        .expect("response builder should not fail")
}

/// Build a 404 Not Found response.
pub fn not_found() -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": {
            "message": "not found",
            "status": 404
        }
    });
    json(StatusCode::NOT_FOUND, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sets_status_and_content_type() {
        let response = json(StatusCode::OK, &serde_json::json!({"a": 1}));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["Content-Type"],
            "application/json"
        );
    }

    #[test]
    fn not_found_is_404() {
        assert_eq!(not_found().status(), StatusCode::NOT_FOUND);
    }
}
