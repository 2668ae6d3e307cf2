//! Response construction.
//!
//! # Responsibilities
//! - Map relay errors to JSON `{"error": ...}` bodies
//! - Turn relay outcomes and converted uploads into responses
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the body
//! - Every body the relay serves is marked `Content-Disposition: inline`

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::convert::Converted;
use crate::relay::{RelayError, RelayOutcome};

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// JSON error body with the given status.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        json_error(self.status(), &self.to_string())
    }
}

impl IntoResponse for RelayOutcome {
    fn into_response(self) -> Response {
        match self {
            RelayOutcome::Redirect(location) => match HeaderValue::from_str(&location) {
                Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
                Err(_) => RelayError::Internal(format!("invalid redirect location '{}'", location))
                    .into_response(),
            },
            RelayOutcome::Stream {
                content_type,
                content_length,
                body,
            } => inline(&content_type, content_length, body),
            RelayOutcome::Html(html) => inline(HTML_CONTENT_TYPE, None, Body::from(html)),
        }
    }
}

impl IntoResponse for Converted {
    fn into_response(self) -> Response {
        match self {
            Converted::Html(html) => inline(HTML_CONTENT_TYPE, None, Body::from(html)),
            Converted::Passthrough {
                content_type,
                bytes,
            } => {
                let len = bytes.len() as u64;
                inline(&content_type, Some(len), Body::from(bytes))
            }
        }
    }
}

fn inline(content_type: &str, content_length: Option<u64>, body: Body) -> Response {
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static("inline"));
    if let Some(len) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    response
}
