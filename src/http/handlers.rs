//! Route handlers.

use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::convert::{self, Upload};
use crate::http::request::request_id;
use crate::http::response::json_error;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::{resolve_target, RelayBase, RelayError, RelayOutcome, RelayResult};

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// `GET /api/proxy?url=...`
pub async fn proxy(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = request_id(&headers).to_string();

    let response = match relay(&state, query.url.as_deref(), &headers, &request_id).await {
        Ok(outcome) => outcome.into_response(),
        Err(e) => {
            log_failure(&request_id, &e);
            e.into_response()
        }
    };

    metrics::record_request("proxy", response.status().as_u16(), started);
    response
}

async fn relay(
    state: &AppState,
    raw: Option<&str>,
    headers: &HeaderMap,
    request_id: &str,
) -> RelayResult<RelayOutcome> {
    let settings = &state.service.config().relay;
    let target = resolve_target(raw, settings)?;
    let base = RelayBase::from_request(headers, settings, state.tls);

    tracing::info!(
        request_id = %request_id,
        target_url = %target,
        relay_base = base.origin(),
        "Relaying request"
    );
    state.service.relay(&target, &base).await
}

/// `POST /api/upload` with multipart field `file`.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let started = Instant::now();
    let request_id = request_id(&headers).to_string();

    let response = match receive_and_convert(&state, multipart).await {
        Ok(converted) => {
            metrics::record_upload(match converted {
                convert::Converted::Html(_) => "converted",
                convert::Converted::Passthrough { .. } => "passthrough",
            });
            converted.into_response()
        }
        Err(e) => {
            metrics::record_upload(e.kind());
            log_failure(&request_id, &e);
            e.into_response()
        }
    };

    metrics::record_request("upload", response.status().as_u16(), started);
    response
}

async fn receive_and_convert(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> RelayResult<convert::Converted> {
    let mut multipart =
        multipart.map_err(|e| RelayError::InvalidUpload(format!("Invalid upload: {}", e.body_text())))?;
    let config = &state.service.config().upload;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_read_error(e, config.max_bytes))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_read_error(e, config.max_bytes))?;

        tracing::debug!(
            file_name = ?file_name,
            content_type = ?content_type,
            size = bytes.len(),
            "Received upload"
        );

        let upload = Upload {
            file_name,
            content_type,
            bytes,
        };
        let config = config.clone();
        return tokio::task::spawn_blocking(move || convert::convert_upload(upload, &config))
            .await
            .map_err(|e| RelayError::Internal(format!("conversion task failed: {}", e)))?;
    }

    Err(RelayError::InvalidUpload("No file uploaded".to_string()))
}

fn upload_read_error(e: axum::extract::multipart::MultipartError, max_bytes: usize) -> RelayError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::InvalidUpload(format!("File exceeds the {} byte limit", max_bytes))
    } else {
        RelayError::InvalidUpload(format!("Invalid upload: {}", e.body_text()))
    }
}

/// `GET /health`
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "OK" })
}

/// Anything no route matched.
pub async fn fallback() -> Response {
    json_error(StatusCode::NOT_FOUND, "Endpoint not found")
}

fn log_failure(request_id: &str, e: &RelayError) {
    if e.status().is_server_error() {
        tracing::error!(request_id = %request_id, kind = e.kind(), error = %e, "Request failed");
    } else {
        tracing::warn!(request_id = %request_id, kind = e.kind(), error = %e, "Request rejected");
    }
}
