//! Relay error definitions.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that can occur while relaying or converting a document.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The `url` query parameter was absent or blank.
    #[error("URL parameter is required")]
    MissingUrl,

    /// The `url` value is not an absolute http(s) URL.
    #[error("Invalid URL")]
    InvalidUrl(String),

    /// A relay URL was nested inside `url` more deeply than allowed.
    #[error("Nested proxy URL exceeds unwrap depth {0}")]
    NestedTooDeep(usize),

    /// Upload field missing, disallowed or oversized.
    #[error("{0}")]
    InvalidUpload(String),

    /// Upstream answered with a non-success status.
    #[error("Failed to fetch URL: {reason}")]
    Upstream { status: StatusCode, reason: String },

    /// DNS, connection or TLS failure talking to upstream.
    #[error("Failed to fetch URL: {0}")]
    FetchFailed(String),

    /// Upstream did not answer within the configured deadline.
    #[error("Upstream request timed out after {0} seconds")]
    Timeout(u64),

    /// The document converter rejected the upload.
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Server error: {0}")]
    Internal(String),
}

impl RelayError {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingUrl
            | RelayError::InvalidUrl(_)
            | RelayError::NestedTooDeep(_)
            | RelayError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::FetchFailed(_)
            | RelayError::ConversionFailed(_)
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MissingUrl | RelayError::InvalidUrl(_) | RelayError::NestedTooDeep(_) => {
                "invalid_url"
            }
            RelayError::InvalidUpload(_) => "invalid_upload",
            RelayError::Upstream { .. } => "upstream_error",
            RelayError::FetchFailed(_) => "fetch_failed",
            RelayError::Timeout(_) => "timeout",
            RelayError::ConversionFailed(_) => "conversion_failed",
            RelayError::Internal(_) => "internal",
        }
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
