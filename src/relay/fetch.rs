//! Upstream fetch client.
//!
//! # Responsibilities
//! - Issue GET/HEAD requests with a fixed browser-like header set
//! - Follow redirects up to a configured bound
//! - Enforce connect and per-call timeouts (the per-call deadline ends once
//!   response headers arrive; streamed bodies are not cut off)
//! - Map transport failures and non-2xx statuses to [`RelayError`]
//!
//! # Design Decisions
//! - One `reqwest::Client` per process; its internal pool is the only shared state
//! - No retries: a single upstream failure is terminal for the request
//! - Dropping the returned future (client disconnect) cancels the call

use std::time::Duration;

use axum::body::Body;
use futures_util::TryStreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::relay::classify::{classify, ContentKind, DEFAULT_CONTENT_TYPE};
use crate::relay::error::{RelayError, RelayResult};

/// Shared client for upstream requests.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl UpstreamClient {
    /// Build the client from configuration.
    pub fn new(config: &UpstreamConfig) -> RelayResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(header::ACCEPT, header_value(&config.accept)?);
        headers.insert(header::ACCEPT_LANGUAGE, header_value(&config.accept_language)?);
        headers.insert(header::REFERER, header_value(&config.referer)?);
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| RelayError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    /// GET `url`, failing on transport errors and non-success statuses.
    pub async fn get(&self, url: &Url) -> RelayResult<UpstreamResponse> {
        let response = self.send(self.client.get(url.clone()), url).await?;

        let status = response.status();
        tracing::debug!(target_url = %url, status = %status, "Upstream responded");

        if !status.is_success() {
            metrics::record_upstream_fetch("upstream_error");
            let reason = status.canonical_reason().unwrap_or("Upstream error").to_string();
            tracing::warn!(target_url = %url, status = %status, "Upstream returned error status");
            return Err(RelayError::Upstream { status, reason });
        }

        metrics::record_upstream_fetch("ok");
        Ok(UpstreamResponse::new(response, self.timeout_secs))
    }

    /// HEAD `url`; returns true only for a success status.
    pub async fn exists(&self, url: &Url) -> bool {
        let deadline = Duration::from_secs(self.timeout_secs);
        match tokio::time::timeout(deadline, self.client.head(url.clone()).send()).await {
            Ok(Ok(response)) => response.status().is_success(),
            Ok(Err(e)) => {
                tracing::debug!(target_url = %url, error = %e, "HEAD probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(target_url = %url, "HEAD probe timed out");
                false
            }
        }
    }

    /// Send `request`, bounding the wait for response headers.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> RelayResult<reqwest::Response> {
        let deadline = Duration::from_secs(self.timeout_secs);
        match tokio::time::timeout(deadline, request.send()).await {
            Ok(result) => result.map_err(|e| self.transport_error(url, e)),
            Err(_) => Err(self.timed_out(url)),
        }
    }

    fn timed_out(&self, url: &Url) -> RelayError {
        metrics::record_upstream_fetch("timeout");
        tracing::warn!(target_url = %url, timeout_secs = self.timeout_secs, "Upstream timed out");
        RelayError::Timeout(self.timeout_secs)
    }

    fn transport_error(&self, url: &Url, e: reqwest::Error) -> RelayError {
        if e.is_timeout() {
            self.timed_out(url)
        } else {
            metrics::record_upstream_fetch("fetch_failed");
            tracing::error!(target_url = %url, error = %e, "Upstream fetch failed");
            RelayError::FetchFailed(e.to_string())
        }
    }
}

fn header_value(value: &str) -> RelayResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| RelayError::Internal(format!("invalid header value '{}': {}", value, e)))
}

/// A successful upstream response whose body has not been read yet.
pub struct UpstreamResponse {
    content_type: String,
    content_length: Option<u64>,
    final_url: Url,
    timeout_secs: u64,
    inner: reqwest::Response,
}

impl UpstreamResponse {
    fn new(inner: reqwest::Response, timeout_secs: u64) -> Self {
        let content_type = inner
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        Self {
            content_type,
            content_length: inner.content_length(),
            final_url: inner.url().clone(),
            timeout_secs,
            inner,
        }
    }

    /// Upstream `content-type`, or `application/octet-stream` when absent.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// URL after redirects.
    pub fn final_url(&self) -> &Url {
        &self.final_url
    }

    pub fn kind(&self) -> ContentKind {
        classify(&self.content_type)
    }

    /// Read the whole body as text, within the per-call deadline.
    pub async fn text(self) -> RelayResult<String> {
        let deadline = Duration::from_secs(self.timeout_secs);
        match tokio::time::timeout(deadline, self.inner.text()).await {
            Ok(result) => result.map_err(|e| RelayError::FetchFailed(e.to_string())),
            Err(_) => Err(RelayError::Timeout(self.timeout_secs)),
        }
    }

    /// Stream the body without buffering it.
    pub fn into_body(self) -> Body {
        Body::from_stream(self.inner.bytes_stream().map_err(std::io::Error::other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_defaults() {
        assert!(UpstreamClient::new(&UpstreamConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_invalid_header() {
        let config = UpstreamConfig {
            user_agent: "bad\nagent".into(),
            ..UpstreamConfig::default()
        };
        assert!(matches!(
            UpstreamClient::new(&config),
            Err(RelayError::Internal(_))
        ));
    }
}
