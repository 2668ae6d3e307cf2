//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by route, status
//! - `relay_request_duration_seconds` (histogram): latency by route
//! - `relay_upstream_fetches_total` (counter): upstream calls by outcome
//! - `relay_pdf_fallbacks_total` (counter): patent PDF fallbacks by outcome
//! - `relay_uploads_total` (counter): uploads by outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus exporter serves its own listener, separate from the relay

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished inbound request.
pub fn record_request(route: &'static str, status: u16, started: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "route" => route)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_upstream_fetch(outcome: &'static str) {
    metrics::counter!("relay_upstream_fetches_total", "outcome" => outcome).increment(1);
}

pub fn record_pdf_fallback(outcome: &'static str) {
    metrics::counter!("relay_pdf_fallbacks_total", "outcome" => outcome).increment(1);
}

pub fn record_upload(outcome: &'static str) {
    metrics::counter!("relay_uploads_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_request("proxy", 200, Instant::now());
        record_upstream_fetch("ok");
        record_pdf_fallback("missing");
        record_upload("converted");
    }
}
