//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, relay pipeline, upload conversion produce:
//!     → logging.rs (structured log events, request spans from TraceLayer)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
