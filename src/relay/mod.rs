//! Proxy relay subsystem.
//!
//! # Data Flow
//! ```text
//! GET /api/proxy?url=...
//!     → target.rs (decode, unwrap nested relay URLs, validate)
//!     → fetch.rs (browser-like GET with timeouts)
//!     → classify.rs (HTML or passthrough, office viewer redirect)
//!     → rewrite.rs (links routed through links.rs) | patents (reconstruction)
//!     → service.rs returns a RelayOutcome for the HTTP layer
//! ```
//!
//! # Design Decisions
//! - No shared mutable state; the reqwest pool is the only shared resource
//! - Passthrough bodies are streamed, only HTML is buffered
//! - A single upstream failure is terminal for the request

pub mod classify;
pub mod error;
pub mod fetch;
pub mod links;
pub mod rewrite;
pub mod service;
pub mod target;

pub use error::{RelayError, RelayResult};
pub use links::RelayBase;
pub use service::{RelayOutcome, RelayService};
pub use target::resolve_target;
