//! Patent relay library.
//!
//! Fetches remote pages on behalf of an embedding frontend, rewrites their
//! links so navigation stays inside the relay, reconstructs patent-detail
//! pages into a self-contained document, and converts uploaded Word files
//! to HTML.

// Core subsystems
pub mod config;
pub mod convert;
pub mod http;
pub mod patents;
pub mod relay;

// Cross-cutting concerns
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
