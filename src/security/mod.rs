//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (refuse foreign Origin with an empty 403)
//!     → cors.rs (OPTIONS answered 204, Access-Control-* headers)
//!     → Pass to handlers
//! ```
//!
//! # Design Decisions
//! - Fail closed: a present but unlisted Origin never reaches a handler
//! - Requests without Origin pass; they are not cross-origin browser calls

pub mod cors;
pub mod origin;
