//! Network layer subsystem.
//!
//! Plain TCP listeners are bound by the binary; this module only provides
//! the optional TLS configuration handed to `axum-server`.

pub mod tls;
