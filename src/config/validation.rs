//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, unwrap depth bounded)
//! - Check URLs and paths are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// Route served by the relay itself; configured paths may not reuse it.
const HEALTH_PATH: &str = "/health";

/// Largest accepted `relay.max_unwrap_depth`.
pub const MAX_UNWRAP_DEPTH: usize = 4;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path are required",
            ));
        }
    }

    if config.relay.proxy_paths.is_empty() {
        errors.push(ValidationError::new("relay.proxy_paths", "at least one path is required"));
    }
    let mut seen = HashSet::from([HEALTH_PATH]);
    for path in config.relay.proxy_paths.iter().chain(config.upload.paths.iter()) {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(
                "paths",
                format!("'{}' must start with '/'", path),
            ));
        }
        if !seen.insert(path.as_str()) {
            errors.push(ValidationError::new(
                "paths",
                format!("'{}' is routed more than once", path),
            ));
        }
    }

    check_http_url(&mut errors, "relay.default_origin", &config.relay.default_origin);
    check_http_url(&mut errors, "relay.office_viewer_url", &config.relay.office_viewer_url);
    if let Some(base) = &config.relay.public_base_url {
        check_http_url(&mut errors, "relay.public_base_url", base);
    }

    if config.relay.max_unwrap_depth == 0 || config.relay.max_unwrap_depth > MAX_UNWRAP_DEPTH {
        errors.push(ValidationError::new(
            "relay.max_unwrap_depth",
            format!("must be between 1 and {}", MAX_UNWRAP_DEPTH),
        ));
    }

    if !config.patents.pdf_url_template.contains("{id}") {
        errors.push(ValidationError::new(
            "patents.pdf_url_template",
            "must contain the {id} placeholder",
        ));
    }

    if config.upstream.timeout_secs == 0 || config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream", "timeouts must be greater than zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    if config.upload.max_bytes == 0 {
        errors.push(ValidationError::new("upload.max_bytes", "must be greater than zero"));
    }
    if config.upload.max_expanded_bytes == 0 {
        errors.push(ValidationError::new(
            "upload.max_expanded_bytes",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::new(
            field,
            format!("'{}' is not an absolute http(s) URL", value),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.relay.default_origin = "patents.google.com".into();
        config.relay.max_unwrap_depth = 0;
        config.patents.pdf_url_template = "https://example.com/file.pdf".into();
        config.upload.paths = vec!["upload".into()];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(fields.contains(&"listener.bind_address"));
        assert!(fields.contains(&"relay.default_origin"));
        assert!(fields.contains(&"relay.max_unwrap_depth"));
        assert!(fields.contains(&"patents.pdf_url_template"));
        assert!(fields.contains(&"paths"));
    }

    #[test]
    fn test_rejects_duplicate_routes() {
        let mut config = RelayConfig::default();
        config.relay.proxy_paths = vec!["/api/proxy".into(), "/health".into()];
        config.upload.paths = vec!["/api/proxy".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors.iter().all(|e| e.field == "paths"));
        assert!(errors[0].message.contains("/health"));
        assert!(errors[1].message.contains("/api/proxy"));
    }
}
