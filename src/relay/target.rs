//! Target URL resolution and validation.
//!
//! # Responsibilities
//! - Reject a missing or blank `url` parameter
//! - Unwrap a relay URL nested inside `url` a bounded number of times
//! - Resolve absolute-path values against the default origin
//! - Accept only absolute `http`/`https` URLs

use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::RelaySettings;
use crate::relay::error::{RelayError, RelayResult};

/// Resolve the raw `url` query value into the upstream URL to fetch.
///
/// The query extractor has already decoded the value once. A value that is
/// still percent-encoded as a whole (`https%3A%2F%2F...`, `%2Fpatent%2F...`)
/// is decoded one more time.
pub fn resolve_target(raw: Option<&str>, settings: &RelaySettings) -> RelayResult<Url> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty()).ok_or(RelayError::MissingUrl)?;

    let default_origin = Url::parse(&settings.default_origin)
        .map_err(|e| RelayError::Internal(format!("default origin: {}", e)))?;

    let mut value = decode_if_encoded(raw);
    let mut depth = 0;
    while let Some(inner) = nested_relay_target(&value, settings, &default_origin) {
        if depth == settings.max_unwrap_depth {
            return Err(RelayError::NestedTooDeep(settings.max_unwrap_depth));
        }
        tracing::debug!(outer = %value, inner = %inner, "Unwrapped nested relay URL");
        value = inner;
        depth += 1;
    }

    let url = if value.starts_with('/') && !value.starts_with("//") {
        default_origin
            .join(&value)
            .map_err(|_| RelayError::InvalidUrl(value.clone()))?
    } else {
        Url::parse(&value).map_err(|_| RelayError::InvalidUrl(value.clone()))?
    };

    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(RelayError::InvalidUrl(value));
    }

    Ok(url)
}

/// Returns the inner `url` parameter if `value` is itself a relay proxy URL.
fn nested_relay_target(value: &str, settings: &RelaySettings, base: &Url) -> Option<String> {
    let parsed = base.join(value).ok()?;
    if !settings.proxy_paths.iter().any(|p| p == parsed.path()) {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(k, _)| k == "url")
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Values with a scheme or a literal leading `/` are already plain.
fn decode_if_encoded(value: &str) -> String {
    if value.contains('%') && !value.starts_with('/') && !has_scheme(value) {
        percent_decode_str(value).decode_utf8_lossy().into_owned()
    } else {
        value.to_string()
    }
}

fn has_scheme(value: &str) -> bool {
    match value.split_once(':') {
        Some((scheme, _)) => {
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
