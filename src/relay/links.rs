//! Relay link construction.
//!
//! A [`RelayBase`] knows where the relay is reachable from the client's
//! point of view and turns upstream URLs into relay-routed ones.

use axum::http::{header, HeaderMap};
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::config::RelaySettings;

/// Characters left intact by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a value for use inside a query component.
pub fn encode_component(value: &str) -> String {
    percent_encode(value.as_bytes(), URI_COMPONENT).to_string()
}

/// The externally visible relay origin plus the proxy path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayBase {
    /// Scheme and authority, without a trailing slash (e.g., "https://relay.example").
    origin: String,
    proxy_path: String,
    proxy_paths: Vec<String>,
}

impl RelayBase {
    pub fn new(origin: impl Into<String>, settings: &RelaySettings) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            proxy_path: settings.primary_proxy_path().to_string(),
            proxy_paths: settings.proxy_paths.clone(),
        }
    }

    /// Derive the base from configuration or the inbound request.
    ///
    /// `public_base_url` wins. Otherwise the scheme comes from
    /// `X-Forwarded-Proto`, then the listener's TLS state, and the host from
    /// `X-Forwarded-Host`, then `Host`. `force_https` overrides the scheme.
    pub fn from_request(headers: &HeaderMap, settings: &RelaySettings, tls: bool) -> Self {
        if let Some(public) = &settings.public_base_url {
            return Self::new(public.clone(), settings);
        }

        let forwarded_proto = header_str(headers, "x-forwarded-proto")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase());
        let scheme = if settings.force_https {
            "https".to_string()
        } else {
            match forwarded_proto.as_deref() {
                Some("https") => "https".to_string(),
                Some("http") => "http".to_string(),
                _ if tls => "https".to_string(),
                _ => "http".to_string(),
            }
        };

        let host = header_str(headers, "x-forwarded-host")
            .and_then(|v| v.split(',').next())
            .or_else(|| header_str(headers, header::HOST.as_str()))
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| "localhost".to_string());

        Self::new(format!("{}://{}", scheme, host), settings)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Relay URL that fetches `target` when followed.
    pub fn link(&self, target: &str) -> String {
        format!(
            "{}{}?url={}",
            self.origin,
            self.proxy_path,
            encode_component(target)
        )
    }

    /// Returns true if `candidate` already routes through this relay.
    pub fn is_relay_link(&self, candidate: &str) -> bool {
        if candidate.starts_with(&format!("{}{}", self.origin, self.proxy_path)) {
            return true;
        }
        let (Ok(candidate), Ok(own)) = (Url::parse(candidate), Url::parse(&self.origin)) else {
            return false;
        };
        candidate.host_str() == own.host_str()
            && candidate.port_or_known_default() == own.port_or_known_default()
            && self.proxy_paths.iter().any(|p| p == candidate.path())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_encode_component_matches_browser() {
        assert_eq!(
            encode_component("https://a.com/p?q=1&r=a b"),
            "https%3A%2F%2Fa.com%2Fp%3Fq%3D1%26r%3Da%20b"
        );
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)"), "a-b_c.d!e~f*g'h(i)");
    }

    #[test]
    fn test_base_mirrors_request() {
        let settings = RelaySettings::default();
        let base = RelayBase::from_request(&headers(&[("host", "relay.local:3001")]), &settings, false);
        assert_eq!(base.origin(), "http://relay.local:3001");

        let tls = RelayBase::from_request(&headers(&[("host", "relay.local")]), &settings, true);
        assert_eq!(tls.origin(), "https://relay.local");
    }

    #[test]
    fn test_forwarded_headers_win() {
        let settings = RelaySettings::default();
        let base = RelayBase::from_request(
            &headers(&[
                ("host", "10.0.0.5:3001"),
                ("x-forwarded-proto", "https"),
                ("x-forwarded-host", "relay.example"),
            ]),
            &settings,
            false,
        );
        assert_eq!(base.origin(), "https://relay.example");
    }

    #[test]
    fn test_public_base_and_force_https() {
        let mut settings = RelaySettings::default();
        settings.force_https = true;
        let forced = RelayBase::from_request(&headers(&[("host", "relay.local")]), &settings, false);
        assert_eq!(forced.origin(), "https://relay.local");

        settings.public_base_url = Some("https://public.example/".into());
        let public = RelayBase::from_request(&headers(&[("host", "relay.local")]), &settings, false);
        assert_eq!(public.origin(), "https://public.example");
    }

    #[test]
    fn test_link_and_detection() {
        let base = RelayBase::new("http://relay.local:3001", &RelaySettings::default());
        let link = base.link("https://example.com/a?b=1");
        assert_eq!(
            link,
            "http://relay.local:3001/api/proxy?url=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1"
        );
        assert!(base.is_relay_link(&link));
        assert!(base.is_relay_link("http://relay.local:3001/proxy?url=x"));
        assert!(!base.is_relay_link("https://example.com/api/proxy?url=x"));
        assert!(!base.is_relay_link("http://relay.local:3001/other"));
    }
}
