//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Proxy endpoint behaviour and link rewriting.
    pub relay: RelaySettings,

    /// Outbound request settings.
    pub upstream: UpstreamConfig,

    /// Patent-detail reconstruction and PDF fallback.
    pub patents: PatentConfig,

    /// Upload conversion endpoint.
    pub upload: UploadConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Proxy endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Paths serving the proxy endpoint. The first one is used in rewritten links.
    pub proxy_paths: Vec<String>,

    /// Externally visible base URL (e.g., "https://relay.example.com").
    /// When unset, the base is derived from the inbound request.
    pub public_base_url: Option<String>,

    /// Always build rewritten links with `https`.
    pub force_https: bool,

    /// Origin that absolute-path `url` values resolve against.
    pub default_origin: String,

    /// How many nested relay URLs may be unwrapped from a `url` value.
    pub max_unwrap_depth: usize,

    /// Viewer that office documents are redirected to.
    pub office_viewer_url: String,

    /// File extensions handed to the office viewer.
    pub office_extensions: Vec<String>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            proxy_paths: vec!["/api/proxy".to_string(), "/proxy".to_string()],
            public_base_url: None,
            force_https: false,
            default_origin: "https://patents.google.com".to_string(),
            max_unwrap_depth: 1,
            office_viewer_url: "https://docs.google.com/gview".to_string(),
            office_extensions: vec!["xlsx".to_string(), "doc".to_string(), "docx".to_string()],
        }
    }
}

impl RelaySettings {
    /// Path used when building relay links.
    pub fn primary_proxy_path(&self) -> &str {
        self.proxy_paths
            .first()
            .map(String::as_str)
            .unwrap_or("/api/proxy")
    }
}

/// Outbound request configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub referer: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total time allowed for a single upstream call in seconds.
    pub timeout_secs: u64,

    /// Redirects followed before giving up.
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            referer: "https://patents.google.com/".to_string(),
            connect_timeout_secs: 10,
            timeout_secs: 30,
            max_redirects: 10,
        }
    }
}

/// Patent-detail reconstruction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PatentConfig {
    /// Host whose `/patent/<id>` pages are reconstructed.
    pub host: String,

    /// Asset URL for a patent PDF; `{id}` is replaced with the publication number.
    pub pdf_url_template: String,

    /// Probe the PDF asset before fetching the detail page and redirect to it if present.
    pub prefer_pdf: bool,

    /// Upper bound on carousel images.
    pub max_images: usize,

    /// Text fragments that all appear on a search-shell page.
    pub stub_markers: Vec<String>,
}

impl Default for PatentConfig {
    fn default() -> Self {
        Self {
            host: "patents.google.com".to_string(),
            pdf_url_template: "https://patentimages.storage.googleapis.com/pdfs/{id}.pdf"
                .to_string(),
            prefer_pdf: false,
            max_images: 12,
            stub_markers: vec![
                "Google Patents".to_string(),
                "Search and read the full text of patents".to_string(),
            ],
        }
    }
}

/// Upload endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Paths serving the upload endpoint.
    pub paths: Vec<String>,

    /// Maximum accepted file size in bytes.
    pub max_bytes: usize,

    /// Maximum inflated size of a DOCX document part in bytes.
    pub max_expanded_bytes: usize,

    /// MIME types accepted as-is.
    pub allowed_mime_types: Vec<String>,

    /// Accept `application/octet-stream` uploads.
    pub allow_octet_stream: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            paths: vec!["/api/upload".to_string(), "/upload".to_string()],
            max_bytes: 10 * 1024 * 1024, // 10MB
            max_expanded_bytes: 64 * 1024 * 1024,
            allowed_mime_types: vec![
                "application/pdf".to_string(),
                "application/msword".to_string(),
                crate::convert::DOCX_MIME.to_string(),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
                "text/plain".to_string(),
                "text/html".to_string(),
                "image/png".to_string(),
                "image/jpeg".to_string(),
            ],
            allow_octet_stream: true,
        }
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the relay. `"*"` mirrors any origin.
    pub allowed_origins: Vec<String>,

    /// Send `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "https://projectbayslope.vercel.app".to_string(),
                "http://localhost:3000".to_string(),
            ],
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    /// Returns true if `origin` may call the relay.
    ///
    /// Matching is byte-exact, the same as the CORS layer's origin list.
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed until response headers are produced, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
