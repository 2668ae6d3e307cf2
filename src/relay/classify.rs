//! Response classification by content type and URL shape.

use url::Url;

use crate::relay::links::encode_component;

/// Content type assumed when upstream omits one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// How an upstream body is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Rewritten or reconstructed.
    Html,
    /// Forwarded verbatim.
    Passthrough,
}

/// Classify a `content-type` header value.
pub fn classify(content_type: &str) -> ContentKind {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "text/html" | "application/xhtml+xml" => ContentKind::Html,
        _ => ContentKind::Passthrough,
    }
}

/// Extension of the last path segment if it is one of `extensions`.
pub fn office_extension<'a>(url: &Url, extensions: &'a [String]) -> Option<&'a str> {
    let segment = url.path_segments()?.next_back()?;
    let (_, ext) = segment.rsplit_once('.')?;
    extensions
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(ext))
        .map(String::as_str)
}

/// Embedded document-viewer URL for `target`.
pub fn office_viewer_url(viewer: &str, target: &Url) -> String {
    format!(
        "{}?url={}&embedded=true",
        viewer,
        encode_component(target.as_str())
    )
}
