//! Patent-detail page detection.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::PatentConfig;
use crate::relay::error::{RelayError, RelayResult};

static PATENT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^/patent/([A-Z0-9]+)").expect("patent path pattern"));

/// Publication number of a patent-detail URL on the configured host.
pub fn patent_id(url: &Url, config: &PatentConfig) -> Option<String> {
    let host = url.host_str()?;
    if !host.eq_ignore_ascii_case(&config.host) {
        return None;
    }
    PATENT_PATH
        .captures(url.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// True when `html` is the search shell served instead of a detail page.
pub fn is_search_shell(html: &str, config: &PatentConfig) -> bool {
    !config.stub_markers.is_empty()
        && config
            .stub_markers
            .iter()
            .all(|marker| html.contains(marker.as_str()))
}

/// Direct PDF asset URL for a publication number.
pub fn pdf_url(id: &str, config: &PatentConfig) -> RelayResult<Url> {
    let raw = config.pdf_url_template.replace("{id}", id);
    Url::parse(&raw).map_err(|e| RelayError::Internal(format!("PDF URL '{}': {}", raw, e)))
}
