//! HTML link rewriting for generic pages.
//!
//! Every `href`/`src` attribute that points at an absolute path or an
//! absolute http(s) URL is rewritten to route back through the relay, a
//! `<base>` tag pointing at the upstream origin is injected, and a small
//! script forwards anchor clicks to the embedding frame.
//!
//! Known limitations: URLs built at runtime by inline scripts, CSS `url()`
//! references, `srcset` candidates and attributes set from JavaScript are
//! left untouched. The `<base>` tag covers relative references only.

use std::cell::Cell;

use lol_html::html_content::{ContentType, Element};
use lol_html::{element, HtmlRewriter, Settings};
use url::Url;

use crate::relay::error::{RelayError, RelayResult};
use crate::relay::links::RelayBase;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Click interceptor appended to rewritten pages.
///
/// Posts `{type: "linkClick", url}` to the parent frame instead of
/// navigating. Relay links are unwrapped so the parent receives the
/// upstream URL.
pub const LINK_INTERCEPT_SCRIPT: &str = r##"<script>
(function () {
  function upstreamUrl(href) {
    try {
      var parsed = new URL(href, document.baseURI);
      var inner = parsed.searchParams.get("url");
      if (inner && /\/proxy$/.test(parsed.pathname)) { return inner; }
      return parsed.href;
    } catch (e) {
      return href;
    }
  }
  document.addEventListener("click", function (event) {
    var anchor = event.target && event.target.closest ? event.target.closest("a[href]") : null;
    if (!anchor) { return; }
    var href = anchor.getAttribute("href");
    if (!href || href.charAt(0) === "#" || /^javascript:/i.test(href)) { return; }
    event.preventDefault();
    window.parent.postMessage({ type: "linkClick", url: upstreamUrl(anchor.href) }, "*");
  }, true);
})();
</script>"##;

/// Rewrite a full HTML document fetched from `target`.
pub fn rewrite_html(html: &str, target: &Url, relay: &RelayBase) -> RelayResult<String> {
    let base_tag = format!(
        r#"<base href="{}/">"#,
        escape_html(&target.origin().ascii_serialization())
    );
    let head_seen = Cell::new(false);
    let body_seen = Cell::new(false);
    let mut output = Vec::with_capacity(html.len() + LINK_INTERCEPT_SCRIPT.len() + 64);

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("head", |el| {
                    el.prepend(&base_tag, ContentType::Html);
                    head_seen.set(true);
                    Ok(())
                }),
                element!("base", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("[href]", |el| rewrite_attribute(el, "href", target, relay)),
                element!("[src]", |el| rewrite_attribute(el, "src", target, relay)),
                element!("body", |el| {
                    el.append(LINK_INTERCEPT_SCRIPT, ContentType::Html);
                    body_seen.set(true);
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| RelayError::Internal(format!("HTML rewrite failed: {}", e)))?;
    rewriter
        .end()
        .map_err(|e| RelayError::Internal(format!("HTML rewrite failed: {}", e)))?;

    let mut page = String::from_utf8_lossy(&output).into_owned();
    if !head_seen.get() {
        page.insert_str(0, &base_tag);
    }
    if !body_seen.get() {
        page.push_str(LINK_INTERCEPT_SCRIPT);
    }
    Ok(page)
}

/// Rewrite links in an HTML fragment and drop its `<script>` elements.
pub fn sanitize_fragment(html: &str, target: &Url, relay: &RelayBase) -> RelayResult<String> {
    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("[href]", |el| rewrite_attribute(el, "href", target, relay)),
                element!("[src]", |el| rewrite_attribute(el, "src", target, relay)),
            ],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| RelayError::Internal(format!("fragment rewrite failed: {}", e)))?;
    rewriter
        .end()
        .map_err(|e| RelayError::Internal(format!("fragment rewrite failed: {}", e)))?;

    Ok(String::from_utf8_lossy(&output).into_owned())
}

fn rewrite_attribute(
    el: &mut Element<'_, '_>,
    name: &str,
    target: &Url,
    relay: &RelayBase,
) -> HandlerResult {
    if el.tag_name() == "base" {
        return Ok(());
    }
    if let Some(value) = el.get_attribute(name) {
        if let Some(rewritten) = rewrite_reference(&value, target, relay) {
            el.set_attribute(name, &rewritten)?;
        }
    }
    Ok(())
}

/// Relay-routed replacement for a single attribute value, if it needs one.
///
/// - `//host/path` takes the target's scheme and is proxied
/// - `/path` is resolved against the target origin and proxied
/// - `http(s)://...` is proxied unless it already routes through the relay
/// - anything else (relative, fragment, `data:`, `mailto:`) is left alone
pub fn rewrite_reference(value: &str, target: &Url, relay: &RelayBase) -> Option<String> {
    let value = html_escape::decode_html_entities(value.trim()).into_owned();

    let absolute = if let Some(rest) = value.strip_prefix("//") {
        format!("{}://{}", target.scheme(), rest)
    } else if value.starts_with('/') {
        format!("{}{}", target.origin().ascii_serialization(), value)
    } else if has_http_scheme(&value) {
        value
    } else {
        return None;
    };

    if relay.is_relay_link(&absolute) {
        return None;
    }
    Some(relay.link(&absolute))
}

fn has_http_scheme(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Escape text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}
