//! Self-contained HTML document for a reconstructed patent page.
//!
//! Layout: primary column (title, abstract, carousel, description, claims,
//! citations) and a metadata sidebar. Navigation never happens inside the
//! document; every control posts `{type: "linkClick", url}` to the parent.

use std::fmt::Write;

use url::Url;

use crate::patents::carousel::{Carousel, CAROUSEL_SCRIPT};
use crate::patents::record::{PatentRecord, CLAIMS_PLACEHOLDER, DESCRIPTION_PLACEHOLDER};
use crate::relay::links::RelayBase;
use crate::relay::rewrite::{escape_html, sanitize_fragment, LINK_INTERCEPT_SCRIPT};

const STYLE: &str = r#"<style>
  * { box-sizing: border-box; }
  body { margin: 0; font-family: -apple-system, "Segoe UI", Roboto, Arial, sans-serif; color: #202124; background: #f8f9fa; }
  .layout { display: flex; gap: 24px; max-width: 1200px; margin: 0 auto; padding: 24px; }
  .primary { flex: 3; min-width: 0; }
  .sidebar { flex: 1; min-width: 240px; background: #fff; border: 1px solid #dadce0; border-radius: 8px; padding: 16px; align-self: flex-start; }
  .sidebar dt { font-size: 12px; color: #5f6368; text-transform: uppercase; margin-top: 12px; }
  .sidebar dd { margin: 2px 0 0; }
  h1 { font-size: 24px; margin: 0 0 4px; }
  .number { color: #5f6368; margin-bottom: 16px; }
  section { background: #fff; border: 1px solid #dadce0; border-radius: 8px; padding: 16px; margin-bottom: 16px; }
  section h2 { font-size: 18px; margin-top: 0; }
  .actions { display: flex; gap: 8px; margin-bottom: 16px; }
  .actions button { padding: 8px 14px; border: 1px solid #1a73e8; background: #1a73e8; color: #fff; border-radius: 4px; cursor: pointer; }
  .carousel { position: relative; text-align: center; }
  .carousel-slide { display: none; }
  .carousel-slide.active { display: block; }
  .carousel-slide img { max-width: 100%; max-height: 480px; }
  .carousel-controls { display: flex; justify-content: center; align-items: center; gap: 12px; margin-top: 8px; }
  .carousel-controls button { padding: 4px 12px; cursor: pointer; }
  .tags span { display: inline-block; background: #e8f0fe; color: #1967d2; border-radius: 12px; padding: 2px 10px; margin: 2px; font-size: 12px; }
  @media (max-width: 800px) { .layout { flex-direction: column; } }
</style>"#;

const ACTION_SCRIPT: &str = r#"<script>
(function () {
  document.querySelectorAll("[data-link]").forEach(function (el) {
    el.addEventListener("click", function () {
      window.parent.postMessage({ type: "linkClick", url: el.getAttribute("data-link") }, "*");
    });
  });
})();
</script>"#;

/// Inputs besides the record itself.
pub struct RenderContext<'a> {
    pub relay: &'a RelayBase,
    /// Upstream URL the record was scraped from.
    pub page_url: &'a Url,
    pub pdf_url: Option<&'a Url>,
}

/// Render the reconstructed document.
pub fn render_patent_page(record: &PatentRecord, ctx: &RenderContext<'_>) -> String {
    let mut page = String::with_capacity(
        record.description_html.len() + record.claims_html.len() + 16 * 1024,
    );

    let _ = write!(
        page,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{} - {}</title>{}</head><body><div class=\"layout\"><main class=\"primary\">",
        escape_html(&record.publication_number),
        escape_html(&record.title),
        STYLE,
    );

    let _ = write!(
        page,
        "<h1>{}</h1><div class=\"number\">{}</div>",
        escape_html(&record.title),
        escape_html(&record.publication_number),
    );

    page.push_str("<div class=\"actions\">");
    let _ = write!(
        page,
        "<button type=\"button\" data-link=\"{}\">Open original</button>",
        escape_html(ctx.page_url.as_str())
    );
    if let Some(pdf) = ctx.pdf_url {
        let _ = write!(
            page,
            "<button type=\"button\" data-link=\"{}\">View PDF</button>",
            escape_html(pdf.as_str())
        );
    }
    page.push_str("</div>");

    let _ = write!(
        page,
        "<section><h2>Abstract</h2><p>{}</p></section>",
        escape_html(&record.abstract_text)
    );

    render_carousel(&mut page, record, ctx.relay);

    let description = fragment_or(&record.description_html, DESCRIPTION_PLACEHOLDER, ctx);
    let _ = write!(page, "<section><h2>Description</h2>{}</section>", description);

    let claims = fragment_or(&record.claims_html, CLAIMS_PLACEHOLDER, ctx);
    let _ = write!(page, "<section><h2>Claims</h2>{}</section>", claims);

    render_citations(&mut page, record, ctx.relay);

    page.push_str("</main>");
    render_sidebar(&mut page, record);
    page.push_str("</div>");

    page.push_str(LINK_INTERCEPT_SCRIPT);
    page.push_str(ACTION_SCRIPT);
    if Carousel::new(record.images.len()).shows_controls() {
        page.push_str(CAROUSEL_SCRIPT);
    }
    page.push_str("</body></html>");
    page
}

fn render_carousel(page: &mut String, record: &PatentRecord, relay: &RelayBase) {
    let carousel = Carousel::new(record.images.len());
    page.push_str("<section><h2>Images</h2>");
    if carousel.is_empty() {
        page.push_str("<p>No images available.</p></section>");
        return;
    }

    page.push_str("<div class=\"carousel\">");
    for (i, image) in record.images.iter().enumerate() {
        let _ = write!(
            page,
            "<div class=\"carousel-slide{}\"><img src=\"{}\" alt=\"Figure {}\" loading=\"lazy\"></div>",
            if i == carousel.index() { " active" } else { "" },
            escape_html(&relay.link(image)),
            i + 1,
        );
    }
    if carousel.shows_controls() {
        let _ = write!(
            page,
            "<div class=\"carousel-controls\">\
             <button type=\"button\" class=\"carousel-prev\" onclick=\"moveSlide(-1)\">&#8249;</button>\
             <span id=\"carousel-counter\">1 / {}</span>\
             <button type=\"button\" class=\"carousel-next\" onclick=\"moveSlide(1)\">&#8250;</button>\
             </div>",
            carousel.len()
        );
    }
    page.push_str("</div></section>");
}

fn render_citations(page: &mut String, record: &PatentRecord, relay: &RelayBase) {
    if record.citations.is_empty() {
        return;
    }
    page.push_str("<section><h2>Cited by this patent</h2><ul class=\"citations\">");
    for citation in &record.citations {
        let href = if citation.url.is_empty() {
            "#".to_string()
        } else {
            relay.link(&citation.url)
        };
        let _ = write!(
            page,
            "<li><a href=\"{}\">{}</a> {}</li>",
            escape_html(&href),
            escape_html(&citation.publication_number),
            escape_html(&citation.title),
        );
    }
    page.push_str("</ul></section>");
}

fn render_sidebar(page: &mut String, record: &PatentRecord) {
    page.push_str("<aside class=\"sidebar\"><dl>");
    let rows = [
        ("Publication number", record.publication_number.clone()),
        ("Status", record.status.clone()),
        ("Inventors", record.inventors_display()),
        ("Assignee", record.assignee.clone()),
        ("Application number", record.application_number.clone()),
        ("Priority date", record.priority_date.clone()),
        ("Filing date", record.filing_date.clone()),
        ("Publication date", record.publication_date.clone()),
        ("Grant date", record.grant_date.clone()),
    ];
    for (label, value) in rows {
        let _ = write!(page, "<dt>{}</dt><dd>{}</dd>", label, escape_html(&value));
    }
    page.push_str("</dl>");

    if !record.classifications.is_empty() {
        page.push_str("<h3>Classifications</h3><div class=\"tags\">");
        for code in &record.classifications {
            let _ = write!(page, "<span>{}</span>", escape_html(code));
        }
        page.push_str("</div>");
    }
    page.push_str("</aside>");
}

fn fragment_or(fragment: &str, placeholder: &str, ctx: &RenderContext<'_>) -> String {
    if fragment == placeholder {
        return placeholder.to_string();
    }
    match sanitize_fragment(fragment, ctx.page_url, ctx.relay) {
        Ok(clean) => clean,
        Err(e) => {
            tracing::warn!(page = %ctx.page_url, error = %e, "Dropping unparsable fragment");
            placeholder.to_string()
        }
    }
}
