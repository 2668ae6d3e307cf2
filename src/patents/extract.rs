//! Field extraction from a patent-detail page.
//!
//! Each field has a prioritized list of candidate selectors. The first
//! candidate producing a non-empty value wins; when none does, the field
//! keeps its placeholder. Invalid selectors are skipped, never fatal.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::patents::record::{Citation, PatentRecord};

/// Where a candidate reads its value from.
#[derive(Debug, Clone, Copy)]
enum Source {
    /// Whitespace-normalized text content.
    Text(&'static str),
    /// Attribute value.
    Attr(&'static str, &'static str),
    /// Inner markup.
    Markup(&'static str),
}

const TITLE: &[Source] = &[
    Source::Text("h1#title"),
    Source::Attr("meta[name='DC.title']", "content"),
    Source::Attr("meta[property='og:title']", "content"),
    Source::Text("title"),
];

const PUBLICATION_NUMBER: &[Source] = &[
    Source::Text("dd[itemprop='publicationNumber']"),
    Source::Attr("meta[name='citation_patent_number']", "content"),
];

const ABSTRACT: &[Source] = &[
    Source::Text("section[itemprop='abstract'] div.abstract"),
    Source::Text("div.abstract"),
    Source::Text("abstract"),
    Source::Attr("meta[name='DC.description']", "content"),
    Source::Attr("meta[name='description']", "content"),
];

const INVENTORS: &[Source] = &[
    Source::Text("dd[itemprop='inventor']"),
    Source::Attr("meta[name='DC.contributor'][scheme='inventor']", "content"),
];

const ASSIGNEE: &[Source] = &[
    Source::Text("dd[itemprop='assigneeCurrent']"),
    Source::Text("dd[itemprop='assigneeOriginal']"),
    Source::Attr("meta[name='DC.contributor'][scheme='assignee']", "content"),
];

const APPLICATION_NUMBER: &[Source] = &[
    Source::Text("dd[itemprop='applicationNumber']"),
    Source::Attr("meta[name='citation_application_number']", "content"),
];

const FILING_DATE: &[Source] = &[
    Source::Text("time[itemprop='filingDate']"),
    Source::Attr("meta[name='DC.date'][scheme='dateSubmitted']", "content"),
];

const PRIORITY_DATE: &[Source] = &[Source::Text("time[itemprop='priorityDate']")];

const PUBLICATION_DATE: &[Source] = &[
    Source::Text("time[itemprop='publicationDate']"),
    Source::Attr("meta[name='citation_publication_date']", "content"),
];

const GRANT_DATE: &[Source] = &[
    Source::Text("time[itemprop='grantDate']"),
    Source::Attr("meta[name='citation_grant_date']", "content"),
];

const STATUS: &[Source] = &[
    Source::Text("dd[itemprop='legalStatusIfi'] span[itemprop='status']"),
    Source::Text("span[itemprop='status']"),
];

const IMAGES: &[Source] = &[
    Source::Attr("meta[itemprop='full']", "content"),
    Source::Attr("li[itemprop='images'] img", "src"),
    Source::Attr("img[itemprop='thumbnail']", "src"),
];

const CLASSIFICATIONS: &[Source] = &[
    Source::Text("ul[itemprop='classifications'] span[itemprop='Code']"),
    Source::Text("span[itemprop='Code']"),
];

const DESCRIPTION: &[Source] = &[
    Source::Markup("section[itemprop='description'] div.description"),
    Source::Markup("section[itemprop='description']"),
    Source::Markup("div.description"),
];

const CLAIMS: &[Source] = &[
    Source::Markup("section[itemprop='claims'] div.claims"),
    Source::Markup("section[itemprop='claims']"),
    Source::Markup("div.claims"),
];

const CITATION_ROWS: &[&str] = &[
    "tr[itemprop='backwardReferences']",
    "tr[itemprop='backwardReferencesOrig']",
    "tr[itemprop='backwardReferencesFamily']",
];

const MAX_CLASSIFICATIONS: usize = 24;
const MAX_CITATIONS: usize = 50;

/// Extract a [`PatentRecord`] from the page at `page_url`.
///
/// `publication_number` (taken from the URL) is used when the page does not
/// state one.
pub fn extract_record(
    html: &str,
    page_url: &Url,
    publication_number: &str,
    max_images: usize,
) -> PatentRecord {
    let document = Html::parse_document(html);
    let mut record = PatentRecord::placeholder(publication_number);

    let fill = |slot: &mut String, candidates: &[Source]| {
        if let Some(value) = first_value(&document, candidates) {
            *slot = value;
        }
    };

    fill(&mut record.title, TITLE);
    fill(&mut record.publication_number, PUBLICATION_NUMBER);
    fill(&mut record.abstract_text, ABSTRACT);
    fill(&mut record.assignee, ASSIGNEE);
    fill(&mut record.application_number, APPLICATION_NUMBER);
    fill(&mut record.filing_date, FILING_DATE);
    fill(&mut record.priority_date, PRIORITY_DATE);
    fill(&mut record.publication_date, PUBLICATION_DATE);
    fill(&mut record.grant_date, GRANT_DATE);
    fill(&mut record.status, STATUS);
    fill(&mut record.description_html, DESCRIPTION);
    fill(&mut record.claims_html, CLAIMS);

    record.inventors = all_values(&document, INVENTORS, usize::MAX);
    record.classifications = all_values(&document, CLASSIFICATIONS, MAX_CLASSIFICATIONS);
    record.images = all_values(&document, IMAGES, usize::MAX)
        .into_iter()
        .filter_map(|src| page_url.join(&src).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(String::from)
        .fold(Vec::new(), |mut acc, url| {
            if acc.len() < max_images && !acc.contains(&url) {
                acc.push(url);
            }
            acc
        });
    record.citations = citations(&document, page_url);

    record
}

/// Value of the first candidate that yields non-empty content.
fn first_value(document: &Html, candidates: &[Source]) -> Option<String> {
    candidates.iter().find_map(|source| {
        let selector = Selector::parse(selector_of(source)).ok()?;
        document
            .select(&selector)
            .filter_map(|el| read(el, source))
            .next()
    })
}

/// Every value of the first candidate that yields any, deduplicated in order.
fn all_values(document: &Html, candidates: &[Source], limit: usize) -> Vec<String> {
    for source in candidates {
        let Ok(selector) = Selector::parse(selector_of(source)) else {
            continue;
        };
        let mut values: Vec<String> = Vec::new();
        for value in document.select(&selector).filter_map(|el| read(el, source)) {
            if values.len() >= limit {
                break;
            }
            if !values.contains(&value) {
                values.push(value);
            }
        }
        if !values.is_empty() {
            return values;
        }
    }
    Vec::new()
}

fn citations(document: &Html, page_url: &Url) -> Vec<Citation> {
    let (Ok(number_sel), Ok(title_sel), Ok(link_sel)) = (
        Selector::parse("span[itemprop='publicationNumber']"),
        Selector::parse("td[itemprop='title']"),
        Selector::parse("a[href]"),
    ) else {
        return Vec::new();
    };

    let mut found: Vec<Citation> = Vec::new();
    for row_selector in CITATION_ROWS {
        let Ok(row_sel) = Selector::parse(row_selector) else {
            continue;
        };
        for row in document.select(&row_sel) {
            if found.len() >= MAX_CITATIONS {
                return found;
            }
            let Some(number) = row.select(&number_sel).next().map(normalized_text) else {
                continue;
            };
            if number.is_empty() || found.iter().any(|c| c.publication_number == number) {
                continue;
            }
            let title = row
                .select(&title_sel)
                .next()
                .map(normalized_text)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| number.clone());
            let url = row
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| page_url.join(href).ok())
                .or_else(|| page_url.join(&format!("/patent/{}", number)).ok())
                .map(String::from)
                .unwrap_or_default();
            found.push(Citation {
                publication_number: number,
                title,
                url,
            });
        }
    }
    found
}

fn selector_of(source: &Source) -> &'static str {
    match *source {
        Source::Text(s) | Source::Attr(s, _) | Source::Markup(s) => s,
    }
}

fn read(el: ElementRef<'_>, source: &Source) -> Option<String> {
    let value = match *source {
        Source::Text(_) => normalized_text(el),
        Source::Attr(_, attr) => el.value().attr(attr).map(collapse_whitespace)?,
        Source::Markup(_) => el.inner_html().trim().to_string(),
    };
    (!value.is_empty()).then_some(value)
}

fn normalized_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patents::record::{ABSTRACT_PLACEHOLDER, CLAIMS_PLACEHOLDER, NOT_AVAILABLE};

    const DETAIL_PAGE: &str = r#"<html><head>
        <title>US7654321B2 - Widget assembly - Google Patents</title>
        <meta name="DC.title" content="Widget assembly">
        <meta name="DC.contributor" content="Jane Roe" scheme="inventor">
        <meta itemprop="full" content="https://patentimages.storage.googleapis.com/a/US7654321-1.png">
        <meta itemprop="full" content="https://patentimages.storage.googleapis.com/a/US7654321-2.png">
        <meta itemprop="full" content="https://patentimages.storage.googleapis.com/a/US7654321-2.png">
        </head><body>
        <h1 id="title">  Widget
            assembly </h1>
        <section itemprop="abstract"><div class="abstract">A widget that   assembles.</div></section>
        <dl>
          <dd itemprop="publicationNumber">US7654321B2</dd>
          <dd itemprop="inventor">Jane Roe</dd>
          <dd itemprop="inventor">John Doe</dd>
          <dd itemprop="assigneeCurrent">Acme Corp</dd>
          <dd itemprop="applicationNumber">US11/123,456</dd>
          <dd itemprop="legalStatusIfi"><span itemprop="status">Active</span></dd>
        </dl>
        <time itemprop="priorityDate">2005-01-02</time>
        <time itemprop="filingDate">2006-01-02</time>
        <time itemprop="publicationDate">2010-02-02</time>
        <time itemprop="grantDate">2010-02-02</time>
        <ul itemprop="classifications"><li><span itemprop="Code">B25J</span></li><li><span itemprop="Code">B25J9/00</span></li></ul>
        <section itemprop="description"><div class="description"><p>Long text.</p></div></section>
        <section itemprop="claims"><div class="claims"><div class="claim">1. A widget.</div></div></section>
        <table>
          <tr itemprop="backwardReferences">
            <td><a href="/patent/US5000000A/en"><span itemprop="publicationNumber">US5000000A</span></a></td>
            <td itemprop="title">Earlier widget </td>
          </tr>
          <tr itemprop="backwardReferences">
            <td><span itemprop="publicationNumber">US4000000A</span></td>
          </tr>
        </table>
        </body></html>"#;

    fn page_url() -> Url {
        Url::parse("https://patents.google.com/patent/US7654321B2/en").unwrap()
    }

    #[test]
    fn test_extracts_detail_page() {
        let record = extract_record(DETAIL_PAGE, &page_url(), "US7654321B2", 12);

        assert_eq!(record.title, "Widget assembly");
        assert_eq!(record.publication_number, "US7654321B2");
        assert_eq!(record.abstract_text, "A widget that assembles.");
        assert_eq!(record.inventors, vec!["Jane Roe", "John Doe"]);
        assert_eq!(record.assignee, "Acme Corp");
        assert_eq!(record.application_number, "US11/123,456");
        assert_eq!(record.priority_date, "2005-01-02");
        assert_eq!(record.filing_date, "2006-01-02");
        assert_eq!(record.grant_date, "2010-02-02");
        assert_eq!(record.status, "Active");
        assert_eq!(record.classifications, vec!["B25J", "B25J9/00"]);
        assert_eq!(record.images.len(), 2);
        assert!(record.description_html.contains("<p>Long text.</p>"));
        assert!(record.claims_html.contains("1. A widget."));
    }

    #[test]
    fn test_citations() {
        let record = extract_record(DETAIL_PAGE, &page_url(), "US7654321B2", 12);
        assert_eq!(record.citations.len(), 2);
        assert_eq!(record.citations[0].publication_number, "US5000000A");
        assert_eq!(record.citations[0].title, "Earlier widget");
        assert_eq!(
            record.citations[0].url,
            "https://patents.google.com/patent/US5000000A/en"
        );
        assert_eq!(record.citations[1].title, "US4000000A");
        assert_eq!(
            record.citations[1].url,
            "https://patents.google.com/patent/US4000000A"
        );
    }

    #[test]
    fn test_missing_fields_fall_back_to_placeholders() {
        let record = extract_record(
            "<html><body><p>nothing here</p></body></html>",
            &page_url(),
            "US7654321B2",
            12,
        );
        assert_eq!(record.abstract_text, ABSTRACT_PLACEHOLDER);
        assert_eq!(record.publication_number, "US7654321B2");
        assert_eq!(record.assignee, NOT_AVAILABLE);
        assert_eq!(record.claims_html, CLAIMS_PLACEHOLDER);
        assert!(record.inventors.is_empty());
        assert!(record.images.is_empty());
        assert!(record.citations.is_empty());
    }

    #[test]
    fn test_later_candidate_used_when_first_is_empty() {
        let html = r#"<html><head><meta name="DC.description" content="From meta."></head>
            <body><div class="abstract">   </div></body></html>"#;
        let record = extract_record(html, &page_url(), "X1", 12);
        assert_eq!(record.abstract_text, "From meta.");
    }

    #[test]
    fn test_images_are_resolved_and_bounded() {
        let html = r#"<html><body><ul>
            <li itemprop="images"><img src="/img/1.png"></li>
            <li itemprop="images"><img src="//cdn.example.com/2.png"></li>
            <li itemprop="images"><img src="https://cdn.example.com/3.png"></li>
            <li itemprop="images"><img src="data:image/png;base64,AAAA"></li>
            </ul></body></html>"#;
        let record = extract_record(html, &page_url(), "X1", 2);
        assert_eq!(
            record.images,
            vec![
                "https://patents.google.com/img/1.png".to_string(),
                "https://cdn.example.com/2.png".to_string(),
            ]
        );
    }
}
