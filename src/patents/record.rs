//! Scraped patent fields.

pub const NOT_AVAILABLE: &str = "N/A";
pub const TITLE_PLACEHOLDER: &str = "Title not available";
pub const ABSTRACT_PLACEHOLDER: &str = "Abstract not available.";
pub const DESCRIPTION_PLACEHOLDER: &str = "<p>Description not available.</p>";
pub const CLAIMS_PLACEHOLDER: &str = "<p>Claims not available.</p>";

/// Fields of a patent-detail page.
///
/// Scalar fields always hold either scraped text or a placeholder.
/// `description_html` and `claims_html` are markup fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct PatentRecord {
    pub title: String,
    pub publication_number: String,
    pub abstract_text: String,
    pub inventors: Vec<String>,
    pub assignee: String,
    pub application_number: String,
    pub filing_date: String,
    pub priority_date: String,
    pub publication_date: String,
    pub grant_date: String,
    pub status: String,
    /// Absolute image URLs, bounded by `patents.max_images`.
    pub images: Vec<String>,
    pub classifications: Vec<String>,
    pub description_html: String,
    pub claims_html: String,
    pub citations: Vec<Citation>,
}

impl PatentRecord {
    /// Record with every field at its placeholder.
    pub fn placeholder(publication_number: &str) -> Self {
        Self {
            title: TITLE_PLACEHOLDER.to_string(),
            publication_number: publication_number.to_string(),
            abstract_text: ABSTRACT_PLACEHOLDER.to_string(),
            inventors: Vec::new(),
            assignee: NOT_AVAILABLE.to_string(),
            application_number: NOT_AVAILABLE.to_string(),
            filing_date: NOT_AVAILABLE.to_string(),
            priority_date: NOT_AVAILABLE.to_string(),
            publication_date: NOT_AVAILABLE.to_string(),
            grant_date: NOT_AVAILABLE.to_string(),
            status: NOT_AVAILABLE.to_string(),
            images: Vec::new(),
            classifications: Vec::new(),
            description_html: DESCRIPTION_PLACEHOLDER.to_string(),
            claims_html: CLAIMS_PLACEHOLDER.to_string(),
            citations: Vec::new(),
        }
    }

    /// Comma-separated inventors, or the placeholder.
    pub fn inventors_display(&self) -> String {
        if self.inventors.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.inventors.join(", ")
        }
    }
}

/// A cited patent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub publication_number: String,
    pub title: String,
    /// Upstream URL of the cited patent page.
    pub url: String,
}
