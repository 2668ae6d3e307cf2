//! Patent-detail reconstruction subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream HTML for /patent/<id>
//!     → detect.rs (is this a detail page? a search shell? where is the PDF?)
//!     → extract.rs (prioritized selector candidates → PatentRecord)
//!     → render.rs (two-column document, carousel.rs for figure navigation)
//!     → Response as text/html
//! ```
//!
//! # Design Decisions
//! - Extraction never fails; missing fields keep their placeholders
//! - Scraped text is escaped, scraped markup is stripped of scripts
//! - The rendered page never navigates itself; it posts `linkClick` messages

pub mod carousel;
pub mod detect;
pub mod extract;
pub mod record;
pub mod render;

pub use detect::{is_search_shell, patent_id, pdf_url};
pub use extract::extract_record;
pub use record::{Citation, PatentRecord};
pub use render::{render_patent_page, RenderContext};
