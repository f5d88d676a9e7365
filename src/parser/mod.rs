//! Page parsing and record extraction
//!
//! Extractors turn one fetched page into candidate records plus the
//! pagination metadata the driver needs. They never fail on missing
//! optional fields, only on documents that cannot be interpreted at all.

pub mod html;
pub mod listing;
pub mod sanitize;
pub mod selectors;
pub mod xml;

pub use html::HtmlReviewExtractor;
pub use listing::{ListingEntry, ListingExtractor, ListingPage};
pub use xml::XmlCommentExtractor;

use crate::models::{CandidateRecord, PageCursor};
use crate::utils::error::ParseError;

/// Raw content of one fetched page
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Cursor that produced this page
    pub cursor: PageCursor,
    /// URL actually fetched (after redirects)
    pub url: String,
    pub body: String,
}

impl RawPage {
    pub fn new(cursor: PageCursor, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            cursor,
            url: url.into(),
            body: body.into(),
        }
    }
}

/// Result of extracting one page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub candidates: Vec<CandidateRecord>,
    /// Parent display name, when the page carries one
    pub parent_name: Option<String>,
    /// Where to resume; `None` on the terminal page
    pub next_cursor: Option<PageCursor>,
}

/// Parses raw page content into candidate records
pub trait RecordExtractor: Send + Sync {
    /// Extract candidates and pagination metadata from a page
    ///
    /// # Errors
    ///
    /// Returns `ParseError` only for fundamentally malformed documents
    fn extract(&self, page: &RawPage) -> Result<ExtractedPage, ParseError>;
}
