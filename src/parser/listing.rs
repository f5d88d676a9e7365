//! Business listing page extraction
//!
//! Listing pages are sorted by review count, descending. The first business
//! showing zero reviews marks the end of everything worth harvesting, so
//! extraction stops there and reports it.

use scraper::Html;
use url::Url;

use crate::config::HtmlSourceConfig;
use crate::error::Result;
use crate::parser::html::{element_text, next_page_url};
use crate::parser::sanitize::non_empty;
use crate::parser::selectors::ListingSelectors;
use crate::utils::error::ParseError;
use crate::utils::{normalize_whitespace, parse_count};

/// One business found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub url: String,
    pub review_count: u64,
}

/// Result of extracting one listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Entries before the first zero-review business, in page order
    pub entries: Vec<ListingEntry>,
    /// A zero-review business was seen; the walk must stop
    pub reached_zero: bool,
    pub next_url: Option<String>,
}

/// Extracts businesses and their review counts from listing pages
pub struct ListingExtractor {
    selectors: ListingSelectors,
}

impl ListingExtractor {
    #[must_use]
    pub fn new(selectors: ListingSelectors) -> Self {
        Self { selectors }
    }

    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a selector does not compile
    pub fn from_config(config: &HtmlSourceConfig) -> Result<Self> {
        Ok(Self::new(ListingSelectors::from_config(config)?))
    }

    /// Extract entries from one listing page
    ///
    /// # Errors
    ///
    /// Returns `ParseError::EmptyDocument` for an empty body and
    /// `ParseError::InvalidUrl` when `page_url` cannot be parsed
    pub fn extract(&self, body: &str, page_url: &str) -> std::result::Result<ListingPage, ParseError> {
        if body.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }

        let base =
            Url::parse(page_url).map_err(|e| ParseError::InvalidUrl(format!("{page_url}: {e}")))?;
        let document = Html::parse_document(body);

        let mut page = ListingPage::default();

        for item in document.select(&self.selectors.item) {
            // A missing or unparseable count ("No reviews yet") means zero
            let review_count = item
                .select(&self.selectors.review_count)
                .next()
                .and_then(|el| parse_count(&element_text(el)))
                .unwrap_or(0);

            if review_count == 0 {
                page.reached_zero = true;
                break;
            }

            let Some(link) = item.select(&self.selectors.link).next() else {
                tracing::debug!("Listing item without a link, skipping");
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Ok(url) = base.join(href.trim()) else {
                tracing::debug!(href, "Unresolvable listing link, skipping");
                continue;
            };
            let name = non_empty(&normalize_whitespace(&element_text(link))).unwrap_or_else(|| url.to_string());

            page.entries.push(ListingEntry {
                name,
                url: url.to_string(),
                review_count,
            });
        }

        if !page.reached_zero {
            page.next_url = next_page_url(&document, &self.selectors.next_link, page_url)?;
        }

        Ok(page)
    }
}
