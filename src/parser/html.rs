//! Review extraction for the HTML business-review site
//!
//! One business detail page holds a list of review blocks, the business name
//! in a heading, and a pagination control pointing at the next page.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::HtmlSourceConfig;
use crate::error::Result;
use crate::models::{CandidateRecord, PageCursor, Rating};
use crate::parser::sanitize::non_empty;
use crate::parser::selectors::ReviewSelectors;
use crate::parser::{ExtractedPage, RawPage, RecordExtractor};
use crate::utils::error::ParseError;
use crate::utils::{first_number, normalize_whitespace};

/// Extracts reviews from business detail pages
pub struct HtmlReviewExtractor {
    selectors: ReviewSelectors,
    rating_divisor: f64,
}

impl HtmlReviewExtractor {
    #[must_use]
    pub fn new(selectors: ReviewSelectors, rating_divisor: f64) -> Self {
        Self {
            selectors,
            rating_divisor,
        }
    }

    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a selector does not compile
    pub fn from_config(config: &HtmlSourceConfig) -> Result<Self> {
        Ok(Self::new(
            ReviewSelectors::from_config(config)?,
            config.rating_divisor,
        ))
    }

    fn extract_candidate(&self, item: ElementRef<'_>) -> CandidateRecord {
        CandidateRecord {
            rating: self.extract_rating(item),
            title: first_text(item, &self.selectors.title),
            body: first_text(item, &self.selectors.body),
        }
    }

    /// Read the rating either from an attribute (e.g. `class="rating-45"`)
    /// or from the element text
    fn extract_rating(&self, item: ElementRef<'_>) -> Option<Rating> {
        let element = item.select(&self.selectors.rating).next()?;

        match &self.selectors.rating_attr {
            Some(attr) => {
                let value = element.value().attr(attr)?;
                match first_number(value) {
                    Some(n) => Some(Rating::Numeric(n / self.rating_divisor)),
                    None => Rating::parse(value),
                }
            }
            None => {
                let text = element_text(element);
                Rating::parse(&text)
            }
        }
    }
}

impl RecordExtractor for HtmlReviewExtractor {
    fn extract(&self, page: &RawPage) -> std::result::Result<ExtractedPage, ParseError> {
        if page.body.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }

        let document = Html::parse_document(&page.body);

        let candidates: Vec<CandidateRecord> = document
            .select(&self.selectors.item)
            .map(|item| self.extract_candidate(item))
            .collect();

        let parent_name = document
            .select(&self.selectors.parent_name)
            .next()
            .and_then(|el| non_empty(&normalize_whitespace(&element_text(el))));

        let next_cursor =
            next_page_url(&document, &self.selectors.next_link, &page.url)?.map(PageCursor::Url);

        tracing::trace!(
            url = %page.url,
            candidates = candidates.len(),
            has_next = next_cursor.is_some(),
            "Extracted review page"
        );

        Ok(ExtractedPage {
            candidates,
            parent_name,
            next_cursor,
        })
    }
}

/// Collect the text of an element with its descendants joined by spaces
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|el| non_empty(&element_text(el)))
}

/// Resolve the pagination link against the current page URL
///
/// A link that resolves back to the current page is treated as absent so a
/// disabled "next" control cannot loop the walk.
pub(crate) fn next_page_url(
    document: &Html,
    selector: &Selector,
    current_url: &str,
) -> std::result::Result<Option<String>, ParseError> {
    let Some(href) = document
        .select(selector)
        .find_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:"))
    else {
        return Ok(None);
    };

    let base =
        Url::parse(current_url).map_err(|e| ParseError::InvalidUrl(format!("{current_url}: {e}")))?;
    let next = base
        .join(href)
        .map_err(|e| ParseError::InvalidUrl(format!("{href}: {e}")))?;

    if next == base {
        return Ok(None);
    }

    Ok(Some(next.to_string()))
}
