//! Seed discovery by walking the business listing
//!
//! The listing is sorted by review count descending; the walk ends at the
//! first zero-review business, when no next link exists, or after too many
//! consecutive failures on the same page.

use std::collections::HashSet;
use std::sync::Arc;

use crate::crawler::delay::DelayWindow;
use crate::crawler::fetcher::PageFetcher;
use crate::parser::{ListingEntry, ListingExtractor};
use crate::utils::error::PageError;

/// Outcome of a listing walk
#[derive(Debug, Clone, Default)]
pub struct ListingWalk {
    /// Businesses with at least one review, in listing order, deduplicated by URL
    pub entries: Vec<ListingEntry>,
    pub pages: u32,
    pub reached_zero: bool,
    /// Stopped on the consecutive-failure ceiling
    pub aborted: bool,
}

/// Follows listing pages from a start URL
pub struct ListingWalker {
    fetcher: Arc<PageFetcher>,
    extractor: ListingExtractor,
    page_delay: DelayWindow,
    max_consecutive_errors: u32,
    /// 0 = unlimited
    max_pages: u32,
}

impl ListingWalker {
    #[must_use]
    pub fn new(fetcher: Arc<PageFetcher>, extractor: ListingExtractor, page_delay: DelayWindow) -> Self {
        Self {
            fetcher,
            extractor,
            page_delay,
            max_consecutive_errors: 3,
            max_pages: 0,
        }
    }

    #[must_use]
    pub fn with_max_consecutive_errors(mut self, max: u32) -> Self {
        self.max_consecutive_errors = max.max(1);
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Walk the listing starting at `start_url`
    pub async fn walk(&self, start_url: &str) -> ListingWalk {
        let mut walk = ListingWalk::default();
        let mut seen = HashSet::new();
        let mut url = start_url.to_string();
        let mut consecutive_errors = 0u32;

        loop {
            if self.max_pages > 0 && walk.pages >= self.max_pages {
                tracing::debug!(pages = walk.pages, "Reached listing page limit");
                break;
            }

            tracing::debug!(url = %url, page = walk.pages + 1, "Fetching listing page");

            let page = match self.fetch_listing(&url).await {
                Ok(page) => page,
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        url = %url,
                        attempt = consecutive_errors,
                        max = self.max_consecutive_errors,
                        error = %e,
                        "Listing page failed"
                    );
                    if consecutive_errors >= self.max_consecutive_errors {
                        walk.aborted = true;
                        break;
                    }
                    self.page_delay.wait().await;
                    continue;
                }
            };

            consecutive_errors = 0;
            walk.pages += 1;

            let found = page.entries.len();
            for entry in page.entries {
                if seen.insert(entry.url.clone()) {
                    walk.entries.push(entry);
                }
            }

            tracing::info!(
                page = walk.pages,
                found,
                total = walk.entries.len(),
                reached_zero = page.reached_zero,
                "Processed listing page"
            );

            if page.reached_zero {
                walk.reached_zero = true;
                break;
            }

            match page.next_url {
                Some(next) => {
                    self.page_delay.wait().await;
                    url = next;
                }
                None => break,
            }
        }

        tracing::info!(
            businesses = walk.entries.len(),
            pages = walk.pages,
            aborted = walk.aborted,
            "Listing walk finished"
        );

        walk
    }

    async fn fetch_listing(&self, url: &str) -> Result<crate::parser::ListingPage, PageError> {
        let fetched = self.fetcher.fetch(url).await?;
        Ok(self.extractor.extract(&fetched.body, &fetched.url)?)
    }
}
