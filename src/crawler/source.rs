//! Source clients: one page fetch per call
//!
//! Both sources share the pagination driver; they differ only in how a
//! cursor becomes a request URL.

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use crate::crawler::fetcher::PageFetcher;
use crate::models::{PageCursor, ParentEntity, SourceKind};
use crate::parser::RawPage;
use crate::utils::error::TransportError;

/// Fetches one page of a parent entity's review sequence
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Which source this client talks to
    fn kind(&self) -> SourceKind;

    /// Cursor of the first page for an entity
    fn first_cursor(&self, entity: &ParentEntity) -> PageCursor;

    /// Fetch the page at `cursor`
    ///
    /// # Errors
    ///
    /// Returns `TransportError` for network failures, timeouts, non-2xx
    /// statuses, and cursors this source cannot turn into a URL
    async fn fetch_page(
        &self,
        entity: &ParentEntity,
        cursor: &PageCursor,
    ) -> Result<RawPage, TransportError>;
}

/// Client for the HTML business-review site; cursors are page URLs
pub struct HtmlReviewClient {
    fetcher: Arc<PageFetcher>,
    base_url: Option<Url>,
}

impl HtmlReviewClient {
    /// Create a client resolving relative locators against `base_url`
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidUrl` if `base_url` is not a valid URL
    pub fn new(fetcher: Arc<PageFetcher>, base_url: &str) -> Result<Self, TransportError> {
        let base_url = if base_url.trim().is_empty() {
            None
        } else {
            Some(
                Url::parse(base_url)
                    .map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?,
            )
        };
        Ok(Self { fetcher, base_url })
    }

    fn resolve(&self, locator: &str) -> String {
        match &self.base_url {
            Some(base) => base
                .join(locator)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| locator.to_string()),
            None => locator.to_string(),
        }
    }
}

#[async_trait]
impl SourceClient for HtmlReviewClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Html
    }

    fn first_cursor(&self, entity: &ParentEntity) -> PageCursor {
        PageCursor::Url(self.resolve(&entity.locator))
    }

    async fn fetch_page(
        &self,
        _entity: &ParentEntity,
        cursor: &PageCursor,
    ) -> Result<RawPage, TransportError> {
        let PageCursor::Url(url) = cursor else {
            return Err(TransportError::InvalidUrl(format!(
                "HTML source expects URL cursors, got {cursor}"
            )));
        };

        let fetched = self.fetcher.fetch(url).await?;
        Ok(RawPage::new(cursor.clone(), fetched.url, fetched.body))
    }
}

/// Client for the XML board-game API; cursors are 1-based page numbers
pub struct XmlApiClient {
    fetcher: Arc<PageFetcher>,
    endpoint_template: String,
}

impl XmlApiClient {
    #[must_use]
    pub fn new(fetcher: Arc<PageFetcher>, endpoint_template: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint_template: endpoint_template.into(),
        }
    }

    /// Fill the endpoint template for an entity and page
    #[must_use]
    pub fn build_url(&self, id: &str, page: u32) -> String {
        let id: String = url::form_urlencoded::byte_serialize(id.trim().as_bytes()).collect();
        self.endpoint_template
            .replace("{id}", &id)
            .replace("{page}", &page.to_string())
    }
}

#[async_trait]
impl SourceClient for XmlApiClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Api
    }

    fn first_cursor(&self, _entity: &ParentEntity) -> PageCursor {
        PageCursor::Page(1)
    }

    async fn fetch_page(
        &self,
        entity: &ParentEntity,
        cursor: &PageCursor,
    ) -> Result<RawPage, TransportError> {
        let PageCursor::Page(page) = cursor else {
            return Err(TransportError::InvalidUrl(format!(
                "API source expects page cursors, got {cursor}"
            )));
        };

        let url = self.build_url(&entity.locator, *page);
        let fetched = self.fetcher.fetch(&url).await?;
        Ok(RawPage::new(cursor.clone(), fetched.url, fetched.body))
    }
}
