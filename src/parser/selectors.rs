//! CSS selectors for the HTML review site
//!
//! Selectors come from configuration so a layout change on the site is a
//! config edit, not a rebuild. They are compiled once when the extractor is
//! constructed.

use scraper::Selector;

use crate::config::HtmlSourceConfig;
use crate::error::{Error, Result};

fn compile(field: &str, css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| Error::config(format!("invalid CSS selector for html.{field} ({css}): {e}")))
}

/// Selectors for a business detail (reviews) page
#[derive(Debug, Clone)]
pub struct ReviewSelectors {
    pub item: Selector,
    pub rating: Selector,
    pub rating_attr: Option<String>,
    pub title: Selector,
    pub body: Selector,
    pub parent_name: Selector,
    pub next_link: Selector,
}

impl ReviewSelectors {
    /// Compile from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first selector that fails to parse
    pub fn from_config(config: &HtmlSourceConfig) -> Result<Self> {
        Ok(Self {
            item: compile("review_item", &config.review_item)?,
            rating: compile("rating", &config.rating)?,
            rating_attr: config.rating_attr.clone(),
            title: compile("title", &config.title)?,
            body: compile("body", &config.body)?,
            parent_name: compile("parent_name", &config.parent_name)?,
            next_link: compile("next_link", &config.next_link)?,
        })
    }
}

/// Selectors for a category listing page
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub item: Selector,
    pub link: Selector,
    pub review_count: Selector,
    pub next_link: Selector,
}

impl ListingSelectors {
    /// Compile from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first selector that fails to parse
    pub fn from_config(config: &HtmlSourceConfig) -> Result<Self> {
        Ok(Self {
            item: compile("listing_item", &config.listing_item)?,
            link: compile("listing_link", &config.listing_link)?,
            review_count: compile("listing_review_count", &config.listing_review_count)?,
            next_link: compile("next_link", &config.next_link)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selectors_compile() {
        let config = HtmlSourceConfig::default();
        assert!(ReviewSelectors::from_config(&config).is_ok());
        assert!(ListingSelectors::from_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_selector_names_field() {
        let config = HtmlSourceConfig {
            title: "h3[[".to_string(),
            ..HtmlSourceConfig::default()
        };
        let err = ReviewSelectors::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("html.title"));
    }
}
