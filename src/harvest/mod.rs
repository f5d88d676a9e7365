//! Harvest orchestration: per-entity pagination and the run loop

pub mod coordinator;
pub mod driver;

pub use coordinator::{HarvestContext, HarvestCoordinator, ResumePlan, RunSummary};
pub use driver::{DriverSettings, EntityHarvest, EntityStats, PageOutcome, PaginationDriver, Termination};

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::source::{HtmlReviewClient, SourceClient, XmlApiClient};
use crate::filter::QualityFilter;
use crate::models::SourceKind;
use crate::parser::{HtmlReviewExtractor, RecordExtractor, XmlCommentExtractor};

/// Assemble the client, extractor and filter for one source
pub fn build_driver(
    kind: SourceKind,
    config: &Config,
    fetcher: Arc<PageFetcher>,
) -> Result<PaginationDriver> {
    let client: Arc<dyn SourceClient>;
    let extractor: Arc<dyn RecordExtractor>;
    match kind {
        SourceKind::Html => {
            client = Arc::new(
                HtmlReviewClient::new(fetcher, &config.html.base_url)
                    .context("Invalid html.base_url")?,
            );
            extractor = Arc::new(
                HtmlReviewExtractor::from_config(&config.html)
                    .context("Invalid HTML review selectors")?,
            );
        }
        SourceKind::Api => {
            client = Arc::new(XmlApiClient::new(fetcher, config.api.endpoint_template.clone()));
            extractor = Arc::new(XmlCommentExtractor::new());
        }
    }

    let settings = DriverSettings::from_config(config).context("Invalid page delay")?;
    let filter = QualityFilter::from_config(kind, config);

    tracing::debug!(
        source = kind.as_str(),
        target_language = filter.target_language(),
        max_errors = settings.max_consecutive_errors,
        "Built pagination driver"
    );

    Ok(PaginationDriver::new(client, extractor, filter, settings))
}
