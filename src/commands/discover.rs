use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use review_harvester::config::Config;
use review_harvester::crawler::{ListingWalker, PageFetcher};
use review_harvester::parser::ListingExtractor;
use review_harvester::seed;

/// Walk the business listing and write a seed file
pub async fn discover(
    config: Config,
    start_url: Option<String>,
    output: PathBuf,
    max_pages: u32,
) -> Result<()> {
    let start_url = start_url.unwrap_or_else(|| config.html.listing_url.clone());
    if start_url.trim().is_empty() {
        anyhow::bail!("No listing URL given; pass --start-url or set html.listing_url");
    }

    println!("Discovering businesses");
    println!("======================");
    println!("  Listing: {start_url}");

    let fetcher =
        Arc::new(PageFetcher::from_config(&config.http).context("Failed to create fetcher")?);
    let extractor =
        ListingExtractor::from_config(&config.html).context("Invalid listing selectors")?;

    let walker = ListingWalker::new(fetcher, extractor, config.page_delay()?)
        .with_max_consecutive_errors(config.harvest.max_consecutive_errors)
        .with_max_pages(max_pages);

    let walk = walker.walk(&start_url).await;

    let seeds = seed::from_listing(&walk.entries);
    seed::save_seeds(&output, &seeds)
        .with_context(|| format!("Failed to write seeds to {}", output.display()))?;

    println!("\nDiscovery complete");
    println!("  Pages:      {}", walk.pages);
    println!("  Businesses: {}", seeds.len());
    if walk.reached_zero {
        println!("  Stopped at the first business without reviews");
    }
    if walk.aborted {
        println!("  Stopped early after repeated listing failures");
    }
    println!("  Seeds:      {}", output.display());

    Ok(())
}
