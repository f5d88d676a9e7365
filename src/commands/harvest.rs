use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use review_harvester::config::Config;
use review_harvester::crawler::PageFetcher;
use review_harvester::harvest::{build_driver, HarvestContext, HarvestCoordinator, ResumePlan};
use review_harvester::models::{HarvestBuffer, SourceKind};
use review_harvester::seed;
use review_harvester::storage::{load_results, CheckpointStore};

pub struct HarvestParams {
    pub source: SourceKind,
    pub seeds: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub start_index: usize,
    pub include_ids: Vec<String>,
    pub resume_from: Option<PathBuf>,
}

pub async fn harvest(mut config: Config, params: HarvestParams) -> Result<()> {
    if let Some(dir) = params.output_dir {
        config.output.dir = dir;
    }

    // Fatal before any network activity
    let mut entities = seed::load_seeds(&params.seeds)?;
    seed::order_by_rank(&mut entities);

    let buffer = match &params.resume_from {
        Some(path) => {
            let results = load_results(path)
                .with_context(|| format!("Failed to load resume checkpoint {}", path.display()))?;
            HarvestBuffer::from_results(results)
        }
        None => HarvestBuffer::new(),
    };

    let store = CheckpointStore::from_config(&config, params.source);

    println!("Starting {} harvest", params.source);
    println!("========================");
    println!("  Seeds:       {} ({} entities)", params.seeds.display(), entities.len());
    println!("  Output:      {}", store.path().display());
    if params.start_index > 0 || !params.include_ids.is_empty() {
        println!(
            "  Resume:      from index {} (+{} included)",
            params.start_index,
            params.include_ids.len()
        );
    }
    if !buffer.is_empty() {
        println!("  Preloaded:   {} records", buffer.record_count());
    }

    let fetcher =
        Arc::new(PageFetcher::from_config(&config.http).context("Failed to create fetcher")?);
    let driver = build_driver(params.source, &config, fetcher)?;
    let context = HarvestContext::new(
        store,
        config.entity_delay()?,
        config.harvest.checkpoint_every,
    )
    .with_buffer(buffer);

    let plan = ResumePlan::from_index(params.start_index).include(params.include_ids);

    let mut coordinator = HarvestCoordinator::new(driver, context);
    let summary = coordinator.run(&entities, &plan).await?;

    println!("\nHarvest complete");
    println!("  Completed:   {}", summary.completed);
    println!("  Empty:       {}", summary.empty);
    println!("  Aborted:     {}", summary.aborted);
    println!("  Skipped:     {}", summary.skipped);
    println!("  Pages:       {}", summary.pages);
    println!("  Records:     {}", summary.records);
    println!("  Checkpoints: {}", summary.flushes);
    println!(
        "  Total saved: {}",
        coordinator.context().buffer.record_count()
    );
    if summary.failed_flushes > 0 {
        println!("  Failed intermediate flushes: {}", summary.failed_flushes);
    }
    if let Some(path) = &summary.output {
        println!("  Output:      {}", path.display());
    }

    Ok(())
}
