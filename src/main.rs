use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use review_harvester::config::Config;
use review_harvester::models::SourceKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "review-harvester",
    version,
    about = "Resilient paginated review harvester for business-review sites and board-game APIs",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the business listing and write a seed file
    Discover {
        /// First listing page (defaults to html.listing_url)
        #[arg(long)]
        start_url: Option<String>,

        /// Seed file to write
        #[arg(short, long, default_value = "seeds.json")]
        output: PathBuf,

        /// Maximum listing pages to visit (0 = unlimited)
        #[arg(long, default_value = "0")]
        max_pages: u32,
    },

    /// Harvest reviews for every entity in a seed file
    Harvest {
        /// Source to harvest (html, api)
        #[arg(short, long, value_parser = parse_source)]
        source: SourceKind,

        /// Seed file (JSON array of entities)
        #[arg(long)]
        seeds: PathBuf,

        /// Override the configured output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Skip entities before this index of the ordered seed list
        #[arg(long, default_value = "0")]
        start_index: usize,

        /// Process this entity even if it falls before --start-index (repeatable)
        #[arg(long = "include-id")]
        include_ids: Vec<String>,

        /// Earlier output file whose results are kept in the new checkpoint
        #[arg(long)]
        resume_from: Option<PathBuf>,
    },

    /// Print the effective configuration
    ShowConfig,
}

fn parse_source(s: &str) -> std::result::Result<SourceKind, String> {
    SourceKind::parse(s).ok_or_else(|| format!("unknown source '{s}' (expected html or api)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("review-harvester starting");

    match cli.command {
        Commands::Discover {
            start_url,
            output,
            max_pages,
        } => {
            tracing::info!(
                start_url = ?start_url,
                output = %output.display(),
                max_pages,
                "Starting discover command"
            );
            commands::discover(config, start_url, output, max_pages).await?;
        }

        Commands::Harvest {
            source,
            seeds,
            output_dir,
            start_index,
            include_ids,
            resume_from,
        } => {
            tracing::info!(
                source = %source,
                seeds = %seeds.display(),
                start_index,
                include_ids = include_ids.len(),
                resume_from = ?resume_from,
                "Starting harvest command"
            );
            commands::harvest(
                config,
                commands::HarvestParams {
                    source,
                    seeds,
                    output_dir,
                    start_index,
                    include_ids,
                    resume_from,
                },
            )
            .await?;
        }

        Commands::ShowConfig => commands::show_config(&config)?,
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        let directive = if verbose {
            "review_harvester=debug,info".to_string()
        } else {
            format!("review_harvester={level},warn")
        };
        tracing_subscriber::EnvFilter::try_new(directive)
    })?;

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
