//! review-harvester - Resilient paginated review harvester
//!
//! Collects user reviews from a business-review website (HTML) and user
//! comments from a board-game catalog API (XML), keeps only rated,
//! target-language records, and checkpoints them to a dated JSON file.
//!
//! # Architecture
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Rate-limited fetching, source clients, listing walk
//! - [`parser`] - HTML and XML record extraction
//! - [`filter`] - Rating and language admission
//! - [`harvest`] - Per-entity pagination driver and run coordinator
//! - [`storage`] - Atomic checkpoint output
//! - [`seed`] - Seed lists of parent entities
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use review_harvester::config::Config;
//! use review_harvester::crawler::PageFetcher;
//! use review_harvester::harvest::{build_driver, HarvestContext, HarvestCoordinator, ResumePlan};
//! use review_harvester::models::SourceKind;
//! use review_harvester::storage::CheckpointStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let seeds = review_harvester::seed::load_seeds("seeds.json".as_ref())?;
//!
//!     let fetcher = Arc::new(PageFetcher::from_config(&config.http)?);
//!     let driver = build_driver(SourceKind::Api, &config, fetcher)?;
//!     let context = HarvestContext::new(
//!         CheckpointStore::from_config(&config, SourceKind::Api),
//!         config.entity_delay()?,
//!         config.harvest.checkpoint_every,
//!     );
//!
//!     let summary = HarvestCoordinator::new(driver, context)
//!         .run(&seeds, &ResumePlan::full())
//!         .await?;
//!     println!("{} records", summary.records);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod filter;
pub mod harvest;
pub mod models;
pub mod parser;
pub mod seed;
pub mod storage;
pub mod utils;

pub use models::{HarvestBuffer, ParentEntity, ParentResult, SourceKind};
