pub mod discover;
pub mod harvest;

// Re-export command functions for convenience
pub use discover::discover;
pub use harvest::{harvest, HarvestParams};

use anyhow::{Context, Result};
use review_harvester::config::Config;

/// Print the effective configuration as TOML
pub fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}
