//! Configuration management for the review harvester
//!
//! This module handles loading and validating configuration from environment
//! variables, TOML files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::crawler::delay::DelayWindow;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP client configuration
    pub http: HttpConfig,

    /// Politeness delays
    pub delays: DelayConfig,

    /// Pagination and checkpoint policy
    pub harvest: HarvestConfig,

    /// Language filter
    pub language: LanguageConfig,

    /// HTML review site
    pub html: HtmlSourceConfig,

    /// XML board-game API
    pub api: ApiSourceConfig,

    /// Output location
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Hard ceiling on requests per second, independent of the randomized delays
    pub max_requests_per_second: u32,

    /// Fixed user agent; rotates through a browser pool when unset
    pub user_agent: Option<String>,

    /// Enable cookie persistence
    pub enable_cookies: bool,
}

/// Randomized delay windows, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    pub page_min_secs: f64,
    pub page_max_secs: f64,
    pub entity_min_secs: f64,
    pub entity_max_secs: f64,
}

/// Pagination and checkpoint policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Consecutive page failures before an entity is aborted
    pub max_consecutive_errors: u32,

    /// Flush the buffer every N accepted records
    pub checkpoint_every: usize,

    /// Safety limit on pages per entity (0 = unlimited)
    pub max_pages: u32,
}

/// Language filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// ISO 639-1 code records must be written in
    pub target: String,

    /// Extra confidence floor (0.0 - 1.0) on top of the detector's own
    /// reliability check
    pub min_confidence: f64,
}

/// CSS selectors and entry points for the HTML review site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlSourceConfig {
    /// Base URL relative locators are resolved against
    pub base_url: String,

    /// First listing page for seed discovery
    pub listing_url: String,

    /// One element per business on a listing page
    pub listing_item: String,
    pub listing_link: String,
    pub listing_review_count: String,

    /// One element per review on a detail page
    pub review_item: String,
    pub rating: String,
    /// Attribute holding the rating; element text is used when unset
    pub rating_attr: Option<String>,
    /// Numbers read from `rating_attr` are divided by this ("rating-45" -> 4.5)
    pub rating_divisor: f64,
    pub title: String,
    pub body: String,
    pub parent_name: String,
    pub next_link: String,
}

/// XML board-game API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSourceConfig {
    /// Endpoint with `{id}` and `{page}` placeholders
    pub endpoint_template: String,
    pub min_rating: f64,
    pub max_rating: f64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,

    /// File name prefix; the run date is appended
    pub html_prefix: String,
    pub api_prefix: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_requests_per_second: 2,
            user_agent: None,
            enable_cookies: true,
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            page_min_secs: 2.0,
            page_max_secs: 10.0,
            entity_min_secs: 30.0,
            entity_max_secs: 60.0,
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_consecutive_errors: 3,
            checkpoint_every: 100_000,
            max_pages: 0,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            target: String::from("en"),
            min_confidence: 0.0,
        }
    }
}

impl Default for HtmlSourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://www.dealerrater.com"),
            listing_url: String::from("https://www.dealerrater.com/directory/"),
            listing_item: String::from("div.dealer-info"),
            listing_link: String::from("a.dealer-name"),
            listing_review_count: String::from(".review-count"),
            review_item: String::from("div.review-entry"),
            rating: String::from(".rating-static"),
            rating_attr: Some(String::from("class")),
            rating_divisor: 10.0,
            title: String::from("h3.review-title"),
            body: String::from("p.review-content"),
            parent_name: String::from("h1"),
            next_link: String::from("a.next, a[rel='next']"),
        }
    }
}

impl Default for ApiSourceConfig {
    fn default() -> Self {
        Self {
            endpoint_template: String::from(
                "https://boardgamegeek.com/xmlapi2/thing?id={id}&comments=1&page={page}&pagesize=100",
            ),
            min_rating: 1.0,
            max_rating: 10.0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            html_prefix: String::from("business_reviews"),
            api_prefix: String::from("bgg_reviews"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `HARVEST_*` environment variables
    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("HARVEST_REQUEST_TIMEOUT") {
            self.http.request_timeout_secs = v;
        }
        if let Some(v) = env_parse("HARVEST_MAX_RPS") {
            self.http.max_requests_per_second = v;
        }
        if let Ok(v) = std::env::var("HARVEST_USER_AGENT") {
            self.http.user_agent = Some(v);
        }
        if let Some(v) = env_parse("HARVEST_PAGE_DELAY_MIN") {
            self.delays.page_min_secs = v;
        }
        if let Some(v) = env_parse("HARVEST_PAGE_DELAY_MAX") {
            self.delays.page_max_secs = v;
        }
        if let Some(v) = env_parse("HARVEST_ENTITY_DELAY_MIN") {
            self.delays.entity_min_secs = v;
        }
        if let Some(v) = env_parse("HARVEST_ENTITY_DELAY_MAX") {
            self.delays.entity_max_secs = v;
        }
        if let Some(v) = env_parse("HARVEST_MAX_CONSECUTIVE_ERRORS") {
            self.harvest.max_consecutive_errors = v;
        }
        if let Some(v) = env_parse("HARVEST_CHECKPOINT_EVERY") {
            self.harvest.checkpoint_every = v;
        }
        if let Ok(v) = std::env::var("HARVEST_TARGET_LANGUAGE") {
            self.language.target = v;
        }
        if let Ok(v) = std::env::var("HARVEST_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("HARVEST_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("HARVEST_LOG_FORMAT") {
            self.logging.format = v;
        }
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.http.max_requests_per_second == 0 {
            anyhow::bail!("max_requests_per_second must be greater than 0");
        }

        if self.http.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        self.page_delay().context("Invalid page delay window")?;
        self.entity_delay().context("Invalid entity delay window")?;

        if self.harvest.max_consecutive_errors == 0 {
            anyhow::bail!("max_consecutive_errors must be greater than 0");
        }

        if self.harvest.checkpoint_every == 0 {
            anyhow::bail!("checkpoint_every must be greater than 0");
        }

        if self.language.target.trim().is_empty() {
            anyhow::bail!("language.target must not be empty");
        }

        if !(0.0..=1.0).contains(&self.language.min_confidence) {
            anyhow::bail!("language.min_confidence must be within 0.0..=1.0");
        }

        if self.html.rating_divisor <= 0.0 {
            anyhow::bail!("html.rating_divisor must be positive");
        }

        if self.api.min_rating > self.api.max_rating {
            anyhow::bail!("api.min_rating must not exceed api.max_rating");
        }

        if !self.api.endpoint_template.contains("{id}")
            || !self.api.endpoint_template.contains("{page}")
        {
            anyhow::bail!("api.endpoint_template must contain {{id}} and {{page}} placeholders");
        }

        Ok(())
    }

    /// Inter-page delay window
    pub fn page_delay(&self) -> Result<DelayWindow> {
        Ok(DelayWindow::from_secs(
            self.delays.page_min_secs,
            self.delays.page_max_secs,
        )?)
    }

    /// Inter-entity delay window
    pub fn entity_delay(&self) -> Result<DelayWindow> {
        Ok(DelayWindow::from_secs(
            self.delays.entity_min_secs,
            self.delays.entity_max_secs,
        )?)
    }

    /// Safety page limit, `None` when unlimited
    pub fn max_pages(&self) -> Option<u32> {
        (self.harvest.max_pages > 0).then_some(self.harvest.max_pages)
    }
}
