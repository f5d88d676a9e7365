// Core data structures for the review harvester

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which upstream source a harvest run talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// HTML-rendered business-review site
    Html,
    /// XML board-game catalog API
    Api,
}

impl SourceKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Api => "api",
        }
    }

    /// Field name used for the parent's display name in the output file
    pub fn name_field(&self) -> &'static str {
        match self {
            Self::Html => "business_name",
            Self::Api => "game_name",
        }
    }

    /// Create from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "html" | "business" | "reviews" => Some(Self::Html),
            "api" | "xml" | "bgg" | "games" => Some(Self::Api),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level object under review (a business or a board game)
///
/// Identity is the `locator`; `ordering_rank` is the expected record volume
/// and drives processing order (smallest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentEntity {
    pub id: String,
    pub display_name: String,
    /// URL (HTML source) or numeric catalog ID (API source)
    pub locator: String,
    #[serde(default)]
    pub ordering_rank: u64,
}

impl ParentEntity {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        locator: impl Into<String>,
        ordering_rank: u64,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            locator: locator.into(),
            ordering_rank,
        }
    }
}

/// Pagination position, source-dependent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageCursor {
    /// Absolute page URL
    Url(String),
    /// 1-based page index
    Page(u32),
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Page(n) => write!(f, "page {n}"),
        }
    }
}

/// Review rating as published by the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    Numeric(f64),
    Categorical(String),
}

impl Rating {
    /// Parse a raw rating token; anything that is not a finite number stays categorical
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(Self::Numeric(value)),
            _ => Some(Self::Categorical(trimmed.to_string())),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Categorical(_) => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "{v}"),
            Self::Categorical(s) => write!(f, "{s}"),
        }
    }
}

/// Extracted but unvalidated review/comment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandidateRecord {
    pub rating: Option<Rating>,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl CandidateRecord {
    pub fn new(rating: Option<Rating>, title: Option<&str>, body: Option<&str>) -> Self {
        Self {
            rating,
            title: title.map(str::to_string),
            body: body.map(str::to_string),
        }
    }
}

/// Candidate that passed quality and language filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedRecord {
    pub rating: Rating,
    #[serde(
        rename = "review_title",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(rename = "review_text", default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl AcceptedRecord {
    /// Promote an admitted candidate. Returns `None` when the rating is missing.
    pub fn from_candidate(candidate: CandidateRecord) -> Option<Self> {
        Some(Self {
            rating: candidate.rating?,
            title: candidate.title,
            body: candidate.body,
        })
    }
}

/// All accepted records for one parent entity
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParentResult {
    pub parent_name: String,
    pub records: Vec<AcceptedRecord>,
}

impl ParentResult {
    pub fn new(parent_name: impl Into<String>) -> Self {
        Self {
            parent_name: parent_name.into(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-run accumulation of parent results, append-only
#[derive(Debug, Clone, Default)]
pub struct HarvestBuffer {
    results: Vec<ParentResult>,
    record_count: usize,
}

impl HarvestBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the buffer with results recovered from an earlier checkpoint
    pub fn from_results(results: Vec<ParentResult>) -> Self {
        let mut buffer = Self::new();
        for result in results {
            buffer.push(result);
        }
        buffer
    }

    /// Append a result. Empty results are dropped; returns whether it was kept.
    pub fn push(&mut self, result: ParentResult) -> bool {
        if result.is_empty() {
            return false;
        }
        self.record_count += result.len();
        self.results.push(result);
        true
    }

    pub fn results(&self) -> &[ParentResult] {
        &self.results
    }

    /// Number of parent results held
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Total accepted records across all parents
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn into_results(self) -> Vec<ParentResult> {
        self.results
    }
}
