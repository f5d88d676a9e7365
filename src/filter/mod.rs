//! Quality and language admission for candidate records
//!
//! A candidate is admitted when it has a rating (in range, when the source
//! publishes a numeric scale), some non-blank text, and at least one of its
//! text fields is detected as the target language. Rejection is an expected
//! outcome, never an error.

pub mod language;

pub use language::{LanguageDetector, WhatlangDetector};

use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{CandidateRecord, SourceKind};

/// How ratings are validated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingPolicy {
    /// Any rating value is acceptable as long as one is present
    Present,
    /// Rating must be numeric and within `[min, max]` inclusive
    Range { min: f64, max: f64 },
}

impl RatingPolicy {
    /// Policy for a source, using the configured API scale
    pub fn for_source(source: SourceKind, config: &Config) -> Self {
        match source {
            SourceKind::Html => Self::Present,
            SourceKind::Api => Self::Range {
                min: config.api.min_rating,
                max: config.api.max_rating,
            },
        }
    }
}

/// Why a candidate was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    MissingRating,
    RatingOutOfRange,
    NoText,
    /// No field was detected as the target language (including undetectable text)
    Language,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingRating => "missing rating",
            Self::RatingOutOfRange => "rating out of range",
            Self::NoText => "no text",
            Self::Language => "language mismatch",
        };
        f.write_str(s)
    }
}

/// Admission verdict
pub type Verdict = Result<(), Rejection>;

/// Pure admission predicate over candidate records
#[derive(Clone)]
pub struct QualityFilter {
    detector: Arc<dyn LanguageDetector>,
    target_language: String,
    rating_policy: RatingPolicy,
}

impl fmt::Debug for QualityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualityFilter")
            .field("target_language", &self.target_language)
            .field("rating_policy", &self.rating_policy)
            .finish_non_exhaustive()
    }
}

impl QualityFilter {
    pub fn new(
        detector: Arc<dyn LanguageDetector>,
        target_language: impl Into<String>,
        rating_policy: RatingPolicy,
    ) -> Self {
        Self {
            detector,
            target_language: target_language.into().to_ascii_lowercase(),
            rating_policy,
        }
    }

    /// Filter for a source with the `whatlang` detector
    pub fn from_config(source: SourceKind, config: &Config) -> Self {
        Self::new(
            Arc::new(WhatlangDetector::new(config.language.min_confidence)),
            config.language.target.clone(),
            RatingPolicy::for_source(source, config),
        )
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Evaluate a candidate, reporting the first failed check
    pub fn evaluate(&self, candidate: &CandidateRecord) -> Verdict {
        let rating = candidate.rating.as_ref().ok_or(Rejection::MissingRating)?;

        if let RatingPolicy::Range { min, max } = self.rating_policy {
            match rating.as_f64() {
                Some(value) if (min..=max).contains(&value) => {}
                _ => return Err(Rejection::RatingOutOfRange),
            }
        }

        let texts: Vec<&str> = [candidate.title.as_deref(), candidate.body.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        if texts.is_empty() {
            return Err(Rejection::NoText);
        }

        let matches_target = texts.iter().any(|text| {
            self.detector
                .detect(text)
                .is_some_and(|lang| lang.eq_ignore_ascii_case(&self.target_language))
        });

        if matches_target {
            Ok(())
        } else {
            Err(Rejection::Language)
        }
    }

    /// Whether a candidate is admissible
    pub fn admits(&self, candidate: &CandidateRecord) -> bool {
        self.evaluate(candidate).is_ok()
    }
}
