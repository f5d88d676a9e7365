//! Unified error handling for the review harvester
//!
//! Page-level failures ([`PageError`]) never leave the pagination driver,
//! which classifies them through [`HarvestErrorTrait`] to decide between a
//! retry and an immediate abort. Everything else that can fail before or
//! around a run is folded into a single [`Error`].
//!
//! # Architecture
//!
//! - [`HarvestErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Seed, I/O, JSON and configuration failures
//!
//! # Usage
//!
//! ```rust,ignore
//! use review_harvester::error::{HarvestErrorTrait, PageError};
//!
//! fn handle_error(err: PageError) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {}", err.describe());
//!     } else {
//!         eprintln!("Giving up: {}", err);
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use crate::utils::error::{PageError, ParseError, TransportError};

/// Common trait for all harvester error types
pub trait HarvestErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Short user-facing description
    fn describe(&self) -> String {
        format!("{}: {self}", self.category().as_str())
    }

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout)
    Network,
    /// Parsing and data extraction errors
    Parsing,
    /// Storage and I/O errors
    Storage,
    /// Seed input errors
    Seed,
    /// Configuration and validation errors
    Config,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network error",
            Self::Parsing => "parse error",
            Self::Storage => "storage error",
            Self::Seed => "seed input error",
            Self::Config => "configuration error",
        }
    }
}

impl HarvestErrorTrait for TransportError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_))
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Network
    }
}

impl HarvestErrorTrait for ParseError {
    fn is_recoverable(&self) -> bool {
        // Malformed pages are retried up to the consecutive-failure ceiling;
        // a bad URL will never parse.
        !matches!(self, Self::InvalidUrl(_))
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl HarvestErrorTrait for PageError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_recoverable(),
            Self::Parse(e) => e.is_recoverable(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Network,
            Self::Parse(_) => ErrorCategory::Parsing,
        }
    }
}

/// Unified error type for the review harvester
#[derive(Error, Debug)]
pub enum Error {
    /// Seed list could not be loaded
    #[error("Failed to load seed input {path}: {reason}")]
    Seed { path: PathBuf, reason: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl HarvestErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Seed { .. } => false,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Seed { .. } => ErrorCategory::Seed,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a seed loading error
    pub fn seed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Seed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_error_category() {
        let fetch_err = PageError::Transport(TransportError::Timeout);
        assert_eq!(fetch_err.category(), ErrorCategory::Network);

        let parse_err = PageError::Parse(ParseError::Xml("bad".into()));
        assert_eq!(parse_err.category(), ErrorCategory::Parsing);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(PageError::from(TransportError::Status(503)).is_recoverable());
        assert!(PageError::from(ParseError::ErrorDocument("busy".into())).is_recoverable());
        assert!(!PageError::from(TransportError::InvalidUrl("x".into())).is_recoverable());
        assert!(!PageError::from(ParseError::InvalidUrl("x".into())).is_recoverable());
        assert!(!Error::seed("seeds.json", "missing").is_recoverable());
    }

    #[test]
    fn test_describe_includes_category() {
        let err = Error::config("min_secs greater than max_secs");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(err.describe().starts_with("configuration error"));
    }
}
