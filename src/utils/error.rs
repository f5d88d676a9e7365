//! Error types for the harvester
//!
//! Page-level failures are split into transport and parse errors. Both count
//! toward the same consecutive-failure ceiling in the pagination driver.

use thiserror::Error;

/// Network or HTTP-level failure while fetching a page
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-success status code
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Content decoding error
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Classify a reqwest error, pulling timeouts out as their own variant
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Malformed page content
#[derive(Error, Debug)]
pub enum ParseError {
    /// Document had no content at all
    #[error("Empty document")]
    EmptyDocument,

    /// XML was not well-formed
    #[error("Malformed XML: {0}")]
    Xml(String),

    /// Root element did not match what the source returns
    #[error("Unexpected root element: {0}")]
    UnexpectedRoot(String),

    /// Source answered with an error document instead of data
    #[error("Source returned an error document: {0}")]
    ErrorDocument(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Any failure that aborts a single page attempt
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}
