//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use regex::Regex;
use std::sync::OnceLock;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Sanitize filename by removing invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    static INVALID_CHARS: OnceLock<Regex> = OnceLock::new();

    let re =
        INVALID_CHARS.get_or_init(|| Regex::new(r#"[<>:"/\\|?*\s]"#).expect("Invalid regex pattern"));

    re.replace_all(filename, "_").to_string()
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Parse the first number appearing in `text` (e.g. "rating-45" -> 45.0)
pub fn first_number(text: &str) -> Option<f64> {
    static NUMBER_RE: OnceLock<Regex> = OnceLock::new();

    let re = NUMBER_RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("Invalid regex pattern"));

    re.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Parse a count like "1,234 reviews" into 1234
pub fn parse_count(text: &str) -> Option<u64> {
    let digits: String = text
        .split_whitespace()
        .find(|token| token.chars().any(|c| c.is_ascii_digit()))?
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("hello\n\nworld"), "hello world");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("file<name>.txt"), "file_name_.txt");
        assert_eq!(sanitize_filename("bgg reviews"), "bgg_reviews");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very long text here", 10), "very lo...");
    }

    #[test]
    fn test_first_number() {
        assert_eq!(first_number("rating-static rating-45"), Some(45.0));
        assert_eq!(first_number("4.5 stars"), Some(4.5));
        assert_eq!(first_number("no stars"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("1,234 reviews"), Some(1234));
        assert_eq!(parse_count("(12)"), Some(12));
        assert_eq!(parse_count("No reviews yet"), None);
    }
}
