//! Text sanitization for extracted review content
//!
//! Review bodies arrive with invisible characters, leftover entities (the
//! board-game API double-escapes some of them) and irregular whitespace.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

static MULTI_NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

static BBCODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[/?(?:b|i|u|s|q|size|color|center|quote)(?:=[^\]]*)?\]").unwrap());

/// Sanitize extracted text content
///
/// This function applies multiple cleaning steps:
/// 1. Remove zero-width characters
/// 2. Decode leftover HTML entities
/// 3. Remove control characters (except newline/tab)
/// 4. Normalize whitespace and trim each line
/// 5. Remove excessive blank lines
///
/// # Examples
///
/// ```
/// use review_harvester::parser::sanitize::sanitize_text;
///
/// let dirty = "Great\u{200B} game  \n\n\n\nWould play again";
/// assert_eq!(sanitize_text(dirty), "Great game\n\nWould play again");
/// ```
pub fn sanitize_text(text: &str) -> String {
    let mut result = remove_zero_width(text);
    result = html_escape::decode_html_entities(&result).into_owned();
    result = result.replace("\r\n", "\n").replace('\u{a0}', " ");
    result = remove_control_chars(&result);
    result = WHITESPACE_REGEX.replace_all(&result, " ").into_owned();
    result = trim_lines(&result);
    result = MULTI_NEWLINE_REGEX.replace_all(&result, "\n\n").into_owned();

    result.trim().to_string()
}

/// Strip forum markup tags like `[b]` or `[size=12]` from comment text
pub fn strip_bbcode(text: &str) -> String {
    BBCODE_REGEX.replace_all(text, "").into_owned()
}

/// Remove zero-width spaces and similar invisible characters
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c,
                '\u{200B}'..='\u{200F}' |
                '\u{2028}'..='\u{202F}' |
                '\u{FEFF}'
            )
        })
        .collect()
}

/// Remove control characters except newline and tab
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

fn trim_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sanitize and drop the value if nothing is left
pub fn non_empty(text: &str) -> Option<String> {
    let cleaned = sanitize_text(text);
    (!cleaned.is_empty()).then_some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text_full() {
        let dirty = "Hello\u{200B}World  \n\n\n\nTest";
        let clean = sanitize_text(dirty);
        assert_eq!(clean, "HelloWorld\n\nTest");
    }

    #[test]
    fn test_double_escaped_entities() {
        // quick-xml unescapes once; the API leaves a second layer behind
        assert_eq!(sanitize_text("Don&#039;t &quot;skip&quot; it"), "Don't \"skip\" it");
    }

    #[test]
    fn test_remove_control_chars() {
        let clean = remove_control_chars("Hello\x00World\x07Test\nNewline");
        assert!(!clean.contains('\x00'));
        assert!(!clean.contains('\x07'));
        assert!(clean.contains('\n'));
    }

    #[test]
    fn test_strip_bbcode() {
        assert_eq!(
            strip_bbcode("[b]Great[/b] with [size=14]five[/size]"),
            "Great with five"
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  \n\t "), None);
        assert_eq!(non_empty("  ok "), Some("ok".to_string()));
    }
}
