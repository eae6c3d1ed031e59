//! Hyperlink detection in chat messages.
use once_cell::sync::Lazy;
use regex::Regex;

static HYPERLINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bhttps?://\S+\b").expect("hyperlink pattern is valid"));

/// Return the first http(s) link in `text`, if any.
pub fn extract_hyperlink(text: &str) -> Option<&str> {
    HYPERLINK_PATTERN.find(text).map(|m| m.as_str())
}
