//! Leaf capabilities used by link expansion: finding a link, fetching the page,
//! turning it into text, and measuring that text in model tokens.

pub mod link;
pub mod tokens;
pub mod web;

pub use link::extract_hyperlink;
pub use tokens::{TiktokenCounter, TokenCounter};
pub use web::{extract_text, HttpPageFetcher, PageFetcher, BROWSER_USER_AGENT, DEFAULT_FETCH_TIMEOUT};
