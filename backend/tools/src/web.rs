//! Web page access for link expansion: fetch a URL and render it as plain text.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use parley_core::ParleyError;

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Desktop Firefox signature. Some sites reject default or bot user agents.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:58.0) Gecko/20100101 Firefox/58.0";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Retrieves raw page bytes for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, ParleyError>;
}

/// reqwest-backed fetcher. No retries; any non-2xx status is a failure.
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ParleyError> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ParleyError::FetchFailed(format!("could not build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, ParleyError> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| ParleyError::FetchFailed(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ParleyError::FetchFailed(format!("{url}: HTTP {status}")));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ParleyError::FetchFailed(format!("{url}: failed to read body: {e}")))?;
        debug!(url = %url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Extract
// ---------------------------------------------------------------------------

/// Elements whose content is never human-readable text.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "iframe", "template", "head", "object", "canvas",
];

/// Convert raw markup into plain text: tags, links and scripts are dropped,
/// block elements become line breaks.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so
/// legacy-encoded pages still yield their ASCII text. Only binary bodies
/// (anything containing NUL) fail.
///
/// Whitespace is left mostly as found; callers normalize it for their own use.
pub fn extract_text(raw: &[u8]) -> Result<String, ParleyError> {
    if raw.contains(&0) {
        return Err(ParleyError::ExtractFailed(
            "page body is binary, not markup".to_string(),
        ));
    }
    let html = String::from_utf8_lossy(raw);

    let document = Html::parse_document(&html);
    let mut output = String::with_capacity(html.len() / 2);

    if let Ok(title_sel) = Selector::parse("title") {
        if let Some(title_el) = document.select(&title_sel).next() {
            let title: String = title_el.text().collect();
            let title = title.trim();
            if !title.is_empty() {
                output.push_str(title);
                output.push_str("\n\n");
            }
        }
    }

    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    collect_text(&root, &mut output);
    Ok(output.trim().to_string())
}

fn collect_text(element: &ElementRef, output: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => output.push_str(text),
            Node::Element(_) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let tag = child_ref.value().name();
                if NOISE_TAGS.contains(&tag) {
                    continue;
                }
                let is_block = matches!(
                    tag,
                    "p" | "div"
                        | "h1"
                        | "h2"
                        | "h3"
                        | "h4"
                        | "h5"
                        | "h6"
                        | "li"
                        | "br"
                        | "tr"
                        | "table"
                        | "ul"
                        | "ol"
                        | "blockquote"
                        | "pre"
                        | "section"
                        | "article"
                        | "header"
                        | "footer"
                );
                if is_block {
                    output.push('\n');
                }
                collect_text(&child_ref, output);
                if is_block {
                    output.push('\n');
                }
            }
            _ => {}
        }
    }
}
