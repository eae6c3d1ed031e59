//! Link expansion: turn the first link in a message into summarized page text.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use parley_core::{CompletionRequest, CompletionService, CompletionSettings, ParleyError};
use parley_tools::{extract_hyperlink, extract_text, PageFetcher, TokenCounter};

use crate::shrink::{shrink_until_fits, ShrinkError};

pub const TOO_LARGE_FALLBACK: &str =
    "The website content was too large to process, tell the user that you couldn't summarize the page";

pub const SUMMARIZER_INSTRUCTIONS: &str =
    "you are an AI copywriting assistant, you help summarize content into a maximum of 500 words.";

const SUMMARIZE_PREFIX: &str = "Summarize the following content:\n";

/// Limits applied to page text before it is summarized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpansionBudget {
    /// Maximum tokens handed to the summarizer
    pub cutoff: usize,
    /// Fraction of characters kept per truncation step, in (0, 1)
    pub shrink_factor: f64,
    /// Below this many characters the page is given up on
    pub minimum_viable_length: usize,
}

/// Outcome of expanding one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// No link in the message.
    NoLink,
    /// A link was found but its page could not be read or measured.
    Failed { link: String, reason: String },
    /// Text to fold into the message. May be a fallback or apology string.
    Expanded { link: String, content: String },
}

impl Expansion {
    pub fn link(&self) -> Option<&str> {
        match self {
            Expansion::NoLink => None,
            Expansion::Failed { link, .. } | Expansion::Expanded { link, .. } => Some(link),
        }
    }

    /// Content to add to the message, if any.
    pub fn content(&self) -> Option<&str> {
        match self {
            Expansion::Expanded { content, .. } => Some(content),
            _ => None,
        }
    }

    /// `(link, content)`; both empty unless the link was expanded.
    pub fn into_pair(self) -> (String, String) {
        match self {
            Expansion::Expanded { link, content } => (link, content),
            Expansion::NoLink | Expansion::Failed { .. } => (String::new(), String::new()),
        }
    }
}

static LINE_EDGE_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]*\n[^\S\n]*").expect("line edge pattern is valid"));
static INNER_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+").expect("inner space pattern is valid"));
static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank line pattern is valid"));

/// Collapse runs of blank lines to one and runs of spaces to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    let text = LINE_EDGE_SPACE.replace_all(text, "\n");
    let text = INNER_SPACE.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

pub struct ExpansionPipeline {
    fetcher: Arc<dyn PageFetcher>,
    counter: Arc<dyn TokenCounter>,
    summarizer: Arc<dyn CompletionService>,
    budget: ExpansionBudget,
}

impl ExpansionPipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        counter: Arc<dyn TokenCounter>,
        summarizer: Arc<dyn CompletionService>,
        budget: ExpansionBudget,
    ) -> Self {
        Self {
            fetcher,
            counter,
            summarizer,
            budget,
        }
    }

    /// Expand the first link in `message`. Never fails; problems degrade to
    /// [`Expansion::Failed`] or an explanatory content string.
    pub async fn expand(&self, message: &str, settings: &CompletionSettings) -> Expansion {
        let Some(link) = extract_hyperlink(message) else {
            return Expansion::NoLink;
        };
        let link = link.to_string();

        let text = match self.read_page(&link).await {
            Ok(text) => text,
            Err(e) => {
                warn!(link = %link, error = %e, "Link expansion skipped");
                return Expansion::Failed {
                    link,
                    reason: e.to_string(),
                };
            }
        };

        let candidate = match self.shrink(text, &settings.model).await {
            Ok(candidate) => candidate,
            Err(ShrinkError::Unfittable) => {
                info!(link = %link, cutoff = self.budget.cutoff, "Page too large to summarize");
                return Expansion::Expanded {
                    link,
                    content: TOO_LARGE_FALLBACK.to_string(),
                };
            }
            Err(ShrinkError::Check(e)) => {
                warn!(link = %link, error = %e, "Could not measure page size");
                return Expansion::Failed {
                    link,
                    reason: e.to_string(),
                };
            }
        };

        let content = match self.summarize(&candidate, settings).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(link = %link, error = %e, "Summarization failed");
                format!("couldn't summarize page: {e}")
            }
        };
        Expansion::Expanded { link, content }
    }

    async fn read_page(&self, link: &str) -> Result<String, ParleyError> {
        let raw = self.fetcher.fetch(link).await?;
        let text = extract_text(&raw)?;
        let text = normalize_whitespace(&text);
        debug!(link = %link, bytes = raw.len(), chars = text.len(), "Fetched page");
        Ok(text)
    }

    async fn shrink(&self, text: String, model: &str) -> Result<String, ShrinkError<ParleyError>> {
        let counter = Arc::clone(&self.counter);
        let model = model.to_string();
        let budget = self.budget;

        tokio::task::spawn_blocking(move || {
            shrink_until_fits(
                &text,
                |candidate: &str| {
                    let tokens = counter.count(candidate, &model)?;
                    debug!(tokens, cutoff = budget.cutoff, "Measured page text");
                    Ok(tokens <= budget.cutoff)
                },
                budget.shrink_factor,
                budget.minimum_viable_length,
            )
        })
        .await
        .map_err(|e| ShrinkError::Check(ParleyError::Other(e.into())))?
    }

    async fn summarize(
        &self,
        candidate: &str,
        settings: &CompletionSettings,
    ) -> Result<String, ParleyError> {
        let request = CompletionRequest {
            instructions: SUMMARIZER_INSTRUCTIONS.to_string(),
            history: Vec::new(),
            body: format!("{SUMMARIZE_PREFIX}{candidate}"),
            settings: settings.without_memory(),
        };
        self.summarizer
            .complete(&request)
            .await
            .map(|completion| completion.text)
            .map_err(|e| ParleyError::SummarizationFailed(e.to_string()))
    }
}
