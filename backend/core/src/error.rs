use thiserror::Error;

/// Top-level error type for the Parley runtime.
#[derive(Debug, Error)]
pub enum ParleyError {
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("text extraction failed: {0}")]
    ExtractFailed(String),

    #[error("no tokenizer known for model '{0}'")]
    ModelUnsupported(String),

    #[error("summarization failed: {0}")]
    SummarizationFailed(String),

    #[error("completion failed: {0}")]
    CompletionFailed(String),

    #[error("memory ingest failed: {0}")]
    MemoryIngestFailed(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("channel error: {0}")]
    ChannelError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A chat request that failed after producing a reply for the end user.
///
/// `reply` is what the transport should post; `source` is the failure itself.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ChatError {
    pub reply: String,
    #[source]
    pub source: ParleyError,
}

impl ChatError {
    pub fn new(reply: impl Into<String>, source: ParleyError) -> Self {
        Self {
            reply: reply.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParleyError::ModelUnsupported("mystery-1".into());
        assert_eq!(err.to_string(), "no tokenizer known for model 'mystery-1'");
    }

    #[test]
    fn test_chat_error_keeps_reply_and_source() {
        let err = ChatError::new(
            "I've encountered an error: boom",
            ParleyError::CompletionFailed("boom".into()),
        );
        assert_eq!(err.reply, "I've encountered an error: boom");
        assert_eq!(err.to_string(), "completion failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
