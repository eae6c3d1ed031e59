//! Token counting with model-specific BPE tokenizers.
use std::sync::Arc;

use moka::sync::Cache;
use tiktoken_rs::CoreBPE;
use tracing::debug;

use parley_core::ParleyError;

/// Counts tokens the way a given model's tokenizer would.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str, model: &str) -> Result<usize, ParleyError>;
}

/// tiktoken-backed counter. Tokenizers are built once per model and cached.
pub struct TiktokenCounter {
    encoders: Cache<String, Arc<CoreBPE>>,
}

impl TiktokenCounter {
    pub fn new() -> Self {
        Self {
            encoders: Cache::new(16),
        }
    }

    fn encoder(&self, model: &str) -> Result<Arc<CoreBPE>, ParleyError> {
        self.encoders
            .try_get_with(model.to_string(), || {
                debug!(model = %model, "Loading tokenizer");
                tiktoken_rs::get_bpe_from_model(model).map(Arc::new)
            })
            .map_err(|_| ParleyError::ModelUnsupported(model.to_string()))
    }
}

impl Default for TiktokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str, model: &str) -> Result<usize, ParleyError> {
        Ok(self.encoder(model)?.encode_with_special_tokens(text).len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_known_model() {
        let counter = TiktokenCounter::new();
        let tokens = counter.count("Hello, world!", "gpt-3.5-turbo").unwrap();
        assert!(tokens > 0 && tokens < 13, "got {tokens}");
    }

    #[test]
    fn test_empty_text_is_zero() {
        let counter = TiktokenCounter::new();
        assert_eq!(counter.count("", "gpt-4").unwrap(), 0);
    }

    #[test]
    fn test_unknown_model_is_unsupported() {
        let counter = TiktokenCounter::new();
        let err = counter.count("hi", "definitely-not-a-model").unwrap_err();
        assert!(matches!(err, ParleyError::ModelUnsupported(m) if m == "definitely-not-a-model"));
    }

    #[test]
    fn test_not_a_character_count() {
        let counter = TiktokenCounter::new();
        let text = "the the the the the the the the";
        let tokens = counter.count(text, "gpt-4").unwrap();
        assert!(tokens < text.chars().count());
    }
}
