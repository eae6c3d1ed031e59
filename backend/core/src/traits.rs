use anyhow::Result;
use async_trait::async_trait;

use crate::error::{ChatError, ParleyError};
use crate::types::{Completion, CompletionRequest, LlmRequest, LlmResponse, RecalledMemory};

/// Trait for LLM providers behind the completion service.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Send a chat request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Opaque chat-completion capability.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ParleyError>;
}

/// Long-term storage of conversation transcripts.
#[async_trait]
pub trait MemoryService: Send + Sync {
    /// Store `transcript` under `label`. Returns the number of stored units.
    async fn ingest(
        &self,
        transcript: &str,
        label: &str,
        sentence_mode: bool,
    ) -> Result<usize, ParleyError>;
}

/// Retrieval side of the long-term memory.
#[async_trait]
pub trait MemoryRecall: Send + Sync {
    async fn recall(
        &self,
        query: &str,
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<RecalledMemory>, ParleyError>;
}

/// What a transport needs: given a sender key and a message, produce reply text.
#[async_trait]
pub trait ChatHandler: Send + Sync {
    async fn chat(&self, key: &str, message: &str) -> Result<String, ChatError>;
}
