use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable entry of a dialogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Model tuning passed along with every completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSettings {
    /// Model identifier, also used to pick the tokenizer
    pub model: String,
    /// Maximum tokens for the completion
    pub max_tokens: u32,
    /// Temperature for generation
    pub temperature: f32,
    /// Whether long-term memory is queried for extra context
    pub memory_enabled: bool,
    /// How many memories to recall when enabled
    pub memory_top_k: usize,
    /// Minimum similarity for a recalled memory
    pub memory_min_score: f32,
}

impl CompletionSettings {
    /// Copy of these settings with retrieval switched off.
    pub fn without_memory(&self) -> Self {
        Self {
            memory_enabled: false,
            ..self.clone()
        }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            memory_enabled: false,
            memory_top_k: 3,
            memory_min_score: 0.7,
        }
    }
}

/// Everything the completion service needs for one call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub instructions: String,
    pub history: Vec<ConversationTurn>,
    pub body: String,
    pub settings: CompletionSettings,
}

/// Text returned by the completion service plus what went into it.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: String,
    pub metadata: CompletionMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionMetadata {
    /// Titles of recalled memories used as context
    pub context_titles: Vec<String>,
    /// Number of context snippets injected into the prompt
    pub contexts: usize,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
}

/// A memory recalled from the long-term store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalledMemory {
    pub title: String,
    pub content: String,
    pub score: f32,
}

/// Wire-level chat message sent to an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role.to_string(),
            content: turn.content.clone(),
        }
    }
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
