//! Bot configuration schema, as written in `bot.yaml`.
//!
//! Every field is optional on disk; [`crate::defaults`] fills the gaps.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Bot identifier, also the long-term memory namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// System instructions, literal or `file://path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Help reply, literal or `file://path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion: Option<ExpansionConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderConfig>,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Model id, also selects the tokenizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Context size of the model in tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationConfig {
    /// Turns kept per conversation. Non-positive values fall back to the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_capacity: Option<i64>,
}

// ---------------------------------------------------------------------------
// Link expansion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarization_token_cutoff: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shrink_factor: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_viable_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Long-term memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryConfig {
    /// Recall stored memories as completion context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,

    /// Words per chunk when not learning sentence by sentence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_words: Option<usize>,

    /// Where learned transcripts are archived, relative to the bot directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_dir: Option<String>,

    /// SQLite file for the vector store; in-memory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
}

// ---------------------------------------------------------------------------
// Completion provider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProviderKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}
