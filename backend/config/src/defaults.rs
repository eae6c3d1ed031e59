//! Config defaults: applies default values to a parsed bot config.

use crate::schema::{
    BotConfig, ConversationConfig, ExpansionConfig, MemoryConfig, ModelConfig, ProviderConfig,
    ProviderKind,
};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOKEN_LIMIT: usize = 4096;

pub const DEFAULT_WINDOW_CAPACITY: i64 = 5;

pub const DEFAULT_SHRINK_FACTOR: f64 = 0.7;
pub const DEFAULT_MINIMUM_VIABLE_LENGTH: usize = 1;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

pub const DEFAULT_MEMORY_TOP_K: usize = 3;
pub const DEFAULT_MEMORY_MIN_SCORE: f32 = 0.7;
pub const DEFAULT_CHUNK_WORDS: usize = 20;
pub const DEFAULT_TRANSCRIPT_DIR: &str = "learn";

pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;

/// Apply all defaults to a freshly loaded config. `dir_name` names the bot
/// when no `id` is configured.
pub fn apply_all_defaults(config: BotConfig, dir_name: &str) -> BotConfig {
    let config = apply_identity_defaults(config, dir_name);
    let config = apply_model_defaults(config);
    let config = apply_conversation_defaults(config);
    let config = apply_expansion_defaults(config);
    let config = apply_memory_defaults(config);
    apply_provider_defaults(config)
}

fn apply_identity_defaults(mut config: BotConfig, dir_name: &str) -> BotConfig {
    if config.id.as_deref().map(str::trim).unwrap_or("").is_empty() {
        config.id = Some(dir_name.to_string());
    }
    config
}

fn apply_model_defaults(mut config: BotConfig) -> BotConfig {
    let model = config.model.get_or_insert_with(ModelConfig::default);
    model.name.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    model.max_tokens.get_or_insert(DEFAULT_MAX_TOKENS);
    model.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    model.token_limit.get_or_insert(DEFAULT_TOKEN_LIMIT);
    config
}

/// Non-positive capacities are normalized rather than rejected.
fn apply_conversation_defaults(mut config: BotConfig) -> BotConfig {
    let conversation = config.conversation.get_or_insert_with(ConversationConfig::default);
    match conversation.window_capacity {
        Some(capacity) if capacity > 0 => {}
        _ => conversation.window_capacity = Some(DEFAULT_WINDOW_CAPACITY),
    }
    config
}

/// The cutoff defaults to 80% of the model's token limit; run after the model defaults.
fn apply_expansion_defaults(mut config: BotConfig) -> BotConfig {
    let token_limit = config
        .model
        .as_ref()
        .and_then(|m| m.token_limit)
        .unwrap_or(DEFAULT_TOKEN_LIMIT);
    let expansion = config.expansion.get_or_insert_with(ExpansionConfig::default);
    expansion
        .summarization_token_cutoff
        .get_or_insert(token_limit * 4 / 5);
    expansion.shrink_factor.get_or_insert(DEFAULT_SHRINK_FACTOR);
    if expansion.minimum_viable_length.unwrap_or(0) == 0 {
        expansion.minimum_viable_length = Some(DEFAULT_MINIMUM_VIABLE_LENGTH);
    }
    expansion.fetch_timeout_secs.get_or_insert(DEFAULT_FETCH_TIMEOUT_SECS);
    config
}

fn apply_memory_defaults(mut config: BotConfig) -> BotConfig {
    let memory = config.memory.get_or_insert_with(MemoryConfig::default);
    memory.enabled.get_or_insert(false);
    memory.top_k.get_or_insert(DEFAULT_MEMORY_TOP_K);
    memory.min_score.get_or_insert(DEFAULT_MEMORY_MIN_SCORE);
    memory.chunk_words.get_or_insert(DEFAULT_CHUNK_WORDS);
    memory
        .transcript_dir
        .get_or_insert_with(|| DEFAULT_TRANSCRIPT_DIR.to_string());
    config
}

fn apply_provider_defaults(mut config: BotConfig) -> BotConfig {
    let provider = config.provider.get_or_insert_with(ProviderConfig::default);
    provider.kind.get_or_insert(ProviderKind::OpenAi);
    provider.timeout_secs.get_or_insert(DEFAULT_COMPLETION_TIMEOUT_SECS);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_everything_from_empty() {
        let cfg = apply_all_defaults(BotConfig::default(), "tyk");
        assert_eq!(cfg.id.as_deref(), Some("tyk"));
        let model = cfg.model.unwrap();
        assert_eq!(model.name.as_deref(), Some(DEFAULT_MODEL));
        assert_eq!(model.token_limit, Some(DEFAULT_TOKEN_LIMIT));
        assert_eq!(cfg.conversation.unwrap().window_capacity, Some(5));
        let expansion = cfg.expansion.unwrap();
        assert_eq!(expansion.summarization_token_cutoff, Some(3276));
        assert_eq!(expansion.shrink_factor, Some(0.7));
        assert_eq!(expansion.minimum_viable_length, Some(1));
        assert_eq!(expansion.fetch_timeout_secs, Some(20));
        assert_eq!(cfg.memory.unwrap().transcript_dir.as_deref(), Some("learn"));
        let provider = cfg.provider.unwrap();
        assert_eq!(provider.kind, Some(ProviderKind::OpenAi));
        assert_eq!(provider.timeout_secs, Some(60));
    }

    #[test]
    fn cutoff_follows_token_limit() {
        let cfg = BotConfig {
            model: Some(ModelConfig {
                token_limit: Some(10_000),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg, "bot");
        assert_eq!(cfg.expansion.unwrap().summarization_token_cutoff, Some(8_000));
    }

    #[test]
    fn non_positive_capacity_is_normalized() {
        for capacity in [0, -3] {
            let cfg = BotConfig {
                conversation: Some(ConversationConfig {
                    window_capacity: Some(capacity),
                }),
                ..Default::default()
            };
            let cfg = apply_all_defaults(cfg, "bot");
            assert_eq!(cfg.conversation.unwrap().window_capacity, Some(DEFAULT_WINDOW_CAPACITY));
        }
    }

    #[test]
    fn does_not_override_user_values() {
        let cfg = BotConfig {
            id: Some("custom".into()),
            expansion: Some(ExpansionConfig {
                summarization_token_cutoff: Some(100),
                shrink_factor: Some(0.5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg, "dir");
        assert_eq!(cfg.id.as_deref(), Some("custom"));
        let expansion = cfg.expansion.unwrap();
        assert_eq!(expansion.summarization_token_cutoff, Some(100));
        assert_eq!(expansion.shrink_factor, Some(0.5));
    }
}
