//! Fully resolved bot settings handed to the runtime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parley_core::CompletionSettings;

use crate::defaults::*;
use crate::schema::{BotConfig, ProviderKind};

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub id: String,
    /// The bot directory; relative paths in the config hang off it
    pub dir: PathBuf,
    /// Instructions with any `file://` reference already read
    pub instructions: String,
    /// Raw help setting; `file://` references are read per request
    pub help: Option<String>,
    pub completion: CompletionSettings,
    pub token_limit: usize,
    pub window_capacity: usize,
    pub expansion: ExpansionSettings,
    pub memory: MemorySettings,
    pub provider: ProviderSettings,
}

#[derive(Debug, Clone)]
pub struct ExpansionSettings {
    pub summarization_token_cutoff: usize,
    pub shrink_factor: f64,
    pub minimum_viable_length: usize,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MemorySettings {
    pub chunk_words: usize,
    pub transcript_dir: PathBuf,
    pub store_path: Option<PathBuf>,
    pub embedding_model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl BotSettings {
    /// Flatten a defaulted config. Missing values (if defaults were skipped)
    /// fall back to the same defaults.
    pub fn from_config(config: BotConfig, dir: &Path, instructions: String) -> Self {
        let model = config.model.unwrap_or_default();
        let conversation = config.conversation.unwrap_or_default();
        let expansion = config.expansion.unwrap_or_default();
        let memory = config.memory.unwrap_or_default();
        let provider = config.provider.unwrap_or_default();

        let token_limit = model.token_limit.unwrap_or(DEFAULT_TOKEN_LIMIT);
        let window_capacity = conversation
            .window_capacity
            .filter(|c| *c > 0)
            .unwrap_or(DEFAULT_WINDOW_CAPACITY) as usize;

        Self {
            id: config.id.unwrap_or_default(),
            dir: dir.to_path_buf(),
            instructions,
            help: config.help,
            completion: CompletionSettings {
                model: model.name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_tokens: model.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                temperature: model.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                memory_enabled: memory.enabled.unwrap_or(false),
                memory_top_k: memory.top_k.unwrap_or(DEFAULT_MEMORY_TOP_K),
                memory_min_score: memory.min_score.unwrap_or(DEFAULT_MEMORY_MIN_SCORE),
            },
            token_limit,
            window_capacity,
            expansion: ExpansionSettings {
                summarization_token_cutoff: expansion
                    .summarization_token_cutoff
                    .unwrap_or(token_limit * 4 / 5),
                shrink_factor: expansion.shrink_factor.unwrap_or(DEFAULT_SHRINK_FACTOR),
                minimum_viable_length: expansion
                    .minimum_viable_length
                    .unwrap_or(DEFAULT_MINIMUM_VIABLE_LENGTH)
                    .max(1),
                fetch_timeout: Duration::from_secs(
                    expansion.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
                ),
            },
            memory: MemorySettings {
                chunk_words: memory.chunk_words.unwrap_or(DEFAULT_CHUNK_WORDS),
                transcript_dir: dir.join(
                    memory
                        .transcript_dir
                        .as_deref()
                        .unwrap_or(DEFAULT_TRANSCRIPT_DIR),
                ),
                store_path: memory.store_path.map(|p| dir.join(p)),
                embedding_model: memory.embedding_model,
            },
            provider: ProviderSettings {
                kind: provider.kind.unwrap_or_default(),
                base_url: provider.base_url,
                api_key: provider.api_key.filter(|k| !k.is_empty()),
                timeout: Duration::from_secs(
                    provider.timeout_secs.unwrap_or(DEFAULT_COMPLETION_TIMEOUT_SECS),
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MemoryConfig;

    #[test]
    fn paths_are_relative_to_bot_dir() {
        let config = BotConfig {
            memory: Some(MemoryConfig {
                store_path: Some("memory.db".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let settings = BotSettings::from_config(config, Path::new("/bots/tyk"), String::new());
        assert_eq!(settings.memory.transcript_dir, PathBuf::from("/bots/tyk/learn"));
        assert_eq!(settings.memory.store_path, Some(PathBuf::from("/bots/tyk/memory.db")));
    }

    #[test]
    fn undefaulted_config_still_resolves() {
        let settings = BotSettings::from_config(BotConfig::default(), Path::new("."), "hi".into());
        assert_eq!(settings.window_capacity, 5);
        assert_eq!(settings.expansion.summarization_token_cutoff, 3276);
        assert_eq!(settings.completion.model, DEFAULT_MODEL);
        assert_eq!(settings.provider.timeout, Duration::from_secs(60));
    }
}
