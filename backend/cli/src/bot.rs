//! Assemble a runnable bot from its settings.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use parley_agent::{ChatOrchestrator, ConversationStore, ExpansionBudget, ExpansionPipeline, HelpSource};
use parley_config::{BotSettings, ProviderKind};
use parley_core::{CompletionService, LlmProvider, ParleyError};
use parley_llm::{ChatCompleter, MockProvider, OllamaProvider, OpenAiProvider, ProviderRegistry};
use parley_memory::{
    InMemoryVectorStore, MemoryBank, MemoryStore, OpenAIEmbeddings, SqliteVecStore, TranscriptArchive,
};
use parley_tools::{HttpPageFetcher, TiktokenCounter};

use crate::config::RuntimeConfig;

/// The OpenAI key for this bot: its own `provider.apiKey`, else the process one.
fn openai_key<'a>(settings: &'a BotSettings, runtime: &'a RuntimeConfig) -> Option<&'a str> {
    let own = match settings.provider.kind {
        ProviderKind::OpenAi => settings.provider.api_key.as_deref(),
        _ => None,
    };
    own.or(runtime.openai_api_key.as_deref())
}

/// Register every provider that can be built with the available credentials.
/// `provider.baseUrl` applies to the configured kind only.
pub fn build_registry(settings: &BotSettings, runtime: &RuntimeConfig) -> ProviderRegistry {
    let base_url = |kind: ProviderKind| {
        settings
            .provider
            .base_url
            .clone()
            .filter(|_| settings.provider.kind == kind)
    };

    let mut registry = ProviderRegistry::new();

    if let Some(api_key) = openai_key(settings, runtime) {
        let mut provider = OpenAiProvider::new(api_key);
        if let Some(url) = base_url(ProviderKind::OpenAi) {
            provider = provider.with_base_url(url);
        }
        registry.register(Arc::new(provider));
    }

    let mut ollama = OllamaProvider::new();
    if let Some(url) = base_url(ProviderKind::Ollama) {
        ollama = ollama.with_base_url(url);
    }
    registry.register(Arc::new(ollama));

    registry.register(Arc::new(MockProvider::new(ProviderKind::Mock.as_str())));
    registry
}

/// Pick the configured provider out of the registry.
pub fn select_provider(
    settings: &BotSettings,
    runtime: &RuntimeConfig,
) -> Result<Arc<dyn LlmProvider>, ParleyError> {
    let registry = build_registry(settings, runtime);
    let kind = settings.provider.kind.as_str();
    registry.get(kind).ok_or_else(|| {
        ParleyError::ConfigError(format!(
            "provider '{}' is unavailable (registered: {}); set provider.apiKey or OPENAI_API_KEY",
            kind,
            registry.list().join(", ")
        ))
    })
}

/// Long-term memory, when an embedding key is available.
pub fn build_memory(settings: &BotSettings, runtime: &RuntimeConfig) -> Result<Option<Arc<MemoryBank>>> {
    let Some(api_key) = openai_key(settings, runtime) else {
        warn!(bot = %settings.id, "No OpenAI key for embeddings; \"learn this:\" and recall are disabled");
        return Ok(None);
    };

    let mut embeddings = OpenAIEmbeddings::new(api_key, settings.memory.embedding_model.clone());
    if settings.provider.kind == ProviderKind::OpenAi {
        if let Some(url) = &settings.provider.base_url {
            embeddings = embeddings.with_base_url(url.clone());
        }
    }

    let store: Arc<dyn MemoryStore> = match &settings.memory.store_path {
        Some(path) => Arc::new(
            SqliteVecStore::open(path)
                .with_context(|| format!("Failed to open memory store {}", path.display()))?,
        ),
        None => {
            info!(bot = %settings.id, "No memory.storePath; memories last until restart");
            Arc::new(InMemoryVectorStore::new())
        }
    };

    let bank = MemoryBank::new(settings.id.clone(), Arc::new(embeddings), store)
        .with_chunk_words(settings.memory.chunk_words);
    Ok(Some(Arc::new(bank)))
}

/// Wire the full conversation pipeline for one bot.
pub fn build_orchestrator(settings: &BotSettings, runtime: &RuntimeConfig) -> Result<ChatOrchestrator> {
    let provider = select_provider(settings, runtime)?;
    let memory = build_memory(settings, runtime)?;

    let mut completer = ChatCompleter::new(provider).with_timeout(settings.provider.timeout);
    if let (true, Some(bank)) = (settings.completion.memory_enabled, &memory) {
        completer = completer.with_memory(bank.clone());
    }
    let completer: Arc<dyn CompletionService> = Arc::new(completer);

    let budget = ExpansionBudget {
        cutoff: settings.expansion.summarization_token_cutoff,
        shrink_factor: settings.expansion.shrink_factor,
        minimum_viable_length: settings.expansion.minimum_viable_length,
    };
    let pipeline = ExpansionPipeline::new(
        Arc::new(HttpPageFetcher::new(settings.expansion.fetch_timeout)?),
        Arc::new(TiktokenCounter::new()),
        completer.clone(),
        budget,
    );

    let mut orchestrator = ChatOrchestrator::new(
        ConversationStore::new(settings.window_capacity),
        pipeline,
        completer,
        settings.completion.clone(),
    )
    .with_instructions(settings.instructions.clone())
    .with_help(HelpSource::from_setting(settings.help.as_deref(), &settings.dir))
    .with_archive(TranscriptArchive::new(settings.memory.transcript_dir.clone()));

    if let Some(bank) = memory {
        orchestrator = orchestrator.with_memory(bank);
    }

    info!(
        bot = %settings.id,
        provider = settings.provider.kind.as_str(),
        model = %settings.completion.model,
        window = settings.window_capacity,
        "Bot ready"
    );
    Ok(orchestrator)
}
