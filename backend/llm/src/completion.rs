use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use parley_core::{
    ChatMessage, Completion, CompletionMetadata, CompletionRequest, CompletionService,
    LlmProvider, LlmRequest, MemoryRecall, ParleyError, RecalledMemory,
};

pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

const CONTEXT_PREAMBLE: &str = "Use the following context to help with your response:";

/// Chat-completion service: instructions, optional recalled context, history, body.
pub struct ChatCompleter {
    provider: Arc<dyn LlmProvider>,
    memory: Option<Arc<dyn MemoryRecall>>,
    timeout: Duration,
}

impl ChatCompleter {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            memory: None,
            timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryRecall>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn recall_context(&self, request: &CompletionRequest) -> Vec<RecalledMemory> {
        let settings = &request.settings;
        let Some(memory) = self.memory.as_ref().filter(|_| settings.memory_enabled) else {
            return Vec::new();
        };
        match memory
            .recall(&request.body, settings.memory_top_k, settings.memory_min_score)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                // Completion still works without context.
                warn!(error = %e, "Memory recall failed");
                Vec::new()
            }
        }
    }
}

/// Build the provider message list for a request and its recalled context.
pub fn build_messages(request: &CompletionRequest, context: &[RecalledMemory]) -> Vec<ChatMessage> {
    let mut system = request.instructions.clone();
    if !context.is_empty() {
        if !system.is_empty() {
            system.push('\n');
        }
        system.push_str(CONTEXT_PREAMBLE);
        system.push('\n');
        for memory in context {
            system.push('\n');
            system.push_str(&memory.content);
            system.push('\n');
        }
    }

    let mut messages = Vec::with_capacity(request.history.len() + 2);
    if !system.is_empty() {
        messages.push(ChatMessage::system(system));
    }
    messages.extend(request.history.iter().map(ChatMessage::from));
    messages.push(ChatMessage::user(request.body.clone()));
    messages
}

#[async_trait]
impl CompletionService for ChatCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ParleyError> {
        let context = self.recall_context(request).await;
        let llm_request = LlmRequest {
            model: request.settings.model.clone(),
            messages: build_messages(request, &context),
            max_tokens: request.settings.max_tokens,
            temperature: request.settings.temperature,
        };

        debug!(
            provider = %self.provider.name(),
            model = %llm_request.model,
            history = request.history.len(),
            contexts = context.len(),
            "Requesting completion"
        );

        let response = tokio::time::timeout(self.timeout, self.provider.complete(&llm_request))
            .await
            .map_err(|_| {
                ParleyError::CompletionFailed(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ParleyError::CompletionFailed(format!("{e:#}")))?;

        info!(
            provider = %response.provider,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Completion received"
        );

        Ok(Completion {
            text: response.content,
            metadata: CompletionMetadata {
                context_titles: context.iter().map(|m| m.title.clone()).collect(),
                contexts: context.len(),
                provider: response.provider,
                model: response.model,
                tokens_used: response.tokens_used,
            },
        })
    }
}
