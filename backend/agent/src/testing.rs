//! Hand-written fakes for the collaborators of the pipeline and orchestrator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use parley_core::{
    Completion, CompletionMetadata, CompletionRequest, CompletionService, MemoryService,
    ParleyError,
};
use parley_tools::{PageFetcher, TokenCounter};

pub struct MockFetcher {
    body: Option<String>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn page(html: &str) -> Self {
        Self {
            body: Some(html.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            body: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, ParleyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.body {
            Some(body) => Ok(Bytes::from(body.clone())),
            None => Err(ParleyError::FetchFailed(format!("{url}: connection refused"))),
        }
    }
}

/// One token per character.
pub struct CharCounter;

impl TokenCounter for CharCounter {
    fn count(&self, text: &str, _model: &str) -> Result<usize, ParleyError> {
        Ok(text.chars().count())
    }
}

#[derive(Default)]
pub struct MockCompleter {
    reply: Option<String>,
    failure: Option<String>,
    titles: Vec<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = Some(reply.to_string());
        self
    }

    pub fn with_titles(mut self, titles: &[&str]) -> Self {
        self.titles = titles.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for MockCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ParleyError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = &self.failure {
            return Err(ParleyError::CompletionFailed(message.clone()));
        }
        Ok(Completion {
            text: self.reply.clone().unwrap_or_else(|| "ok".to_string()),
            metadata: CompletionMetadata {
                context_titles: self.titles.clone(),
                contexts: self.titles.len(),
                provider: "mock".into(),
                model: request.settings.model.clone(),
                tokens_used: 0,
            },
        })
    }
}

#[derive(Default)]
pub struct MockMemory {
    failure: Option<String>,
    ingested: Mutex<Vec<(String, String, bool)>>,
}

impl MockMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// `(transcript, label, sentence_mode)` per ingest call.
    pub fn ingested(&self) -> Vec<(String, String, bool)> {
        self.ingested.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemoryService for MockMemory {
    async fn ingest(
        &self,
        transcript: &str,
        label: &str,
        sentence_mode: bool,
    ) -> Result<usize, ParleyError> {
        if let Some(message) = &self.failure {
            return Err(ParleyError::MemoryIngestFailed(message.clone()));
        }
        self.ingested
            .lock()
            .unwrap()
            .push((transcript.to_string(), label.to_string(), sentence_mode));
        Ok(transcript.lines().filter(|l| !l.trim().is_empty()).count())
    }
}
