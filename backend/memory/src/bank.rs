//! Long-term memory for a bot: learn transcripts, recall relevant snippets.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use parley_core::{MemoryRecall, MemoryService, ParleyError, RecalledMemory};

use crate::chunking::{chunk_words, split_sentences};
use crate::embeddings::EmbeddingProvider;
use crate::store::MemoryStore;
use crate::types::{MemoryQuery, VectorEntry};

/// Default words per chunk when not learning sentence by sentence.
pub const DEFAULT_CHUNK_WORDS: usize = 20;

pub struct MemoryBank {
    namespace: String,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn MemoryStore>,
    chunk_words: usize,
}

impl MemoryBank {
    pub fn new(
        namespace: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            embedder,
            store,
            chunk_words: DEFAULT_CHUNK_WORDS,
        }
    }

    pub fn with_chunk_words(mut self, words: usize) -> Self {
        self.chunk_words = words.max(1);
        self
    }
}

#[async_trait]
impl MemoryService for MemoryBank {
    async fn ingest(
        &self,
        transcript: &str,
        label: &str,
        sentence_mode: bool,
    ) -> Result<usize, ParleyError> {
        let units = if sentence_mode {
            split_sentences(transcript)
        } else {
            chunk_words(transcript, self.chunk_words)
        };
        if units.is_empty() {
            return Ok(0);
        }

        let count = units.len();
        let vectors = {
            let refs: Vec<&str> = units.iter().map(String::as_str).collect();
            self.embedder
                .embed_batch(&refs)
                .await
                .map_err(|e| ParleyError::MemoryIngestFailed(format!("embedding failed: {e}")))?
        };
        if vectors.len() != count {
            return Err(ParleyError::MemoryIngestFailed(format!(
                "expected {count} embeddings, got {}",
                vectors.len()
            )));
        }

        let now = Utc::now().timestamp();
        for (content, vector) in units.into_iter().zip(vectors) {
            self.store
                .upsert(VectorEntry {
                    id: Uuid::new_v4(),
                    namespace: self.namespace.clone(),
                    label: label.to_string(),
                    content,
                    vector,
                    created_at: now,
                })
                .await
                .map_err(|e| ParleyError::MemoryIngestFailed(format!("store failed: {e}")))?;
        }

        info!(namespace = %self.namespace, label = %label, count, "Learned transcript");
        Ok(count)
    }
}

#[async_trait]
impl MemoryRecall for MemoryBank {
    async fn recall(
        &self,
        query: &str,
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<RecalledMemory>, ParleyError> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(vec![]);
        }
        let vector = self.embedder.embed(query).await?;
        let results = self
            .store
            .search(MemoryQuery {
                vector,
                min_score,
                limit,
                namespace: Some(self.namespace.clone()),
            })
            .await?;
        debug!(namespace = %self.namespace, hits = results.len(), "Recalled memories");

        Ok(results
            .into_iter()
            .map(|r| RecalledMemory {
                title: r.entry.label,
                content: r.entry.content,
                score: r.score,
            })
            .collect())
    }
}
