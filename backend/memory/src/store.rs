use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::{MemoryQuery, SearchResult, VectorEntry};

/// Abstract interface for vector storage.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert or update an entry.
    async fn upsert(&self, entry: VectorEntry) -> Result<()>;

    /// Search for similar entries.
    async fn search(&self, query: MemoryQuery) -> Result<Vec<SearchResult>>;

    /// Delete an entry by ID.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Calculate cosine similarity between two equal-length slices.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

/// Score, filter, order and cap candidate entries for a query.
pub(crate) fn rank(entries: impl IntoIterator<Item = VectorEntry>, query: &MemoryQuery) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = entries
        .into_iter()
        .filter(|entry| {
            query
                .namespace
                .as_ref()
                .is_none_or(|ns| ns == &entry.namespace)
        })
        .map(|entry| {
            let score = cosine_similarity(&query.vector, &entry.vector);
            SearchResult { entry, score }
        })
        .filter(|r| r.score >= query.min_score)
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(query.limit);
    results
}

/// Brute-force in-memory vector store. Nothing survives a restart.
pub struct InMemoryVectorStore {
    entries: RwLock<HashMap<Uuid, VectorEntry>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryVectorStore {
    async fn upsert(&self, entry: VectorEntry) -> Result<()> {
        self.entries.write().await.insert(entry.id, entry);
        Ok(())
    }

    async fn search(&self, query: MemoryQuery) -> Result<Vec<SearchResult>> {
        let entries = self.entries.read().await;
        Ok(rank(entries.values().cloned(), &query))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.entries.write().await.remove(&id);
        Ok(())
    }
}
