use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored memory entry with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: Uuid,
    /// Bot the memory belongs to
    pub namespace: String,
    /// Human-readable origin, e.g. "conversation with U123"
    pub label: String,
    /// The text content of the memory
    pub content: String,
    /// The embedding vector
    pub vector: Vec<f32>,
    /// Unix timestamp (seconds) when this entry was created
    pub created_at: i64,
}

/// A query for retrieving relevant memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryQuery {
    /// The embedding vector of the query
    pub vector: Vec<f32>,
    /// Minimum similarity score (0.0 to 1.0)
    pub min_score: f32,
    /// Max number of results to return
    pub limit: usize,
    /// Only search this namespace when set
    pub namespace: Option<String>,
}

impl Default for MemoryQuery {
    fn default() -> Self {
        Self {
            vector: vec![],
            min_score: 0.0,
            limit: 10,
            namespace: None,
        }
    }
}

/// Result of a memory search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub entry: VectorEntry,
    pub score: f32,
}
