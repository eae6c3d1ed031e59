/// SQLite-backed durable vector store.
///
/// Persists `VectorEntry` rows in a `memories` table; similarity is computed
/// in Rust after loading the candidate rows for a namespace.
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, params};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{MemoryStore, rank};
use crate::types::{MemoryQuery, SearchResult, VectorEntry};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS memories (
         id          TEXT PRIMARY KEY,
         namespace   TEXT NOT NULL,
         label       TEXT NOT NULL,
         content     TEXT NOT NULL,
         vector_json TEXT NOT NULL,
         created_at  INTEGER NOT NULL
     );
     CREATE INDEX IF NOT EXISTS idx_memories_namespace ON memories(namespace);";

pub struct SqliteVecStore {
    conn: Mutex<Connection>,
}

impl SqliteVecStore {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .context("Failed to open SQLite memory database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to enable WAL")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize memories schema")?;

        info!(path = %path.as_ref().display(), "SqliteVecStore opened");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

#[async_trait]
impl MemoryStore for SqliteVecStore {
    async fn upsert(&self, entry: VectorEntry) -> Result<()> {
        let conn = self.conn.lock().await;
        let vector_json = serde_json::to_string(&entry.vector)?;
        conn.execute(
            "INSERT OR REPLACE INTO memories (id, namespace, label, content, vector_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id.to_string(),
                entry.namespace,
                entry.label,
                entry.content,
                vector_json,
                entry.created_at,
            ],
        )?;
        debug!(id = %entry.id, "Upserted memory");
        Ok(())
    }

    async fn search(&self, query: MemoryQuery) -> Result<Vec<SearchResult>> {
        let conn = self.conn.lock().await;

        let rows: Vec<VectorEntry> = match &query.namespace {
            Some(ns) => {
                let mut stmt = conn.prepare(
                    "SELECT id, namespace, label, content, vector_json, created_at
                     FROM memories WHERE namespace = ?1",
                )?;
                let rows = stmt
                    .query_map(params![ns], row_to_entry)?
                    .filter_map(|r| r.ok())
                    .collect();
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, namespace, label, content, vector_json, created_at FROM memories",
                )?;
                let rows = stmt
                    .query_map([], row_to_entry)?
                    .filter_map(|r| r.ok())
                    .collect();
                rows
            }
        };

        Ok(rank(rows, &query))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM memories WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }
}

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<VectorEntry> {
    let id_str: String = row.get(0)?;
    let vector_json: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::InvalidParameterName(e.to_string()))?;
    let vector: Vec<f32> = serde_json::from_str(&vector_json)
        .map_err(|e| rusqlite::Error::InvalidParameterName(e.to_string()))?;

    Ok(VectorEntry {
        id,
        namespace: row.get(1)?,
        label: row.get(2)?,
        content: row.get(3)?,
        vector,
        created_at: row.get(5)?,
    })
}
