pub mod bank;
pub mod chunking;
pub mod embeddings;
pub mod sqlite_store;
pub mod store;
pub mod transcript;
pub mod types;

pub use bank::{MemoryBank, DEFAULT_CHUNK_WORDS};
pub use embeddings::{EmbeddingProvider, OpenAIEmbeddings};
pub use sqlite_store::SqliteVecStore;
pub use store::{InMemoryVectorStore, MemoryStore};
pub use transcript::TranscriptArchive;
