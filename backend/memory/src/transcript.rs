//! Append-only archive of learned conversation transcripts.
//!
//! One file per conversation key; every learn appends a block that starts with
//! a `===` separator line.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

const BLOCK_SEPARATOR: &str = "===\n";

#[derive(Debug, Clone)]
pub struct TranscriptArchive {
    dir: PathBuf,
}

impl TranscriptArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the archive file for a conversation key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("conversation-with-{safe}"))
    }

    /// Append a transcript block for `key`, creating the directory and file as needed.
    pub async fn append(&self, key: &str, transcript: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create transcript dir: {}", self.dir.display()))?;

        let path = self.path_for(key);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open transcript file: {}", path.display()))?;

        let mut block = String::with_capacity(BLOCK_SEPARATOR.len() + transcript.len());
        block.push_str(BLOCK_SEPARATOR);
        block.push_str(transcript);
        file.write_all(block.as_bytes())
            .await
            .with_context(|| format!("Failed to write transcript file: {}", path.display()))?;
        file.flush().await?;

        debug!(path = %path.display(), bytes = block.len(), "Archived transcript");
        Ok(path)
    }
}
