//! Reading a bot directory from disk.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Config file name within a bot directory.
pub const BOT_FILE_NAME: &str = "bot.yaml";

/// Prefix marking a value that should be read from a file.
pub const FILE_REFERENCE_PREFIX: &str = "file://";

pub fn bot_file_path(bot_dir: &Path) -> PathBuf {
    bot_dir.join(BOT_FILE_NAME)
}

/// Read `bot.yaml` as an untyped value tree, ready for env substitution.
///
/// Unlike runtime settings, a bot has no usable defaults without its file,
/// so a missing file is an error.
pub async fn load_raw(bot_dir: &Path) -> Result<Value> {
    let path = bot_file_path(bot_dir);
    if !path.exists() {
        bail!("Bot config not found: {}", path.display());
    }

    let raw = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read bot config: {}", path.display()))?;

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse bot config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded bot config");
    // An empty file parses as null.
    Ok(if value.is_null() { Value::Object(Default::default()) } else { value })
}

/// Return `value`, or the contents of the file it names with `file://path`.
/// Relative paths are resolved against `base_dir`.
pub async fn resolve_file_reference(value: &str, base_dir: &Path) -> Result<String> {
    let Some(path) = value.strip_prefix(FILE_REFERENCE_PREFIX) else {
        return Ok(value.to_string());
    };
    let path = base_dir.join(path);
    let contents = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read referenced file: {}", path.display()))?;
    debug!(path = %path.display(), bytes = contents.len(), "Resolved file reference");
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn literal_values_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let value = resolve_file_reference("Be nice.", dir.path()).await.unwrap();
        assert_eq!(value, "Be nice.");
    }

    #[tokio::test]
    async fn file_reference_is_read_relative_to_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("instructions.md"), "You are Parley.").unwrap();
        let value = resolve_file_reference("file://instructions.md", dir.path())
            .await
            .unwrap();
        assert_eq!(value, "You are Parley.");
    }

    #[tokio::test]
    async fn missing_referenced_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_file_reference("file://nope.md", dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("nope.md"));
    }

    #[tokio::test]
    async fn missing_bot_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_raw(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn empty_bot_file_is_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(bot_file_path(dir.path()), "").unwrap();
        let value = load_raw(dir.path()).await.unwrap();
        assert!(value.as_object().unwrap().is_empty());
    }
}
