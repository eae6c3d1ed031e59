//! `parley-config`: bot configuration loading.
//!
//! Provides:
//! - Typed `bot.yaml` schema
//! - `${ENV_VAR}` substitution
//! - `file://` references for instructions
//! - Default value application
//! - Validation with errors and warnings
//! - Redaction for safe logging

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod settings;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{bot_file_path, load_raw, resolve_file_reference, BOT_FILE_NAME};
pub use redact::redact;
pub use schema::{BotConfig, ProviderKind};
pub use settings::{BotSettings, ExpansionSettings, MemorySettings, ProviderSettings};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load a bot directory: parse `bot.yaml`, substitute env vars, apply
/// defaults, validate and read the instructions file if referenced.
///
/// This is the main entry point for loading a bot at startup.
pub async fn load_bot(bot_dir: &Path) -> Result<BotSettings> {
    load_bot_with_env(bot_dir, &std::env::vars().collect()).await
}

/// [`load_bot`] with an explicit environment.
pub async fn load_bot_with_env(bot_dir: &Path, env: &HashMap<String, String>) -> Result<BotSettings> {
    let raw = load_raw(bot_dir).await?;
    let value: Value =
        resolve_env_vars_with(&raw, env).context("Failed to resolve env vars in bot config")?;

    let config: BotConfig =
        serde_json::from_value(value).context("Failed to deserialize bot config")?;

    let dir_name = bot_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("parley");
    let config = apply_all_defaults(config, dir_name);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("{} config error(s), first: {first}", report.errors.len());
    }

    if let Ok(snapshot) = serde_json::to_value(&config) {
        tracing::debug!(config = %redact(&snapshot), "Bot config prepared");
    }

    let instructions = match config.instructions.as_deref() {
        Some(value) => resolve_file_reference(value, bot_dir)
            .await
            .context("Failed to load instructions")?,
        None => String::new(),
    };

    Ok(BotSettings::from_config(config, bot_dir, instructions))
}
