//! Config validation: checks with field paths and readable messages.

use crate::schema::{BotConfig, ProviderKind};
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a config (normally after defaults) and report errors and warnings.
pub fn validate(config: &BotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_model(config, &mut report);
    validate_expansion(config, &mut report);
    validate_memory(config, &mut report);
    validate_provider(config, &mut report);
    report
}

fn validate_model(config: &BotConfig, report: &mut ValidationReport) {
    let Some(model) = &config.model else { return };
    if model.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        report.error("model.name", "Model name cannot be empty");
    }
    if model.token_limit == Some(0) {
        report.error("model.tokenLimit", "tokenLimit must be > 0");
    }
    if model.max_tokens == Some(0) {
        report.error("model.maxTokens", "maxTokens must be > 0");
    }
    if let Some(t) = model.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.error("model.temperature", format!("temperature {t} is outside 0.0..=2.0"));
        }
    }
}

fn validate_expansion(config: &BotConfig, report: &mut ValidationReport) {
    let Some(expansion) = &config.expansion else { return };
    if let Some(factor) = expansion.shrink_factor {
        if !(factor > 0.0 && factor < 1.0) {
            report.error(
                "expansion.shrinkFactor",
                format!("shrinkFactor must be between 0 and 1 (exclusive), got {factor}"),
            );
        }
    }
    if let Some(cutoff) = expansion.summarization_token_cutoff {
        if cutoff == 0 {
            report.error("expansion.summarizationTokenCutoff", "cutoff must be > 0");
        }
        let limit = config.model.as_ref().and_then(|m| m.token_limit);
        if let Some(limit) = limit.filter(|limit| cutoff > *limit) {
            report.warn(
                "expansion.summarizationTokenCutoff",
                format!("cutoff {cutoff} exceeds the model tokenLimit {limit}"),
            );
        }
    }
    if expansion.fetch_timeout_secs == Some(0) {
        report.error("expansion.fetchTimeoutSecs", "fetchTimeoutSecs must be > 0");
    }
}

fn validate_memory(config: &BotConfig, report: &mut ValidationReport) {
    let Some(memory) = &config.memory else { return };
    if let Some(score) = memory.min_score {
        if !(-1.0..=1.0).contains(&score) {
            report.error("memory.minScore", "minScore must be a cosine similarity in -1..=1");
        }
    }
    if memory.enabled == Some(true) && memory.top_k == Some(0) {
        report.warn("memory.topK", "Memory is enabled but topK is 0; nothing will be recalled");
    }
    if memory.chunk_words == Some(0) {
        report.error("memory.chunkWords", "chunkWords must be >= 1");
    }
}

fn validate_provider(config: &BotConfig, report: &mut ValidationReport) {
    let Some(provider) = &config.provider else { return };
    if let Some(url) = &provider.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("provider.baseUrl", format!("'{url}' is not an http(s) URL"));
        }
    }
    if provider.kind == Some(ProviderKind::OpenAi)
        && provider.api_key.as_deref().map(str::is_empty).unwrap_or(true)
    {
        report.warn(
            "provider.apiKey",
            "No apiKey configured; OPENAI_API_KEY from the environment will be used",
        );
    }
    if provider.timeout_secs == Some(0) {
        report.error("provider.timeoutSecs", "timeoutSecs must be > 0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults;
    use crate::schema::{ExpansionConfig, ProviderConfig};

    fn defaulted(config: BotConfig) -> BotConfig {
        apply_all_defaults(config, "bot")
    }

    #[test]
    fn defaulted_config_is_valid() {
        let report = validate(&defaulted(BotConfig::default()));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        // No api key configured.
        assert!(report.warnings.iter().any(|w| w.path == "provider.apiKey"));
    }

    #[test]
    fn shrink_factor_out_of_range_is_error() {
        for factor in [0.0, 1.0, 1.5, -0.2] {
            let cfg = defaulted(BotConfig {
                expansion: Some(ExpansionConfig {
                    shrink_factor: Some(factor),
                    ..Default::default()
                }),
                ..Default::default()
            });
            let report = validate(&cfg);
            assert!(!report.is_valid(), "factor {factor} accepted");
            assert_eq!(report.errors[0].path, "expansion.shrinkFactor");
        }
    }

    #[test]
    fn cutoff_above_limit_is_warning() {
        let cfg = defaulted(BotConfig {
            expansion: Some(ExpansionConfig {
                summarization_token_cutoff: Some(100_000),
                ..Default::default()
            }),
            ..Default::default()
        });
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.path == "expansion.summarizationTokenCutoff"));
    }

    #[test]
    fn bad_base_url_is_error() {
        let cfg = defaulted(BotConfig {
            provider: Some(ProviderConfig {
                kind: Some(ProviderKind::Ollama),
                base_url: Some("localhost:11434".into()),
                ..Default::default()
            }),
            ..Default::default()
        });
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert!(report.errors[0].path.contains("baseUrl"));
    }
}
