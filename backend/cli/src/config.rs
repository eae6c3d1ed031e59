use parley_channels::DEFAULT_WEBHOOK_PATH;

/// Parley process configuration. Per-bot settings live in the bot directory.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Directory for the daily NDJSON log files
    pub log_dir: String,
    /// Log level, overridden by RUST_LOG directives
    pub log_level: String,

    // Slack
    pub slack_signing_secret: Option<String>,
    pub slack_bot_token: Option<String>,
    pub slack_webhook_path: String,

    /// Fallback key for the OpenAI provider and embeddings
    pub openai_api_key: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            log_dir: "logs".to_string(),
            log_level: "info".to_string(),
            slack_signing_secret: None,
            slack_bot_token: None,
            slack_webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            openai_api_key: None,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            bind_address: var("PARLEY_BIND").unwrap_or(defaults.bind_address),
            port: var("PARLEY_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_dir: var("PARLEY_LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            slack_signing_secret: var("SLACK_SIGNING_SECRET"),
            slack_bot_token: var("SLACK_BOT_TOKEN"),
            slack_webhook_path: var("SLACK_WEBHOOK_PATH").unwrap_or(defaults.slack_webhook_path),
            openai_api_key: var("OPENAI_API_KEY"),
        }
    }
}
