//! Transports that carry user messages to a [`ChatHandler`] and post its
//! replies back.

pub mod console;
pub mod slack;

pub use console::{ConsoleAdapter, CONSOLE_USER};
pub use slack::{clean_mention_text, SlackAdapter, SlackConfig, DEFAULT_WEBHOOK_PATH};

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Routes for webhook-based adapters; mounted on the shared HTTP server.
    fn build_router(&self) -> axum::Router {
        axum::Router::new()
    }

    /// Run the adapter. Webhook adapters return immediately; polling ones
    /// return when their input is exhausted.
    async fn start(&self) -> Result<()>;
}
