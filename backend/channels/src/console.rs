/// Console adapter: one conversation over stdin/stdout, for trying a bot
/// locally without a chat service.
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use parley_core::ChatHandler;
use parley_logging::{ChatEvent, EventLogger};

use crate::ChannelAdapter;

/// Conversation key used for every console message.
pub const CONSOLE_USER: &str = "User";

const CHANNEL_NAME: &str = "console";

pub struct ConsoleAdapter {
    handler: Arc<dyn ChatHandler>,
    key: String,
}

impl ConsoleAdapter {
    pub fn new(handler: Arc<dyn ChatHandler>) -> Self {
        Self {
            handler,
            key: CONSOLE_USER.to_string(),
        }
    }

    /// Answer each non-blank line of `reader` on `writer` until EOF.
    /// Failed requests print their user-facing reply.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut answered = 0;

        while let Some(line) = lines.next_line().await? {
            let message = line.trim();
            if message.is_empty() {
                continue;
            }
            EventLogger::log_event(
                &self.key,
                ChatEvent::Inbound {
                    channel: CHANNEL_NAME.into(),
                    text: message.into(),
                },
            );

            let reply = match self.handler.chat(&self.key, message).await {
                Ok(reply) => reply,
                Err(err) => {
                    debug!(error = %err, "[Console] Chat failed");
                    err.reply
                }
            };

            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            answered += 1;
        }

        Ok(answered)
    }
}

#[async_trait]
impl ChannelAdapter for ConsoleAdapter {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn start(&self) -> Result<()> {
        info!("[Console] Reading messages from stdin");
        let answered = self
            .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await?;
        info!(answered, "[Console] Input closed");
        Ok(())
    }
}
