mod bot;
mod config;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use parley_channels::{ChannelAdapter, ConsoleAdapter};

use config::RuntimeConfig;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley: a chat assistant that reads the links you send it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a bot over the Slack Events API
    Serve {
        /// Bot directory containing bot.yaml
        bot_dir: PathBuf,
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Chat with a bot on the console
    Chat {
        /// Bot directory containing bot.yaml
        bot_dir: PathBuf,
    },
    /// Check whether a server is running
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();
    parley_logging::init_logger(&config.log_dir, &config.log_level);

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bot_dir, port } => {
            let config = RuntimeConfig {
                port: port.unwrap_or(config.port),
                ..config
            };
            let settings = parley_config::load_bot(&bot_dir).await?;
            let orchestrator = Arc::new(bot::build_orchestrator(&settings, &config)?);
            server::run_server(config, &settings.id, orchestrator).await?;
        }
        Commands::Chat { bot_dir } => {
            let settings = parley_config::load_bot(&bot_dir).await?;
            let orchestrator = Arc::new(bot::build_orchestrator(&settings, &config)?);
            info!(bot = %settings.id, "Console chat started; end input to quit");
            ConsoleAdapter::new(orchestrator).start().await?;
        }
        Commands::Status => {
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("Parley is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}
