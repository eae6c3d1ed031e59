use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::{routing::get, Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use parley_channels::{ChannelAdapter, SlackAdapter, SlackConfig};
use parley_core::ChatHandler;

use crate::config::RuntimeConfig;

/// Health route plus every adapter's webhook routes.
pub fn build_router(bot_id: &str, adapters: &[&dyn ChannelAdapter]) -> Router {
    let bot = bot_id.to_string();
    let mut app = Router::new().route(
        "/api/health",
        get(move || {
            let bot = bot.clone();
            async move { Json(json!({ "status": "ok", "bot": bot })) }
        }),
    );
    for adapter in adapters {
        app = app.merge(adapter.build_router());
    }
    app.layer(TraceLayer::new_for_http())
}

/// Serve the Slack webhook until SIGINT or SIGTERM.
pub async fn run_server(config: RuntimeConfig, bot_id: &str, handler: Arc<dyn ChatHandler>) -> Result<()> {
    let (Some(secret), Some(token)) = (&config.slack_signing_secret, &config.slack_bot_token) else {
        bail!("SLACK_SIGNING_SECRET and SLACK_BOT_TOKEN must be set to serve");
    };
    let slack = SlackAdapter::new(
        SlackConfig::new(secret.clone(), token.clone()).with_webhook_path(config.slack_webhook_path.clone()),
        handler,
    );
    slack.start().await?;

    let app = build_router(bot_id, &[&slack]);
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(addr = %addr, bot = %bot_id, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
