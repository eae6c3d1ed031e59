/// Slack channel adapter for Parley.
///
/// Receives Slack Events API webhooks for `app_mention` events, hands the
/// cleaned text to the chat handler and posts the reply in-thread using the
/// Slack Web API (`chat.postMessage`).
///
/// Required env vars:
///   SLACK_SIGNING_SECRET  used to verify X-Slack-Signature HMAC
///   SLACK_BOT_TOKEN       Bot User OAuth Token (xoxb-...)
///   SLACK_WEBHOOK_PATH    path to mount the webhook (default: /webhooks/slack)
use crate::ChannelAdapter;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use once_cell::sync::Lazy;
use parley_core::{ChatHandler, ParleyError};
use parley_logging::{ChatEvent, EventLogger};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

pub const DEFAULT_WEBHOOK_PATH: &str = "/webhooks/slack";
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Requests signed longer ago than this are treated as replays.
const MAX_REQUEST_AGE_SECS: u64 = 60 * 5;

const CHANNEL_NAME: &str = "slack";

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<@[A-Za-z0-9]+(?:\|[^>]*)?>").expect("valid regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(https?://[^|>\s]+)(?:\|[^>]*)?>").expect("valid regex"));

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SlackConfig {
    pub signing_secret: String,
    pub bot_token: String,
    pub webhook_path: String,
    pub api_base_url: String,
}

impl SlackConfig {
    pub fn new(signing_secret: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            bot_token: bot_token.into(),
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            api_base_url: SLACK_API_BASE.to_string(),
        }
    }

    pub fn with_webhook_path(mut self, path: impl Into<String>) -> Self {
        self.webhook_path = path.into();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

// ---------------------------------------------------------------------------
// Axum state
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    config: Arc<SlackConfig>,
    handler: Arc<dyn ChatHandler>,
    http_client: Client,
}

// ---------------------------------------------------------------------------
// Slack wire types
// ---------------------------------------------------------------------------

/// Top-level event envelope from the Slack Events API.
#[derive(Deserialize, Debug)]
struct SlackEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    /// Present on `url_verification` challenges.
    challenge: Option<String>,
    /// Present on `event_callback`.
    event: Option<SlackEvent>,
}

#[derive(Deserialize, Debug)]
struct SlackEvent {
    #[serde(rename = "type")]
    event_type: String,
    user: Option<String>,
    text: Option<String>,
    channel: Option<String>,
    ts: Option<String>,
    /// If set this is a bot message, ignore it.
    bot_id: Option<String>,
    thread_ts: Option<String>,
}

#[derive(Serialize)]
struct SlackPostMessage<'a> {
    channel: &'a str,
    text: &'a str,
    thread_ts: &'a str,
    unfurl_links: bool,
    unfurl_media: bool,
}

#[derive(Deserialize)]
struct SlackApiResponse {
    ok: bool,
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Adapter struct
// ---------------------------------------------------------------------------

pub struct SlackAdapter {
    config: Arc<SlackConfig>,
    handler: Arc<dyn ChatHandler>,
    http_client: Client,
}

impl SlackAdapter {
    pub fn new(config: SlackConfig, handler: Arc<dyn ChatHandler>) -> Self {
        Self {
            config: Arc::new(config),
            handler,
            http_client: Client::new(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    fn state(&self) -> AppState {
        AppState {
            config: self.config.clone(),
            handler: self.handler.clone(),
            http_client: self.http_client.clone(),
        }
    }

    /// Post `text` as a reply in the thread rooted at `thread_ts`.
    pub async fn send_reply(&self, channel: &str, thread_ts: &str, text: &str) -> Result<(), ParleyError> {
        post_reply(&self.state(), channel, thread_ts, text)
            .await
            .map_err(|e| ParleyError::ChannelError(format!("{e:#}")))
    }
}

// ---------------------------------------------------------------------------
// Webhook handler
// ---------------------------------------------------------------------------

async fn handle_slack_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // 1. Verify Slack signature (HMAC-SHA256 over version, timestamp and body)
    if !verify_slack_signature(&headers, &body, &state.config.signing_secret, now_secs()) {
        warn!("[Slack] Invalid signature, rejecting webhook");
        return (StatusCode::UNAUTHORIZED, "invalid_signature").into_response();
    }

    // 2. Parse JSON
    let envelope: SlackEnvelope = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(err) => {
            error!("[Slack] Failed to parse event envelope: {}", err);
            return (StatusCode::BAD_REQUEST, "bad_json").into_response();
        }
    };

    // 3. URL-verification challenge (required at initial setup)
    if envelope.event_type == "url_verification" {
        if let Some(challenge) = envelope.challenge {
            return (StatusCode::OK, challenge).into_response();
        }
    }

    // 4. Slack redelivers events it thinks timed out; the first delivery is
    //    already being answered.
    if headers.contains_key("x-slack-retry-num") {
        debug!("[Slack] Ignoring redelivered event");
        return (StatusCode::OK, "retry_ignored").into_response();
    }

    if envelope.event_type != "event_callback" {
        return (StatusCode::OK, "ignored").into_response();
    }

    let Some(slack_event) = envelope.event else {
        return (StatusCode::OK, "no_event").into_response();
    };

    // 5. Only mentions of the bot by real users
    if slack_event.event_type != "app_mention" || slack_event.bot_id.is_some() {
        return (StatusCode::OK, "ignored").into_response();
    }

    let (Some(text), Some(user), Some(channel), Some(ts)) = (
        slack_event.text,
        slack_event.user,
        slack_event.channel,
        slack_event.ts,
    ) else {
        warn!("[Slack] app_mention missing text, user, channel or ts");
        return (StatusCode::OK, "incomplete_event").into_response();
    };

    let message = clean_mention_text(&text);
    let thread_ts = slack_event.thread_ts.unwrap_or(ts);
    info!(user = %user, channel = %channel, "[Slack] Mention received");

    // Slack expects an answer within three seconds; the chat runs on its own task.
    tokio::spawn(respond(state, user, channel, thread_ts, message));

    (StatusCode::OK, "ok").into_response()
}

async fn respond(state: AppState, user: String, channel: String, thread_ts: String, message: String) {
    EventLogger::log_event(
        &user,
        ChatEvent::Inbound {
            channel: CHANNEL_NAME.into(),
            text: message.clone(),
        },
    );

    let reply = match state.handler.chat(&user, &message).await {
        Ok(reply) => reply,
        Err(err) => {
            EventLogger::log_event(
                &user,
                ChatEvent::Error {
                    channel: CHANNEL_NAME.into(),
                    error_msg: err.to_string(),
                },
            );
            err.reply
        }
    };

    match post_reply(&state, &channel, &thread_ts, &reply).await {
        Ok(()) => EventLogger::log_event(
            &user,
            ChatEvent::Reply {
                channel: CHANNEL_NAME.into(),
                text: reply,
            },
        ),
        Err(err) => error!(user = %user, channel = %channel, "[Slack] Failed to post reply: {:#}", err),
    }
}

async fn post_reply(state: &AppState, channel: &str, thread_ts: &str, text: &str) -> Result<()> {
    let url = format!("{}/chat.postMessage", state.config.api_base_url);
    let body = SlackPostMessage {
        channel,
        text,
        thread_ts,
        unfurl_links: false,
        unfurl_media: false,
    };
    let res = state
        .http_client
        .post(&url)
        .bearer_auth(&state.config.bot_token)
        .json(&body)
        .send()
        .await
        .context("chat.postMessage request failed")?;

    if !res.status().is_success() {
        let status = res.status();
        let err = res.text().await.unwrap_or_default();
        bail!("chat.postMessage returned {}: {}", status, err);
    }

    // Slack reports most failures as 200 with `ok: false`.
    let api: SlackApiResponse = res
        .json()
        .await
        .context("chat.postMessage returned invalid JSON")?;
    if !api.ok {
        bail!(
            "chat.postMessage rejected: {}",
            api.error.as_deref().unwrap_or("unknown_error")
        );
    }
    debug!(channel = %channel, thread_ts = %thread_ts, "[Slack] Posted reply");
    Ok(())
}

/// Strip the leading bot mention and unwrap Slack link markup
/// (`<https://x|label>` becomes `https://x`).
pub fn clean_mention_text(text: &str) -> String {
    let without_mention = MENTION_RE.replacen(text, 1, "");
    LINK_RE
        .replace_all(&without_mention, "$1")
        .trim()
        .to_string()
}

/// Verify the `X-Slack-Signature` header using HMAC-SHA256.
fn verify_slack_signature(headers: &HeaderMap, body: &[u8], signing_secret: &str, now: u64) -> bool {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let (Some(sig), Some(ts)) = (header("x-slack-signature"), header("x-slack-request-timestamp"))
    else {
        return false;
    };

    let Ok(ts_secs) = ts.parse::<u64>() else {
        return false;
    };
    if now.abs_diff(ts_secs) > MAX_REQUEST_AGE_SECS {
        return false;
    }

    let Some(expected) = sig.strip_prefix("v0=").and_then(|h| hex::decode(h).ok()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(signing_secret.as_bytes()) else {
        return false;
    };
    mac.update(b"v0:");
    mac.update(ts.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// ChannelAdapter impl
// ---------------------------------------------------------------------------

#[async_trait]
impl ChannelAdapter for SlackAdapter {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    fn build_router(&self) -> Router {
        Router::new()
            .route(&self.config.webhook_path, post(handle_slack_event))
            .with_state(self.state())
    }

    async fn start(&self) -> Result<()> {
        info!(path = %self.config.webhook_path, "[Slack] Adapter ready (webhook-based)");
        Ok(())
    }
}
