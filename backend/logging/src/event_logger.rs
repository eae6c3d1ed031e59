//! Conversation Event Logger
//!
//! Inbound messages, replies and failures recorded as structured events in
//! the NDJSON log, with secrets scrubbed first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    Inbound { channel: String, text: String },
    Reply { channel: String, text: String },
    Error { channel: String, error_msg: String },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub key: String,
    pub timestamp: DateTime<Utc>,
    pub event: ChatEvent,
}

impl EventLogEntry {
    /// Build an entry for `key` with all free text redacted.
    pub fn new(key: &str, mut event: ChatEvent) -> Self {
        match &mut event {
            ChatEvent::Inbound { text, .. } | ChatEvent::Reply { text, .. } => {
                *text = redact_sensitive_data(text);
            }
            ChatEvent::Error { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
        }
        Self {
            key: key.into(),
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    /// Record a conversation event for `key`.
    pub fn log_event(key: &str, event: ChatEvent) {
        let entry = EventLogEntry::new(key, event);
        info!(target: "chat_events", event = ?entry, "Chat event");
    }
}
