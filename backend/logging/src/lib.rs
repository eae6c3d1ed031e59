//! Structured logging for Parley.
//!
//! Handles subscriber setup (console plus daily NDJSON files), log redaction,
//! and conversation event records.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{ChatEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
