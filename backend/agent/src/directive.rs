//! Directive detection: spot the control messages that bypass completion.

/// A control message handled by the orchestrator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Wipe the conversation history.
    Reset,
    /// Reply with the configured help text.
    Help,
    /// Store the conversation in long-term memory, then wipe it.
    Learn,
}

const LEARN_PREFIX: &str = "learn this:";

/// Detect a directive. `reset` and `help` must be the whole message;
/// `learn this:` is a prefix. Case and surrounding whitespace are ignored.
pub fn detect_directive(text: &str) -> Option<Directive> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("reset") {
        return Some(Directive::Reset);
    }
    if trimmed.eq_ignore_ascii_case("help") {
        return Some(Directive::Help);
    }
    let head = trimmed.get(..LEARN_PREFIX.len())?;
    head.eq_ignore_ascii_case(LEARN_PREFIX).then_some(Directive::Learn)
}
