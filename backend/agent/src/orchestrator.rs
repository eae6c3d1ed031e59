//! Per-message conversation handling: history, directives, link expansion,
//! completion and rendering.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use parley_core::{
    ChatError, ChatHandler, CompletionRequest, CompletionService, CompletionSettings,
    ConversationTurn, MemoryService, ParleyError,
};
use parley_memory::TranscriptArchive;

use crate::directive::{detect_directive, Directive};
use crate::expand::ExpansionPipeline;
use crate::render::render_response;
use crate::store::ConversationStore;
use crate::window::RollingWindow;

pub const RESET_REPLY: &str = "OK, I've wiped all history of our conversation";
pub const HELP_FALLBACK: &str = "hmm, I can't find my help response!";

const FILE_PREFIX: &str = "file://";

/// Where the help reply comes from. Files are read on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HelpSource {
    #[default]
    Missing,
    Text(String),
    File(PathBuf),
}

impl HelpSource {
    /// Interpret a configured help value. `file://` paths are relative to `base_dir`.
    pub fn from_setting(raw: Option<&str>, base_dir: &Path) -> Self {
        match raw.map(str::trim) {
            None | Some("") => HelpSource::Missing,
            Some(value) => match value.strip_prefix(FILE_PREFIX) {
                Some(path) => HelpSource::File(base_dir.join(path)),
                None => HelpSource::Text(value.to_string()),
            },
        }
    }

    pub async fn load(&self) -> Option<String> {
        match self {
            HelpSource::Missing => None,
            HelpSource::Text(text) => Some(text.clone()),
            HelpSource::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Help file unreadable");
                    None
                }
            },
        }
    }
}

/// One `role: content` line per turn.
pub fn format_transcript<'a>(turns: impl IntoIterator<Item = &'a ConversationTurn>) -> String {
    turns
        .into_iter()
        .map(|turn| format!("{}: {}\n", turn.role, turn.content))
        .collect()
}

/// The message with expanded link content appended.
pub fn augment_message(message: &str, content: &str) -> String {
    format!("{message}\nThe link mentioned earlier contains the following content:\n{content}\n")
}

pub struct ChatOrchestrator {
    conversations: ConversationStore,
    expansion: ExpansionPipeline,
    completer: Arc<dyn CompletionService>,
    memory: Option<Arc<dyn MemoryService>>,
    archive: Option<TranscriptArchive>,
    instructions: String,
    help: HelpSource,
    settings: CompletionSettings,
}

impl ChatOrchestrator {
    pub fn new(
        conversations: ConversationStore,
        expansion: ExpansionPipeline,
        completer: Arc<dyn CompletionService>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            conversations,
            expansion,
            completer,
            memory: None,
            archive: None,
            instructions: String::new(),
            help: HelpSource::Missing,
            settings,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_help(mut self, help: HelpSource) -> Self {
        self.help = help;
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryService>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_archive(mut self, archive: TranscriptArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    async fn learn(
        &self,
        key: &str,
        window: &mut RollingWindow<ConversationTurn>,
    ) -> Result<String, ChatError> {
        let transcript = format_transcript(window.snapshot());
        let label = format!("conversation with {key}");

        let result = match &self.memory {
            Some(memory) => memory.ingest(&transcript, &label, true).await,
            None => Err(ParleyError::MemoryIngestFailed(
                "long-term memory is not configured".to_string(),
            )),
        };
        let count = match result {
            Ok(count) => count,
            Err(e) => {
                warn!(key = %key, error = %e, "Learning failed, keeping history");
                return Err(ChatError::new(
                    format!("something went wrong with my brain: {e}"),
                    e,
                ));
            }
        };

        let archived = match &self.archive {
            Some(archive) => match archive.append(key, &transcript).await {
                Ok(_) => true,
                Err(e) => {
                    warn!(key = %key, error = %e, "Learned, but failed to archive transcript");
                    false
                }
            },
            None => true,
        };

        window.reset(self.conversations.capacity());
        info!(key = %key, count, archived, "Conversation learned");
        Ok(if archived {
            format!("Saved {count} items, I'll now wipe this exchange from my short term memory")
        } else {
            format!(
                "Saved {count} items, but couldn't write the transcript file. \
                 I'll now wipe this exchange from my short term memory"
            )
        })
    }

    async fn converse(
        &self,
        key: &str,
        message: &str,
        window: &mut RollingWindow<ConversationTurn>,
    ) -> Result<String, ChatError> {
        let expansion = self.expansion.expand(message, &self.settings).await;
        let body = match expansion.content() {
            Some(content) => augment_message(message, content),
            None => message.to_string(),
        };

        let request = CompletionRequest {
            instructions: self.instructions.clone(),
            history: window.to_vec(),
            body,
            settings: self.settings.clone(),
        };
        debug!(
            key = %key,
            history = request.history.len(),
            link = ?expansion.link(),
            "Requesting reply"
        );

        let completion = match self.completer.complete(&request).await {
            Ok(completion) => completion,
            Err(e) => {
                error!(key = %key, error = %e, "Completion failed");
                return Err(ChatError::new(format!("I've encountered an error: {e}"), e));
            }
        };

        window.append(ConversationTurn::assistant(completion.text.clone()));
        Ok(render_response(
            key,
            &completion.text,
            &completion.metadata,
            request.history.len(),
        ))
    }
}

#[async_trait]
impl ChatHandler for ChatOrchestrator {
    #[instrument(skip_all, fields(key = %key))]
    async fn chat(&self, key: &str, message: &str) -> Result<String, ChatError> {
        let shared = self.conversations.window(key).await;
        let mut window = shared.lock().await;
        window.append(ConversationTurn::user(message));

        match detect_directive(message) {
            Some(Directive::Reset) => {
                window.reset(self.conversations.capacity());
                info!("Conversation reset");
                Ok(RESET_REPLY.to_string())
            }
            Some(Directive::Help) => Ok(self
                .help
                .load()
                .await
                .unwrap_or_else(|| HELP_FALLBACK.to_string())),
            Some(Directive::Learn) => self.learn(key, &mut window).await,
            None => self.converse(key, message, &mut window).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::{ExpansionBudget, SUMMARIZER_INSTRUCTIONS};
    use crate::testing::{CharCounter, MockCompleter, MockFetcher, MockMemory};
    use parley_core::Role;

    struct Harness {
        fetcher: Arc<MockFetcher>,
        completer: Arc<MockCompleter>,
        orchestrator: ChatOrchestrator,
    }

    fn harness(capacity: usize, fetcher: MockFetcher, completer: MockCompleter) -> Harness {
        let fetcher = Arc::new(fetcher);
        let completer = Arc::new(completer);
        let expansion = ExpansionPipeline::new(
            fetcher.clone(),
            Arc::new(CharCounter),
            completer.clone(),
            ExpansionBudget {
                cutoff: 3276,
                shrink_factor: 0.7,
                minimum_viable_length: 1,
            },
        );
        let orchestrator = ChatOrchestrator::new(
            ConversationStore::new(capacity),
            expansion,
            completer.clone(),
            CompletionSettings::default(),
        )
        .with_instructions("You are a helpful bot.");
        Harness {
            fetcher,
            completer,
            orchestrator,
        }
    }

    fn simple(completer: MockCompleter) -> Harness {
        harness(5, MockFetcher::failing(), completer)
    }

    async fn history(orchestrator: &ChatOrchestrator, key: &str) -> Vec<ConversationTurn> {
        orchestrator.conversations().window(key).await.lock().await.to_vec()
    }

    #[tokio::test]
    async fn test_plain_message_round_trip() {
        let h = simple(MockCompleter::new().with_reply("Hello!"));
        let reply = h.orchestrator.chat("U1", "hi there").await.unwrap();

        assert_eq!(reply, "<@U1> Hello!\n\n> (contexts: 0, history: 1)");
        let requests = h.completer.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].instructions, "You are a helpful bot.");
        assert_eq!(requests[0].body, "hi there");
        assert_eq!(requests[0].history, vec![ConversationTurn::user("hi there")]);
        assert_eq!(
            history(&h.orchestrator, "U1").await,
            vec![ConversationTurn::user("hi there"), ConversationTurn::assistant("Hello!")]
        );
    }

    #[tokio::test]
    async fn test_references_are_rendered() {
        let h = simple(MockCompleter::new().with_reply("Yes.").with_titles(&["conversation with U7"]));
        let reply = h.orchestrator.chat("U1", "remember the wifi?").await.unwrap();
        assert!(reply.contains("*References:*\n> conversation with U7\n"));
        assert!(reply.ends_with("> (contexts: 1, history: 1)"));
    }

    #[tokio::test]
    async fn test_history_is_capped_by_window() {
        let h = harness(2, MockFetcher::failing(), MockCompleter::new().with_reply("r"));
        for message in ["one", "two", "three"] {
            h.orchestrator.chat("U1", message).await.unwrap();
        }
        let last = h.completer.requests().pop().unwrap();
        assert_eq!(
            last.history,
            vec![ConversationTurn::assistant("r"), ConversationTurn::user("three")]
        );
    }

    #[tokio::test]
    async fn test_reset_clears_before_any_work() {
        let h = harness(5, MockFetcher::page("<p>x</p>"), MockCompleter::new());
        h.orchestrator.chat("U1", "hello").await.unwrap();

        let reply = h.orchestrator.chat("U1", "reset").await.unwrap();
        assert_eq!(reply, RESET_REPLY);
        assert!(history(&h.orchestrator, "U1").await.is_empty());
        assert_eq!(h.completer.requests().len(), 1);
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_help_text_and_fallback() {
        let h = simple(MockCompleter::new());
        assert_eq!(h.orchestrator.chat("U1", "help").await.unwrap(), HELP_FALLBACK);

        let h = simple(MockCompleter::new());
        let orchestrator = h.orchestrator.with_help(HelpSource::Text("Ask me anything.".into()));
        assert_eq!(orchestrator.chat("U1", "HELP").await.unwrap(), "Ask me anything.");
        assert_eq!(history(&orchestrator, "U1").await, vec![ConversationTurn::user("HELP")]);
        assert!(h.completer.requests().is_empty());
    }

    #[tokio::test]
    async fn test_help_file_is_read_per_request() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("help.md"), "v1").unwrap();
        let help = HelpSource::from_setting(Some("file://help.md"), dir.path());
        let orchestrator = simple(MockCompleter::new()).orchestrator.with_help(help);

        assert_eq!(orchestrator.chat("U1", "help").await.unwrap(), "v1");
        std::fs::write(dir.path().join("help.md"), "v2").unwrap();
        assert_eq!(orchestrator.chat("U1", "help").await.unwrap(), "v2");
        std::fs::remove_file(dir.path().join("help.md")).unwrap();
        assert_eq!(orchestrator.chat("U1", "help").await.unwrap(), HELP_FALLBACK);
    }

    #[tokio::test]
    async fn test_learn_stores_transcript_and_resets() {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MockMemory::new());
        let h = simple(MockCompleter::new().with_reply("The code is 42."));
        let orchestrator = h
            .orchestrator
            .with_memory(memory.clone())
            .with_archive(TranscriptArchive::new(dir.path()));

        orchestrator.chat("U1", "what is the code?").await.unwrap();
        let reply = orchestrator.chat("U1", "Learn this: the code").await.unwrap();

        assert_eq!(
            reply,
            "Saved 3 items, I'll now wipe this exchange from my short term memory"
        );
        let ingested = memory.ingested();
        assert_eq!(ingested.len(), 1);
        let (transcript, label, sentence_mode) = &ingested[0];
        assert_eq!(
            transcript,
            "user: what is the code?\nassistant: The code is 42.\nuser: Learn this: the code\n"
        );
        assert_eq!(label, "conversation with U1");
        assert!(sentence_mode);
        assert!(history(&orchestrator, "U1").await.is_empty());

        let archived = std::fs::read_to_string(dir.path().join("conversation-with-U1")).unwrap();
        assert_eq!(archived, format!("===\n{transcript}"));
    }

    #[tokio::test]
    async fn test_learn_reports_archive_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let memory = Arc::new(MockMemory::new());
        let h = simple(MockCompleter::new().with_reply("ok"));
        let orchestrator = h
            .orchestrator
            .with_memory(memory.clone())
            .with_archive(TranscriptArchive::new(blocker.join("learn")));

        orchestrator.chat("U1", "port is 8080").await.unwrap();
        let reply = orchestrator.chat("U1", "learn this: port").await.unwrap();

        assert_eq!(
            reply,
            "Saved 3 items, but couldn't write the transcript file. \
             I'll now wipe this exchange from my short term memory"
        );
        assert_eq!(memory.ingested().len(), 1);
        assert!(history(&orchestrator, "U1").await.is_empty());
    }

    #[tokio::test]
    async fn test_learn_failure_keeps_history() {
        let h = simple(MockCompleter::new().with_reply("noted"));
        let orchestrator = h.orchestrator.with_memory(Arc::new(MockMemory::failing("index offline")));

        orchestrator.chat("U1", "the sky is blue").await.unwrap();
        let err = orchestrator.chat("U1", "learn this: sky").await.unwrap_err();

        assert!(err.reply.starts_with("something went wrong with my brain: "));
        assert!(err.reply.contains("index offline"));
        assert!(matches!(err.source, ParleyError::MemoryIngestFailed(_)));
        let kept = history(&orchestrator, "U1").await;
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0], ConversationTurn::user("the sky is blue"));
    }

    #[tokio::test]
    async fn test_learn_without_memory_is_reported() {
        let h = simple(MockCompleter::new());
        let err = h.orchestrator.chat("U1", "learn this: x").await.unwrap_err();
        assert!(matches!(err.source, ParleyError::MemoryIngestFailed(_)));
        assert_eq!(history(&h.orchestrator, "U1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_sends_original_message() {
        let h = simple(MockCompleter::new());
        let message = "check this out http://example.test/page";
        h.orchestrator.chat("U1", message).await.unwrap();

        let requests = h.completer.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, message);
        assert_eq!(h.fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_expanded_link_augments_body() {
        let h = harness(
            5,
            MockFetcher::page("<html><body><p>Rust 2.0 released</p></body></html>"),
            MockCompleter::new().with_reply("a summary"),
        );
        let message = "thoughts? https://news.test/rust";
        h.orchestrator.chat("U1", message).await.unwrap();

        let requests = h.completer.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].instructions, SUMMARIZER_INSTRUCTIONS);
        assert_eq!(
            requests[1].body,
            "thoughts? https://news.test/rust\nThe link mentioned earlier contains the following content:\na summary\n"
        );
        // The window keeps the raw message, not the augmented one.
        assert_eq!(requests[1].history, vec![ConversationTurn::user(message)]);
    }

    #[tokio::test]
    async fn test_completion_failure_keeps_user_turn_only() {
        let h = simple(MockCompleter::new().failing("rate limited"));
        let err = h.orchestrator.chat("U1", "hello").await.unwrap_err();

        assert!(err.reply.starts_with("I've encountered an error: "));
        assert!(err.reply.contains("rate limited"));
        assert!(matches!(err.source, ParleyError::CompletionFailed(_)));
        let kept = history(&h.orchestrator, "U1").await;
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_concurrent_messages_for_one_key_are_serialized() {
        let h = harness(50, MockFetcher::failing(), MockCompleter::new().with_reply("r"));
        let orchestrator = Arc::new(h.orchestrator);

        let mut tasks = Vec::new();
        for i in 0..10 {
            let orchestrator = Arc::clone(&orchestrator);
            tasks.push(tokio::spawn(async move {
                orchestrator.chat("shared", &format!("message {i}")).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let turns = history(&orchestrator, "shared").await;
        assert_eq!(turns.len(), 20);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
        }
    }

    #[test]
    fn test_help_source_from_setting() {
        let base = Path::new("/bots/demo");
        assert_eq!(HelpSource::from_setting(None, base), HelpSource::Missing);
        assert_eq!(HelpSource::from_setting(Some("  "), base), HelpSource::Missing);
        assert_eq!(
            HelpSource::from_setting(Some("file://help.md"), base),
            HelpSource::File(PathBuf::from("/bots/demo/help.md"))
        );
        assert_eq!(
            HelpSource::from_setting(Some("file:///etc/help.md"), base),
            HelpSource::File(PathBuf::from("/etc/help.md"))
        );
        assert_eq!(
            HelpSource::from_setting(Some("Just ask."), base),
            HelpSource::Text("Just ask.".into())
        );
    }
}
