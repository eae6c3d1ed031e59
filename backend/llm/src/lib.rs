pub mod completion;
pub mod providers;

pub use completion::{build_messages, ChatCompleter, DEFAULT_COMPLETION_TIMEOUT};
pub use providers::mock::MockProvider;
pub use providers::ollama::OllamaProvider;
pub use providers::openai::OpenAiProvider;
pub use providers::ProviderRegistry;
