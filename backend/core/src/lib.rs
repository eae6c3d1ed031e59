pub mod error;
pub mod traits;
pub mod types;

pub use error::{ChatError, ParleyError};
pub use traits::{ChatHandler, CompletionService, LlmProvider, MemoryRecall, MemoryService};
pub use types::{
    ChatMessage, Completion, CompletionMetadata, CompletionRequest, CompletionSettings,
    ConversationTurn, LlmRequest, LlmResponse, RecalledMemory, Role,
};
