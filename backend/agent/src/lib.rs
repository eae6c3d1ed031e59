//! Parley conversation core
//!
//! Rolling per-conversation history, link expansion with adaptive
//! truncation and summarization, and the orchestrator that ties them to
//! completion and long-term memory.

pub mod directive;
pub mod expand;
pub mod orchestrator;
pub mod render;
pub mod shrink;
pub mod store;
pub mod window;

#[cfg(test)]
mod testing;

pub use directive::{detect_directive, Directive};
pub use expand::{Expansion, ExpansionBudget, ExpansionPipeline};
pub use orchestrator::{ChatOrchestrator, HelpSource};
pub use render::render_response;
pub use shrink::{shrink_until_fits, ShrinkError};
pub use store::ConversationStore;
pub use window::{RollingWindow, DEFAULT_CAPACITY};
