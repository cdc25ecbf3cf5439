//! Agent: conversation log, system prompt, and the tool-orchestration loop.

pub mod agent;
pub mod conversation;
pub mod prompt;

pub use agent::{Agent, LoopSettings, TurnReply, GROUNDING_INSTRUCTION};
pub use conversation::Conversation;
pub use prompt::PromptBuilder;
