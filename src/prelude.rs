//! Convenience re-exports for common use.

pub use crate::agent::{Agent, Conversation, LoopSettings, PromptBuilder, TurnReply};
pub use crate::assistant::{Assistant, AskReply};
pub use crate::config::DocentConfig;
pub use crate::error::{DocentError, Result};
pub use crate::provider::{AzureOpenAiProvider, ModelProvider, OpenAiProvider};
pub use crate::session::{SessionStore, Sweeper};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolOutput, ToolRegistry, TypedTool};
pub use crate::types::{FinishReason, GenerationSettings, HistoryEntry, ModelMessage, Role};
