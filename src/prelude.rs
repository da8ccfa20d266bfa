//! Convenience re-exports for common use.

pub use crate::agent::Conversation;
pub use crate::config::EchoConfig;
pub use crate::error::{EchoError, Result};
pub use crate::provider::{ReasoningProvider, ReasoningStep, ScriptedProvider, ToolRequest};
pub use crate::tools::{
    wikipedia_tools, AgentTool, AgentToolParameters, Tool, ToolArguments, ToolDescriptor,
    ToolProvider, ToolRegistry, WikipediaClient,
};
pub use crate::types::{Message, MessageKind, Role};
