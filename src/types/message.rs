//! Message types for the conversation history.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Legacy in-band prefix for a tool-use marker.
pub const TOOL_USE_PREFIX: &str = "tool_use:";

/// Legacy in-band prefix for a tool-result marker.
pub const TOOL_RESULT_PREFIX: &str = "tool_result:";

/// Conversation role.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// What a message records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Free text from the user or the final answer.
    Text,
    /// A tool was invoked; content is the tool name.
    ToolUse,
    /// A tool's textual output fed back into context.
    ToolResult,
}

/// A message in a conversation.
///
/// Role and kind are fixed by the constructor: tool-use markers are always
/// assistant messages and tool results are always user messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    role: Role,
    kind: MessageKind,
    content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            kind: MessageKind::Text,
            content: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            kind: MessageKind::Text,
            content: text.into(),
        }
    }

    /// Create a tool-use marker for `tool_name`. Arguments are not recorded.
    pub fn tool_use(tool_name: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            kind: MessageKind::ToolUse,
            content: tool_name.into(),
        }
    }

    /// Create a tool-result marker carrying the tool's output.
    pub fn tool_result(output: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            kind: MessageKind::ToolResult,
            content: output.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Raw content without any marker prefix.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_tool_use(&self) -> bool {
        self.kind == MessageKind::ToolUse
    }

    pub fn is_tool_result(&self) -> bool {
        self.kind == MessageKind::ToolResult
    }

    /// A user utterance, as opposed to a tool result delivered in the user role.
    pub fn is_user_text(&self) -> bool {
        self.role == Role::User && self.kind == MessageKind::Text
    }
}

/// Renders the in-band text form (`tool_use:<name>`, `tool_result:<text>`).
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MessageKind::Text => f.write_str(&self.content),
            MessageKind::ToolUse => write!(f, "{TOOL_USE_PREFIX}{}", self.content),
            MessageKind::ToolResult => write!(f, "{TOOL_RESULT_PREFIX}{}", self.content),
        }
    }
}
