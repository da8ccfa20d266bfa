//! Reasoning provider trait: decides the next step of a conversation.

pub mod scripted;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Message;

pub use scripted::ScriptedProvider;

/// A tool call requested by the reasoning provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl ToolRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Builder: add a string argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one reasoning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasoningStep {
    /// Run a tool, then ask again.
    ToolRequest(ToolRequest),
    /// Terminal answer for the current turn.
    Final { text: String },
}

/// Decides the next step from a windowed view of the conversation.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    async fn respond(&self, window: &[Message]) -> Result<ReasoningStep>;
}
