//! Bounded-context tool-invocation loop.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::error::Result;
use crate::provider::{ReasoningProvider, ReasoningStep};
use crate::tools::{ToolArguments, ToolProvider};
use crate::types::Message;

/// Default number of most-recent messages shown to the reasoning provider.
pub const DEFAULT_WINDOW_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

/// A multi-turn conversation that alternates reasoning steps and tool calls.
///
/// The full history is kept unbounded; only the most recent
/// `window_size` messages are passed to the reasoning provider.
pub struct Conversation {
    messages: Vec<Message>,
    window_size: NonZeroUsize,
    tools: Arc<dyn ToolProvider>,
    reasoning: Arc<dyn ReasoningProvider>,
}

impl Conversation {
    pub fn new(tools: Arc<dyn ToolProvider>, reasoning: Arc<dyn ReasoningProvider>) -> Self {
        Self {
            messages: Vec::new(),
            window_size: DEFAULT_WINDOW_SIZE,
            tools,
            reasoning,
        }
    }

    /// Builder: set the initial window size.
    pub fn with_window_size(mut self, size: NonZeroUsize) -> Self {
        self.window_size = size;
        self
    }

    /// Change the window size. History is untouched.
    pub fn set_window_size(&mut self, size: NonZeroUsize) {
        self.window_size = size;
    }

    pub fn window_size(&self) -> NonZeroUsize {
        self.window_size
    }

    /// Forget all messages. The window size is kept.
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Every message, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent `min(window_size, len)` messages, in order.
    pub fn window(&self) -> &[Message] {
        let start = self.messages.len().saturating_sub(self.window_size.get());
        &self.messages[start..]
    }

    /// Run one user turn to completion and return the final answer.
    ///
    /// Errors from either provider end the turn; messages appended before the
    /// failure stay in the history.
    pub async fn ask(&mut self, utterance: impl Into<String>) -> Result<String> {
        self.messages.push(Message::user(utterance));

        let mut step = 0usize;
        loop {
            step += 1;
            tracing::debug!(step, window = self.window().len(), "Reasoning step");

            match self.reasoning.respond(self.window()).await? {
                ReasoningStep::Final { text } => {
                    tracing::debug!(step, "Final answer");
                    self.messages.push(Message::assistant(text.clone()));
                    return Ok(text);
                }
                ReasoningStep::ToolRequest(request) => {
                    tracing::debug!(step, tool = %request.name, arguments = ?request.arguments, "Tool requested");
                    self.messages.push(Message::tool_use(&request.name));

                    let output = self
                        .tools
                        .invoke(&request.name, &ToolArguments::from(request.arguments))
                        .await?;
                    tracing::debug!(step, tool = %request.name, output_len = output.len(), "Tool result");

                    self.messages.push(Message::tool_result(output));
                }
            }
        }
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("messages", &self.messages.len())
            .field("window_size", &self.window_size)
            .finish()
    }
}
