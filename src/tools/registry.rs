//! Tool providers: the seam the conversation loop and protocol engine call through.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::tool::Tool;
use super::types::ToolDescriptor;
use crate::error::{EchoError, Result};

/// Something that can list and execute named tools.
///
/// Failures are either [`EchoError::ToolNotFound`] or
/// [`EchoError::ToolExecution`].
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// List available tools.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Execute a tool by name and return its textual output.
    async fn invoke(&self, name: &str, arguments: &ToolArguments) -> Result<String>;
}

/// In-process tool provider. Listing order is registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a tool. On duplicate names the first registration wins.
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Register many boxed tools.
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Box<dyn Tool>>) -> Self {
        self.tools.extend(tools.into_iter().map(Arc::from));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|tool| tool.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|tool| tool.name()))
            .finish()
    }
}

#[async_trait]
impl ToolProvider for ToolRegistry {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(self.descriptors())
    }

    async fn invoke(&self, name: &str, arguments: &ToolArguments) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| EchoError::ToolNotFound(name.to_string()))?;

        tool.execute(arguments).await.map_err(|error| match error {
            EchoError::ToolExecution { .. } => error,
            other => EchoError::tool_execution(name, other.to_string()),
        })
    }
}
