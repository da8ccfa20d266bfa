//! Tool system: definitions, the in-process registry and the Wikipedia tool set.

pub mod arguments;
pub mod registry;
pub mod tool;
pub mod types;
pub mod wikipedia;

pub use arguments::ToolArguments;
pub use registry::{ToolProvider, ToolRegistry};
pub use tool::{AgentTool, Tool};
pub use types::{AgentToolParameters, ToolDescriptor};
pub use wikipedia::{wikipedia_tools, WikiLang, WikipediaClient};
