//! Model Context Protocol: wire types, the per-session engine and a client.

pub mod catalog;
#[cfg(feature = "mcp-client")]
pub mod client;
pub mod engine;
pub mod protocol;

pub use catalog::ServerCatalog;
#[cfg(feature = "mcp-client")]
pub use client::RemoteTools;
pub use engine::{LogLevel, McpEngine, Notifier};
pub use protocol::{IncomingMessage, JsonRpcResponse, Payload};
