//! mcp-echo: a Wikipedia tool server speaking MCP over streamable HTTP or stdio,
//! and a bounded-context tool-invocation loop that drives it.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use mcp_echo::prelude::*;
//!
//! # async fn example() -> mcp_echo::error::Result<()> {
//! let wiki = WikipediaClient::new("https://{lang}.wikipedia.org")?;
//! let tools = Arc::new(ToolRegistry::new().with_tools(wikipedia_tools(wiki)));
//! let mut conversation = Conversation::new(tools, Arc::new(ScriptedProvider::new()));
//! let answer = conversation.ask("인공지능이 뭐야?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod mcp;
pub mod prelude;
pub mod provider;
pub mod server;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
