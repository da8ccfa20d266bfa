//! Core types for mcp-echo.

pub mod message;

pub use message::*;
