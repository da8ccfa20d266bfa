//! Error types for mcp-echo.

pub mod unified;

pub use unified::ErrorCategory;

use thiserror::Error;

/// Primary error type for all mcp-echo operations.
#[derive(Error, Debug)]
pub enum EchoError {
    #[error("Invalid or missing session ID")]
    InvalidSession,

    #[error("Duplicate session ID: {0}")]
    DuplicateSession(String),

    #[error("Method not allowed: {0}")]
    MethodNotSupported(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution error in {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A JSON-RPC level failure carrying its wire error code.
    #[error("Protocol error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl EchoError {
    /// Create a JSON-RPC protocol error.
    pub fn protocol(code: i64, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool_execution(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSession
            | Self::InvalidArgument(_)
            | Self::Protocol { .. }
            | Self::Serialization(_) => ErrorCategory::Client,
            Self::MethodNotSupported(_) => ErrorCategory::MethodNotAllowed,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::ToolNotFound(_) | Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            Self::Network(_) | Self::Transport(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::DuplicateSession(_) | Self::Io(_) => ErrorCategory::Internal,
        }
    }

    /// HTTP status code this error maps to when surfaced by the endpoint.
    pub fn status_code(&self) -> u16 {
        self.category().status_code()
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EchoError>;
