//! Error classification shared by the endpoint and the client loop.

/// Broad error category for routing status codes and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    NotFound,
    MethodNotAllowed,
    ToolExecution,
    Network,
    Timeout,
    Configuration,
    Internal,
}

impl ErrorCategory {
    /// HTTP status for this category.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Client => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::Timeout => 504,
            Self::Network => 502,
            Self::ToolExecution | Self::Configuration | Self::Internal => 500,
        }
    }

    /// Whether the caller, rather than the server, is at fault.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::Client | Self::NotFound | Self::MethodNotAllowed
        )
    }
}
