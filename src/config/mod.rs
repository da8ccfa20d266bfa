//! Process configuration (layered: code > env > `.env` file > defaults).

use bon::Builder;

use crate::error::{EchoError, Result};

/// Default listening port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

/// Path the endpoint is mounted on.
pub const MCP_PATH: &str = "/mcp";

/// Default Wikipedia host template; `{lang}` is replaced per request.
pub const DEFAULT_WIKIPEDIA_BASE_URL: &str = "https://{lang}.wikipedia.org";

/// Configuration for both the endpoint and the chat client.
///
/// Resolution order:
/// 1. Explicit values from the builder (or CLI flags)
/// 2. Environment variables (`PORT`, `DEBUG`, `MCP_SERVER_URL`, `WIKIPEDIA_BASE_URL`)
/// 3. Defaults
#[derive(Debug, Clone, Builder)]
pub struct EchoConfig {
    #[builder(default = DEFAULT_PORT)]
    pub port: u16,
    #[builder(default)]
    pub debug: bool,
    pub server_url: Option<String>,
    pub wikipedia_base_url: Option<String>,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EchoConfig {
    /// Load from environment variables, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // .env is optional
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                EchoError::Configuration(format!("PORT must be a port number, got {raw:?}: {e}"))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            debug: lookup("DEBUG").is_some_and(|v| v.trim() == "1"),
            server_url: lookup("MCP_SERVER_URL").filter(|v| !v.trim().is_empty()),
            wikipedia_base_url: lookup("WIKIPEDIA_BASE_URL").filter(|v| !v.trim().is_empty()),
        })
    }

    /// URL the chat client connects to.
    pub fn server_url(&self) -> String {
        self.server_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}{MCP_PATH}", self.port))
    }

    /// Wikipedia host template.
    pub fn wikipedia_base_url(&self) -> &str {
        self.wikipedia_base_url
            .as_deref()
            .unwrap_or(DEFAULT_WIKIPEDIA_BASE_URL)
    }

    /// Default tracing filter directive for this configuration.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "mcp_echo=debug,tower_http=debug,info"
        } else {
            "mcp_echo=info,warn"
        }
    }
}
