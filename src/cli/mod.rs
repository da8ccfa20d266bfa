//! Command-line surface: `serve`, `stdio` and `chat`.

pub mod shell;

use std::num::NonZeroUsize;

use clap::{Parser, Subcommand};

#[cfg(feature = "mcp-client")]
pub use shell::chat_remote;
pub use shell::{chat_with, run_chat, run_shell, ShellCommand};

/// Wikipedia MCP server and tool-loop chat client
#[derive(Parser, Debug)]
#[command(name = "mcp-echo", version, about = "Wikipedia MCP server and tool-loop chat client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the streamable-HTTP MCP endpoint
    Serve(ServeArgs),
    /// Serve MCP over stdin/stdout
    Stdio,
    /// Interactive conversation driven through the Wikipedia tools
    Chat(ChatArgs),
}

/// Arguments for `mcp-echo serve`.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for `mcp-echo chat`.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// MCP endpoint URL (overrides MCP_SERVER_URL)
    #[arg(long, conflicts_with_all = ["local", "stdio"])]
    pub server: Option<String>,

    /// Run the tools in-process instead of over MCP
    #[arg(long, conflicts_with = "stdio")]
    pub local: bool,

    /// Spawn `mcp-echo stdio` as a child process and talk MCP over its pipes
    #[arg(long)]
    pub stdio: bool,

    /// Number of recent messages shown to the reasoning step
    #[arg(short, long, value_parser = parse_window)]
    pub window: Option<NonZeroUsize>,
}

fn parse_window(raw: &str) -> Result<NonZeroUsize, String> {
    raw.trim()
        .parse::<NonZeroUsize>()
        .map_err(|_| format!("window must be a positive integer, got {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_with_port() {
        let cli = Cli::try_parse_from(["mcp-echo", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.port, Some(8080)),
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn parse_chat_with_defaults() {
        let cli = Cli::try_parse_from(["mcp-echo", "chat"]).unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert!(args.server.is_none());
                assert!(!args.local);
                assert!(!args.stdio);
                assert!(args.window.is_none());
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn parse_chat_local_with_window() {
        let cli = Cli::try_parse_from(["mcp-echo", "chat", "--local", "-w", "4"]).unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert!(args.local);
                assert_eq!(args.window.map(NonZeroUsize::get), Some(4));
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(Cli::try_parse_from(["mcp-echo", "chat", "--window", "0"]).is_err());
    }

    #[test]
    fn parse_stdio_and_chat_over_stdio() {
        let cli = Cli::try_parse_from(["mcp-echo", "stdio"]).unwrap();
        assert!(matches!(cli.command, Commands::Stdio));

        let cli = Cli::try_parse_from(["mcp-echo", "chat", "--stdio"]).unwrap();
        match cli.command {
            Commands::Chat(args) => assert!(args.stdio && !args.local),
            other => panic!("expected Chat, got {other:?}"),
        }
        assert!(Cli::try_parse_from(["mcp-echo", "chat", "--stdio", "--local"]).is_err());
    }

    #[test]
    fn server_conflicts_with_local() {
        let result = Cli::try_parse_from([
            "mcp-echo",
            "chat",
            "--local",
            "--server",
            "http://localhost:3000/mcp",
        ]);
        assert!(result.is_err());
    }
}
