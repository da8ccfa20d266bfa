//! mcp-echo binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mcp_echo::cli::{Cli, Commands};
use mcp_echo::config::EchoConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match EchoConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let result = match cli.command {
        Commands::Serve(args) => {
            if let Some(port) = args.port {
                config.port = port;
            }
            mcp_echo::server::serve(&config).await
        }
        Commands::Stdio => mcp_echo::server::serve_stdio(&config).await,
        Commands::Chat(args) => mcp_echo::cli::run_chat(args, &config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `DEBUG=1` selects the verbose filter.
fn init_tracing(config: &EchoConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
