//! MCP endpoints: streamable HTTP and stdio.

pub mod dispatch;
pub mod registry;
pub mod session;
pub mod stdio;
pub mod transport;

use std::net::{Ipv4Addr, SocketAddr};

use axum::routing::get;
use axum::Router;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::config::{EchoConfig, MCP_PATH};
use crate::error::Result;
use crate::mcp::ServerCatalog;
use crate::tools::WikipediaClient;

pub use dispatch::{AppState, SESSION_HEADER};
pub use registry::SessionRegistry;
pub use session::Session;
pub use stdio::{serve_lines, serve_stdio};
pub use transport::{uuid_generator, SessionIdGenerator, StreamTransport};

/// Build the router: `/mcp` by verb, 405 for other verbs, 404 elsewhere.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route(
            MCP_PATH,
            get(dispatch::open_stream)
                .post(dispatch::handle_message)
                .delete(dispatch::close_session)
                .fallback(dispatch::unsupported_method),
        )
        .fallback(dispatch::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the endpoint until Ctrl-C or SIGTERM, then close every session.
pub async fn serve(config: &EchoConfig) -> Result<()> {
    let wiki = WikipediaClient::new(config.wikipedia_base_url())?;
    let state = AppState::new(ServerCatalog::wikipedia(wiki));
    let registry = state.registry.clone();
    let app = build_app(state);

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        url = %format!("http://localhost:{}{MCP_PATH}", config.port),
        "Wikipedia MCP server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry.clone()))
        .await?;

    registry.close_all();
    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, after closing every session.
async fn shutdown_signal(registry: SessionRegistry) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
    registry.close_all();
}
