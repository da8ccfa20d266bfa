//! Line-delimited JSON-RPC over stdin/stdout, one session per process.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

use super::session::Session;
use super::transport::uuid_generator;
use crate::config::EchoConfig;
use crate::error::Result;
use crate::mcp::protocol::{JsonRpcError, JsonRpcNotification, JsonRpcResponse};
use crate::mcp::{Payload, ServerCatalog};
use crate::tools::WikipediaClient;

/// Serve the Wikipedia catalog on stdin/stdout until stdin closes.
///
/// Stdout carries protocol messages only; logs go to stderr.
pub async fn serve_stdio(config: &EchoConfig) -> Result<()> {
    let wiki = WikipediaClient::new(config.wikipedia_base_url())?;
    let catalog = Arc::new(ServerCatalog::wikipedia(wiki));
    tracing::info!("Wikipedia MCP server running on stdio");

    serve_lines(catalog, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Run one session over a line-oriented reader and writer.
///
/// Each input line is a message or a batch. Push events raised while a line
/// is handled are written before its reply.
pub async fn serve_lines<R, W>(catalog: Arc<ServerCatalog>, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let session = Session::new(catalog, uuid_generator());
    let mut events = session.transport().subscribe();
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }

                let reply = match Payload::parse(line.as_bytes()) {
                    Ok(payload) => session.handle(payload).await,
                    Err(error) => Err(error),
                };
                let reply = match reply {
                    Ok(body) => body,
                    Err(error) => {
                        tracing::warn!(%error, "Message rejected");
                        let failure = JsonRpcResponse::failure(None, JsonRpcError::from(&error));
                        Some(serde_json::to_value(failure)?)
                    }
                };

                drain_events(&mut events, &mut output).await?;
                if let Some(body) = reply {
                    write_line(&mut output, &body).await?;
                }
            }
            event = events.recv() => match event {
                Ok(notification) => write_line(&mut output, &notification).await?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Stdio push events dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.close();
    tracing::debug!("Stdin closed, session ended");
    Ok(())
}

async fn drain_events<W>(events: &mut Receiver<JsonRpcNotification>, output: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Ok(notification) = events.try_recv() {
        write_line(output, &notification).await?;
    }
    Ok(())
}

async fn write_line<W, T>(output: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    output.write_all(&bytes).await?;
    output.flush().await?;
    Ok(())
}
