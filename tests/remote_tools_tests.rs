//! The rmcp-based client against a live endpoint on a loopback port.

#![cfg(feature = "mcp-client")]

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::time::timeout;

use mcp_echo::error::EchoError;
use mcp_echo::mcp::RemoteTools;
use mcp_echo::server::{build_app, AppState};
use mcp_echo::tools::{ToolArguments, ToolProvider};

mod common;
use common::test_state;

async fn spawn_endpoint(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_app(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/mcp")
}

#[tokio::test]
async fn remote_tools_list_and_invoke() {
    let state = test_state();
    let url = spawn_endpoint(state.clone()).await;

    let remote = timeout(Duration::from_secs(5), RemoteTools::connect(url))
        .await
        .expect("connect in time")
        .unwrap();
    assert_eq!(state.registry.len(), 1);

    let tools = remote.list_tools().await.unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["echo"]);

    let out = remote
        .invoke("echo", &ToolArguments::new(serde_json::json!({"text": "ping"})))
        .await
        .unwrap();
    assert_eq!(out, "ping");

    let err = remote
        .invoke("missing", &ToolArguments::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, EchoError::ToolNotFound(name) if name == "missing"));

    let err = remote
        .invoke("echo", &ToolArguments::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, EchoError::ToolExecution { .. }));

    remote.close().await.unwrap();
}

/// Writer whose every write fails, standing in for a broken terminal.
#[cfg(feature = "cli")]
struct BrokenTerminal;

#[cfg(feature = "cli")]
impl std::io::Write for BrokenTerminal {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "terminal gone"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(feature = "cli")]
async fn wait_until_empty(state: &AppState) {
    timeout(Duration::from_secs(5), async {
        while !state.registry.is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("server session released");
}

#[cfg(feature = "cli")]
#[tokio::test]
async fn chat_releases_the_server_session_on_every_exit_path() {
    use mcp_echo::cli::chat_remote;

    let state = test_state();
    let url = spawn_endpoint(state.clone()).await;

    let remote = RemoteTools::connect(url.clone()).await.unwrap();
    let mut out = Vec::new();
    chat_remote(remote, None, "/exit\n".as_bytes(), &mut out)
        .await
        .unwrap();
    assert!(String::from_utf8(out).unwrap().starts_with("Connected. 1 tools: echo"));
    wait_until_empty(&state).await;

    let remote = RemoteTools::connect(url).await.unwrap();
    assert_eq!(state.registry.len(), 1);
    let err = chat_remote(remote, None, "/exit\n".as_bytes(), &mut BrokenTerminal)
        .await
        .unwrap_err();
    assert!(matches!(err, EchoError::Io(_)));
    wait_until_empty(&state).await;
}

#[cfg(feature = "cli")]
#[tokio::test]
async fn spawned_stdio_server_lists_wikipedia_tools() {
    let mut command = tokio::process::Command::new(env!("CARGO_BIN_EXE_mcp-echo"));
    command.arg("stdio").env("RUST_LOG", "warn");

    let remote = timeout(Duration::from_secs(10), RemoteTools::spawn(command))
        .await
        .expect("child answers initialize")
        .unwrap();
    assert!(remote.endpoint().starts_with("stdio:"));

    let names: Vec<_> = remote
        .list_tools()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, ["search", "summary", "extract", "on_this_day"]);

    let err = remote
        .invoke("missing", &ToolArguments::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, EchoError::ToolNotFound(_)));

    remote.close().await.unwrap();
}
