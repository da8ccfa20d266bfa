//! Shared test helpers: an endpoint wired to in-process tools.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use mcp_echo::error::EchoError;
use mcp_echo::mcp::ServerCatalog;
use mcp_echo::server::{self, AppState, SESSION_HEADER};
use mcp_echo::tools::{AgentTool, AgentToolParameters, ToolArguments, ToolRegistry, WikipediaClient};

pub const MCP: &str = "/mcp";

/// Registry with an `echo` tool that needs no network.
pub fn echo_registry() -> ToolRegistry {
    ToolRegistry::new().with_tool(AgentTool::new(
        "echo",
        "Echo the text argument",
        AgentToolParameters::object()
            .string("text", "Text to echo", true)
            .build(),
        |args: ToolArguments| async move {
            Ok::<_, EchoError>(args.get_str("text")?.to_string())
        },
    ))
}

/// State whose Wikipedia client points at a closed port.
pub fn test_state() -> AppState {
    let wiki = WikipediaClient::new("http://127.0.0.1:9").unwrap();
    AppState::new(ServerCatalog::with_tools(echo_registry(), wiki))
}

pub fn test_app(state: AppState) -> Router {
    server::build_app(state)
}

pub fn initialize_body(id: i64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0.0" }
        }
    })
}

/// `tools/call` of the in-process `echo` tool.
pub fn echo_call(id: i64, text: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": "echo", "arguments": { "text": text } }
    })
}

pub fn post(session: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::post(MCP)
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(session: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(MCP).header("accept", "text/event-stream");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete(session: Option<&str>) -> Request<Body> {
    let mut builder = Request::delete(MCP);
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Run the initializing exchange and return the assigned session id.
pub async fn initialize(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post(None, &initialize_body(1)))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    response
        .headers()
        .get(SESSION_HEADER)
        .expect("initialize response carries a session id")
        .to_str()
        .unwrap()
        .to_string()
}
