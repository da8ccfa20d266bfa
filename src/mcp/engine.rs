//! Per-session MCP protocol engine.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use strum::{Display, EnumString};
use tokio::sync::{broadcast, Mutex};

use super::catalog::{ServerCatalog, SERVER_NAME, SERVER_VERSION};
use super::protocol::{
    negotiate_version, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, SERVER_ERROR,
};
use crate::error::{EchoError, Result};
use crate::tools::{ToolArguments, ToolProvider};

/// Capacity of a session's push-event channel. Slow subscribers skip ahead.
pub const PUSH_CHANNEL_CAPACITY: usize = 64;

/// Severity of a log notification, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

/// Sender half of a session's push-stream.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<JsonRpcNotification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(PUSH_CHANNEL_CAPACITY)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Push an event to every open stream. Events with no listener are dropped.
    pub fn send(&self, notification: JsonRpcNotification) {
        if self.tx.send(notification).is_err() {
            tracing::trace!("No open stream for push event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JsonRpcNotification> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[derive(Debug)]
struct EngineState {
    protocol_version: Option<&'static str>,
    client_name: Option<String>,
    log_level: LogLevel,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    #[serde(default)]
    protocol_version: Option<String>,
    #[serde(default)]
    client_info: Option<ClientInfo>,
}

#[derive(Deserialize)]
struct ClientInfo {
    name: String,
}

#[derive(Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

#[derive(Deserialize)]
struct ReadResourceParams {
    uri: String,
}

#[derive(Deserialize)]
struct SetLevelParams {
    level: LogLevel,
}

/// JSON-RPC handler for one session.
///
/// State sits behind an async mutex held for the whole exchange, so requests
/// on one session are answered one at a time.
#[derive(Debug)]
pub struct McpEngine {
    catalog: Arc<ServerCatalog>,
    notifier: Notifier,
    state: Mutex<EngineState>,
}

impl McpEngine {
    pub fn new(catalog: Arc<ServerCatalog>, notifier: Notifier) -> Self {
        Self {
            catalog,
            notifier,
            state: Mutex::new(EngineState {
                protocol_version: None,
                client_name: None,
                log_level: LogLevel::Info,
            }),
        }
    }

    /// Handle one incoming message. Only requests produce a reply.
    pub async fn handle(&self, message: IncomingMessage) -> Option<JsonRpcResponse> {
        match message {
            IncomingMessage::Request(request) => Some(self.handle_request(request).await),
            IncomingMessage::Notification(notification) => {
                tracing::debug!(method = %notification.method, "Notification received");
                None
            }
            IncomingMessage::Response(response) => {
                tracing::debug!(id = ?response.id, "Ignoring client response");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        tracing::debug!(%method, ?id, "Request received");

        match self.dispatch(&method, params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                tracing::debug!(%method, %error, "Request failed");
                JsonRpcResponse::failure(Some(id), JsonRpcError::from(&error))
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let mut state = self.state.lock().await;

        if method == "initialize" {
            return self.initialize(&mut state, params);
        }
        if state.protocol_version.is_none() {
            return Err(EchoError::protocol(
                SERVER_ERROR,
                "Bad Request: Server not initialized",
            ));
        }

        match method {
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.catalog.tools().descriptors() })),
            "tools/call" => self.call_tool(&state, parse_params(params)?).await,
            "resources/list" => Ok(json!({ "resources": [] })),
            "resources/templates/list" => {
                Ok(json!({ "resourceTemplates": self.catalog.resource_templates() }))
            }
            "resources/read" => {
                let params: ReadResourceParams = parse_params(params)?;
                self.catalog.read_resource(&params.uri).await
            }
            "prompts/list" => Ok(json!({ "prompts": self.catalog.prompts() })),
            "prompts/get" => {
                let params: GetPromptParams = parse_params(params)?;
                self.catalog.render_prompt(&params.name, &params.arguments)
            }
            "logging/setLevel" => {
                let params: SetLevelParams = parse_params(params)?;
                state.log_level = params.level;
                Ok(json!({}))
            }
            other => Err(EchoError::protocol(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }

    fn initialize(&self, state: &mut EngineState, params: Option<Value>) -> Result<Value> {
        if state.protocol_version.is_some() {
            return Err(EchoError::protocol(
                INVALID_REQUEST,
                "Invalid Request: Server already initialized",
            ));
        }
        let params: InitializeParams = parse_params(params)?;
        let version = negotiate_version(params.protocol_version.as_deref());

        state.protocol_version = Some(version);
        state.client_name = params.client_info.map(|info| info.name);
        tracing::info!(
            protocol_version = version,
            client = state.client_name.as_deref().unwrap_or("unknown"),
            "Session initialized"
        );

        Ok(json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": false },
                "prompts": { "listChanged": false },
                "logging": {}
            },
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION }
        }))
    }

    async fn call_tool(&self, state: &EngineState, params: CallToolParams) -> Result<Value> {
        let tools = self.catalog.tools();
        if tools.get(&params.name).is_none() {
            return Err(EchoError::protocol(
                INVALID_PARAMS,
                format!("Tool {} not found", params.name),
            ));
        }

        self.log(state, LogLevel::Info, "tools", format!("Calling tool {}", params.name));

        let arguments = ToolArguments::new(params.arguments.unwrap_or_else(|| json!({})));
        match tools.invoke(&params.name, &arguments).await {
            Ok(text) => Ok(json!({
                "content": [{ "type": "text", "text": text }]
            })),
            Err(error) => {
                tracing::warn!(tool = %params.name, %error, "Tool call failed");
                Ok(json!({
                    "content": [{ "type": "text", "text": error.to_string() }],
                    "isError": true
                }))
            }
        }
    }

    /// Push a `notifications/message` event if the session's level allows it.
    fn log(&self, state: &EngineState, level: LogLevel, logger: &str, data: String) {
        if level < state.log_level {
            return;
        }
        self.notifier.send(JsonRpcNotification::new(
            "notifications/message",
            json!({ "level": level.to_string(), "logger": logger, "data": data }),
        ));
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T> {
    serde_json::from_value(params.unwrap_or_else(|| json!({})))
        .map_err(|e| EchoError::protocol(INVALID_PARAMS, format!("Invalid params: {e}")))
}
