//! MCP client exposing a remote server's tools as a [`ToolProvider`].

use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParams, CallToolResult, ClientInfo, Content, JsonObject, ResourceContents},
    service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceError, ServiceExt},
    transport::{StreamableHttpClientTransport, TokioChildProcess},
};
use tokio::process::Command;

use crate::error::{EchoError, Result};
use crate::tools::{ToolArguments, ToolDescriptor, ToolProvider};

type DynClientService = Box<dyn DynService<RoleClient>>;
pub type McpRunningService = RunningService<RoleClient, DynClientService>;

/// Tools living on an MCP server, reached over streamable HTTP or a child
/// process's stdio.
pub struct RemoteTools {
    endpoint: String,
    session: McpRunningService,
}

impl RemoteTools {
    /// Connect and run the initialize handshake against `url`.
    pub async fn connect(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let transport = StreamableHttpClientTransport::from_uri(url.clone());
        let session = ClientInfo::default()
            .into_dyn()
            .serve(transport)
            .await
            .map_err(map_client_initialize_error)?;

        tracing::info!(%url, "Connected to MCP server");
        Ok(Self {
            endpoint: url,
            session,
        })
    }

    /// Spawn `command` and run the initialize handshake over its stdin/stdout.
    pub async fn spawn(command: Command) -> Result<Self> {
        let endpoint = format!(
            "stdio:{}",
            command.as_std().get_program().to_string_lossy()
        );
        let transport = TokioChildProcess::new(command)?;
        let session = ClientInfo::default()
            .into_dyn()
            .serve(transport)
            .await
            .map_err(map_client_initialize_error)?;

        tracing::info!(%endpoint, "Spawned MCP server");
        Ok(Self { endpoint, session })
    }

    /// Server URL, or `stdio:<program>` for a spawned server.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Cancel the session; the server sees the session torn down.
    pub async fn close(self) -> Result<()> {
        self.session
            .cancel()
            .await
            .map(|reason| tracing::debug!(?reason, "MCP session closed"))
            .map_err(|e| EchoError::Transport(format!("MCP session shutdown failed: {e}")))
    }
}

impl std::fmt::Debug for RemoteTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTools")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl ToolProvider for RemoteTools {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let tools = match self.session.list_all_tools().await {
            Ok(tools) => tools,
            Err(ServiceError::UnexpectedResponse) => {
                self.session
                    .list_tools(None)
                    .await
                    .map_err(|e| map_service_error("list_tools", e))?
                    .tools
            }
            Err(e) => return Err(map_service_error("list_tools", e)),
        };
        Ok(tools.into_iter().map(map_tool_descriptor).collect())
    }

    async fn invoke(&self, name: &str, arguments: &ToolArguments) -> Result<String> {
        let arguments = coerce_tool_arguments(arguments.raw().clone())?;
        let result = self
            .session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| map_call_error(name, e))?;

        map_call_result(name, result)
    }
}

fn map_tool_descriptor(tool: rmcp::model::Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
    }
}

fn coerce_tool_arguments(value: serde_json::Value) -> Result<Option<JsonObject>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) if map.is_empty() => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        other => Err(EchoError::InvalidArgument(format!(
            "MCP tool arguments must be a JSON object; got {other}"
        ))),
    }
}

fn extract_text_content(content: &[Content]) -> String {
    let mut lines = Vec::new();
    for item in content {
        if let Some(text) = item.as_text() {
            lines.push(text.text.clone());
            continue;
        }
        if let Some(resource) = item.as_resource() {
            if let ResourceContents::TextResourceContents { text, .. } = &resource.resource {
                lines.push(text.clone());
            }
        }
    }
    lines.join("\n")
}

fn map_call_result(name: &str, result: CallToolResult) -> Result<String> {
    let text = extract_text_content(&result.content);

    if result.is_error.unwrap_or(false) {
        let message = if text.is_empty() {
            "MCP tool returned an error result".to_string()
        } else {
            text
        };
        return Err(EchoError::tool_execution(name, message));
    }
    Ok(text)
}

/// Unknown tools come back as invalid-params errors; everything else is a
/// failed execution.
fn map_call_error(name: &str, error: ServiceError) -> EchoError {
    match error {
        ServiceError::McpError(error) if error.code.0 == -32602 && error.message.contains("not found") => {
            EchoError::ToolNotFound(name.to_string())
        }
        ServiceError::McpError(error) => EchoError::tool_execution(
            name,
            format!("MCP error {}: {}", error.code.0, error.message),
        ),
        other => map_service_error("call_tool", other),
    }
}

fn map_client_initialize_error(error: ClientInitializeError) -> EchoError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            EchoError::Transport(format!("MCP initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => EchoError::Transport(
            format!("MCP initialize transport error ({context}): {error}"),
        ),
        ClientInitializeError::JsonRpcError(error) => EchoError::protocol(
            i64::from(error.code.0),
            format!("MCP initialize JSON-RPC error: {}", error.message),
        ),
        ClientInitializeError::Cancelled => {
            EchoError::Transport("MCP initialize cancelled".into())
        }
        other => EchoError::Transport(format!("MCP initialize error: {other}")),
    }
}

fn map_service_error(context: &str, error: ServiceError) -> EchoError {
    match error {
        ServiceError::McpError(error) => EchoError::protocol(
            i64::from(error.code.0),
            format!("{context}: {}", error.message),
        ),
        ServiceError::TransportSend(error) => {
            EchoError::Transport(format!("{context}: MCP transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            EchoError::Transport(format!("{context}: MCP transport closed"))
        }
        ServiceError::UnexpectedResponse => {
            EchoError::Transport(format!("{context}: unexpected MCP response"))
        }
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            EchoError::Transport(format!("{context}: MCP request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => EchoError::Timeout(timeout.as_millis() as u64),
        other => EchoError::Transport(format!("{context}: MCP service error: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn empty_arguments_are_omitted() {
        assert!(coerce_tool_arguments(json!({})).unwrap().is_none());
        assert!(coerce_tool_arguments(serde_json::Value::Null).unwrap().is_none());
        let args = coerce_tool_arguments(json!({"keyword": "rust"})).unwrap().unwrap();
        assert_eq!(args.get("keyword"), Some(&json!("rust")));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = coerce_tool_arguments(json!(["bad"])).unwrap_err();
        assert!(matches!(err, EchoError::InvalidArgument(_)));
    }

    #[test]
    fn tool_descriptor_copies_fields() {
        let mut schema = serde_json::Map::new();
        schema.insert("type".into(), json!("object"));
        let tool = rmcp::model::Tool::new("search", "Search Wikipedia", schema);

        let descriptor = map_tool_descriptor(tool);
        assert_eq!(descriptor.name, "search");
        assert_eq!(descriptor.description, "Search Wikipedia");
        assert_eq!(descriptor.input_schema["type"], "object");
    }

    #[test]
    fn text_content_is_joined_by_newlines() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "1. Rust" },
                { "type": "text", "text": "2. Rustacean" }
            ]
        }))
        .unwrap();
        assert_eq!(map_call_result("search", result).unwrap(), "1. Rust\n2. Rustacean");
    }

    #[test]
    fn error_result_maps_to_tool_execution() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{ "type": "text", "text": "upstream 503" }],
            "isError": true
        }))
        .unwrap();
        let err = map_call_result("summary", result).unwrap_err();
        assert!(matches!(
            err,
            EchoError::ToolExecution { tool_name, message }
            if tool_name == "summary" && message == "upstream 503"
        ));
    }

    #[test]
    fn unknown_tool_error_maps_to_not_found() {
        let error = ServiceError::McpError(rmcp::model::ErrorData::invalid_params(
            "Tool nope not found",
            None,
        ));
        assert!(matches!(map_call_error("nope", error), EchoError::ToolNotFound(n) if n == "nope"));
    }

    #[test]
    fn timeout_maps_to_timeout_error() {
        let err = map_service_error(
            "call_tool",
            ServiceError::Timeout {
                timeout: Duration::from_millis(2750),
            },
        );
        assert!(matches!(err, EchoError::Timeout(2750)));
    }

    #[test]
    fn initialize_jsonrpc_error_keeps_code() {
        let err = map_client_initialize_error(ClientInitializeError::JsonRpcError(
            rmcp::model::ErrorData::invalid_request("bad initialize payload", None),
        ));
        assert!(matches!(
            err,
            EchoError::Protocol { code: -32600, message } if message.contains("bad initialize payload")
        ));
    }
}
