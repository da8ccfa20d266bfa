//! JSON-RPC 2.0 wire types used by the MCP endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EchoError;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
/// Transport-level rejection (uninitialized session, malformed exchange).
pub const SERVER_ERROR: i64 = -32000;

/// Protocol revisions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];
pub const LATEST_PROTOCOL_VERSION: &str = SUPPORTED_PROTOCOL_VERSIONS[0];

/// Request identifier: a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: Some(params),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<&EchoError> for JsonRpcError {
    fn from(error: &EchoError) -> Self {
        match error {
            EchoError::Protocol { code, message } => Self::new(*code, message.clone()),
            EchoError::InvalidArgument(message) => Self::new(INVALID_PARAMS, message.clone()),
            EchoError::ToolNotFound(name) => {
                Self::new(INVALID_PARAMS, format!("Tool {name} not found"))
            }
            EchoError::Serialization(e) => Self::new(INVALID_PARAMS, e.to_string()),
            other if other.category().is_client_error() => {
                Self::new(SERVER_ERROR, other.to_string())
            }
            other => Self::new(INTERNAL_ERROR, other.to_string()),
        }
    }
}

/// A reply to a request. Exactly one of `result` or `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Error reply; `id` is `None` when the request could not be identified.
    pub fn failure(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Any message a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    Response(JsonRpcResponse),
}

impl IncomingMessage {
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) => None,
        }
    }

    pub fn is_initialize(&self) -> bool {
        matches!(self, Self::Request(r) if r.method == "initialize")
    }

    fn jsonrpc(&self) -> &str {
        match self {
            Self::Request(r) => &r.jsonrpc,
            Self::Notification(n) => &n.jsonrpc,
            Self::Response(r) => &r.jsonrpc,
        }
    }
}

/// A POST body: one message or a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Single(IncomingMessage),
    Batch(Vec<IncomingMessage>),
}

impl Payload {
    /// Parse a request body, distinguishing malformed JSON from malformed
    /// JSON-RPC.
    pub fn parse(body: &[u8]) -> Result<Self, EchoError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| EchoError::protocol(PARSE_ERROR, format!("Parse error: {e}")))?;

        let payload = match value {
            Value::Array(items) => Self::Batch(
                items
                    .into_iter()
                    .map(parse_message)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            other => Self::Single(parse_message(other)?),
        };

        if payload.messages().iter().any(|m| m.jsonrpc() != JSONRPC_VERSION) {
            return Err(EchoError::protocol(
                INVALID_REQUEST,
                "Invalid Request: jsonrpc must be \"2.0\"",
            ));
        }
        Ok(payload)
    }

    pub fn messages(&self) -> &[IncomingMessage] {
        match self {
            Self::Single(message) => std::slice::from_ref(message),
            Self::Batch(messages) => messages,
        }
    }

    pub fn into_messages(self) -> Vec<IncomingMessage> {
        match self {
            Self::Single(message) => vec![message],
            Self::Batch(messages) => messages,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }
}

/// Classify one message. Anything carrying both `id` and `method` must be a
/// well-formed request, and a response must carry `result` or `error`.
fn parse_message(value: Value) -> Result<IncomingMessage, EchoError> {
    let invalid = |detail: String| {
        EchoError::protocol(INVALID_REQUEST, format!("Invalid Request: {detail}"))
    };

    if value.get("id").is_some() && value.get("method").is_some() {
        return serde_json::from_value(value)
            .map(IncomingMessage::Request)
            .map_err(|e| invalid(e.to_string()));
    }

    let message = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
    if let IncomingMessage::Response(response) = &message {
        if response.result.is_none() && response.error.is_none() {
            return Err(invalid("response carries neither result nor error".into()));
        }
    }
    Ok(message)
}

/// Negotiate a protocol version: the client's if supported, else the latest.
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v))
        .copied()
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn classifies_requests_notifications_and_responses() {
        let payload = Payload::parse(
            br#"[
                {"jsonrpc":"2.0","id":1,"method":"ping"},
                {"jsonrpc":"2.0","method":"notifications/initialized"},
                {"jsonrpc":"2.0","id":"a","result":{}}
            ]"#,
        )
        .unwrap();

        let messages = payload.messages();
        assert!(payload.is_batch());
        assert!(matches!(messages[0], IncomingMessage::Request(_)));
        assert!(matches!(messages[1], IncomingMessage::Notification(_)));
        assert!(matches!(messages[2], IncomingMessage::Response(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Payload::parse(b"{not json").unwrap_err();
        assert!(matches!(err, EchoError::Protocol { code: PARSE_ERROR, .. }));
    }

    #[test]
    fn non_jsonrpc_object_is_invalid_request() {
        let err = Payload::parse(br#"{"hello":"world"}"#).unwrap_err();
        assert!(matches!(err, EchoError::Protocol { code: INVALID_REQUEST, .. }));

        let err = Payload::parse(br#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#).unwrap_err();
        assert!(matches!(err, EchoError::Protocol { code: INVALID_REQUEST, .. }));
    }

    #[test]
    fn request_with_unusable_id_is_invalid_request() {
        for body in [
            r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":18446744073709551615,"method":"ping"}"#,
        ] {
            let err = Payload::parse(body.as_bytes()).unwrap_err();
            assert!(
                matches!(err, EchoError::Protocol { code: INVALID_REQUEST, .. }),
                "{body}"
            );
        }
    }

    #[test]
    fn bare_id_is_not_a_response() {
        let err = Payload::parse(br#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
        assert!(matches!(err, EchoError::Protocol { code: INVALID_REQUEST, .. }));

        let payload = Payload::parse(
            br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32000,"message":"x"}}"#,
        )
        .unwrap();
        assert!(matches!(payload.messages()[0], IncomingMessage::Response(_)));
    }

    #[test]
    fn failure_serializes_null_id() {
        let response =
            JsonRpcResponse::failure(None, JsonRpcError::new(SERVER_ERROR, "Bad Request"));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"jsonrpc":"2.0","id":null,"error":{"code":-32000,"message":"Bad Request"}})
        );
    }

    #[test]
    fn version_negotiation_prefers_client_when_supported() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_version(Some("1999-01-01")), LATEST_PROTOCOL_VERSION);
        assert_eq!(negotiate_version(None), LATEST_PROTOCOL_VERSION);
    }
}
