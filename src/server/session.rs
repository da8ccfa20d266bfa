//! A session: one client's transport binding plus its protocol engine.

use std::sync::Arc;

use serde_json::Value;

use super::transport::{SessionIdGenerator, StreamTransport};
use crate::error::{EchoError, Result};
use crate::mcp::protocol::{INVALID_REQUEST, SERVER_ERROR};
use crate::mcp::{McpEngine, Payload, ServerCatalog};

#[derive(Debug)]
pub struct Session {
    transport: StreamTransport,
    engine: McpEngine,
}

impl Session {
    pub fn new(catalog: Arc<ServerCatalog>, generator: SessionIdGenerator) -> Self {
        let transport = StreamTransport::new(generator);
        let engine = McpEngine::new(catalog, transport.notifier().clone());
        Self { transport, engine }
    }

    /// Identifier, once the initializing exchange has assigned one.
    pub fn id(&self) -> Option<&str> {
        self.transport.session_id()
    }

    pub fn transport(&self) -> &StreamTransport {
        &self.transport
    }

    pub fn close(&self) {
        self.transport.close();
    }

    /// Run a POSTed payload through the engine.
    ///
    /// Returns the JSON reply body, or `None` when the payload held no
    /// requests. A successful `initialize` assigns the session identifier.
    pub async fn handle(&self, payload: Payload) -> Result<Option<Value>> {
        let batch = payload.is_batch();
        let messages = payload.into_messages();
        if messages.is_empty() {
            return Err(EchoError::protocol(INVALID_REQUEST, "Invalid Request: empty batch"));
        }

        let initializing = messages.iter().any(|m| m.is_initialize());
        if initializing {
            if messages.len() > 1 {
                return Err(EchoError::protocol(
                    INVALID_REQUEST,
                    "Invalid Request: Only one initialization request is allowed",
                ));
            }
            if self.id().is_some() {
                return Err(EchoError::protocol(
                    INVALID_REQUEST,
                    "Invalid Request: Server already initialized",
                ));
            }
        } else if self.id().is_none() {
            return Err(EchoError::protocol(
                SERVER_ERROR,
                "Bad Request: Server not initialized",
            ));
        }

        let mut replies = Vec::new();
        for message in messages {
            if let Some(reply) = self.engine.handle(message).await {
                replies.push(reply);
            }
        }

        if initializing && replies.iter().all(|r| !r.is_error()) {
            let id = self.transport.assign_id();
            tracing::debug!(session_id = %id, "Session id assigned");
        }

        let body = match replies.len() {
            0 => None,
            1 if !batch => replies.pop().map(serde_json::to_value).transpose()?,
            _ => Some(serde_json::to_value(replies)?),
        };
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::transport::uuid_generator;
    use crate::tools::WikipediaClient;

    fn session() -> Session {
        let wiki = WikipediaClient::new("http://127.0.0.1:9").unwrap();
        Session::new(Arc::new(ServerCatalog::wikipedia(wiki)), uuid_generator())
    }

    fn payload(json: &str) -> Payload {
        Payload::parse(json.as_bytes()).unwrap()
    }

    const INIT: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#;

    #[tokio::test]
    async fn initialize_assigns_id() {
        let session = session();
        let body = session.handle(payload(INIT)).await.unwrap().unwrap();
        assert_eq!(body["id"], 1);
        assert!(session.id().is_some());
    }

    #[tokio::test]
    async fn non_initialize_on_new_session_is_rejected() {
        let session = session();
        let err = session
            .handle(payload(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, EchoError::Protocol { code: SERVER_ERROR, .. }));
        assert!(session.id().is_none());
    }

    #[tokio::test]
    async fn initialize_must_be_alone() {
        let session = session();
        let batch = format!(r#"[{INIT},{{"jsonrpc":"2.0","id":2,"method":"ping"}}]"#);
        let err = session.handle(payload(&batch)).await.unwrap_err();
        assert!(matches!(err, EchoError::Protocol { code: INVALID_REQUEST, .. }));
    }

    #[tokio::test]
    async fn batch_replies_are_an_array_and_notifications_are_silent() {
        let session = session();
        session.handle(payload(INIT)).await.unwrap();

        let body = session
            .handle(payload(
                r#"[{"jsonrpc":"2.0","id":2,"method":"ping"},{"jsonrpc":"2.0","method":"notifications/initialized"}]"#,
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(body.as_array().unwrap().len(), 1);

        let none = session
            .handle(payload(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#))
            .await
            .unwrap();
        assert!(none.is_none());
    }
}
