//! HTTP verb dispatch for the `/mcp` endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use super::registry::SessionRegistry;
use super::session::Session;
use super::transport::{uuid_generator, SessionIdGenerator};
use crate::error::EchoError;
use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse};
use crate::mcp::{Payload, ServerCatalog};

/// Header carrying the session identifier.
pub const SESSION_HEADER: &str = "mcp-session-id";

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Shared state for the endpoint handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: SessionRegistry,
    pub catalog: Arc<ServerCatalog>,
    pub id_generator: SessionIdGenerator,
}

impl AppState {
    pub fn new(catalog: ServerCatalog) -> Self {
        Self {
            registry: SessionRegistry::new(),
            catalog: Arc::new(catalog),
            id_generator: uuid_generator(),
        }
    }

    /// Builder: replace the session id generator.
    pub fn with_id_generator(mut self, generator: SessionIdGenerator) -> Self {
        self.id_generator = generator;
        self
    }
}

fn header_session_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

fn known_session(state: &AppState, headers: &HeaderMap) -> Option<Arc<Session>> {
    header_session_id(headers).and_then(|id| state.registry.lookup(id))
}

/// GET: open the session's push-stream.
pub async fn open_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, EchoError> {
    let session = known_session(&state, &headers).ok_or(EchoError::InvalidSession)?;
    let session_id = session.id().unwrap_or_default().to_string();
    tracing::debug!(%session_id, "Push-stream opened");

    let closed = session.transport().closed_token();
    let events = BroadcastStream::new(session.transport().subscribe())
        .filter_map(|item| async move {
            match item {
                Ok(notification) => Some(Event::default().event("message").json_data(notification)),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Push-stream subscriber lagged");
                    None
                }
            }
        })
        .take_until(closed.cancelled_owned());

    let keep_alive = KeepAlive::new().interval(KEEP_ALIVE_INTERVAL);
    Ok((
        [(SESSION_HEADER, session_id)],
        Sse::new(events).keep_alive(keep_alive),
    )
        .into_response())
}

/// POST: route a JSON-RPC payload, creating a session when none is named.
pub async fn handle_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, EchoError> {
    let payload = Payload::parse(&body)?;

    if let Some(session) = known_session(&state, &headers) {
        let reply = session.handle(payload).await?;
        return Ok(reply_response(session.id(), reply));
    }

    let session = Arc::new(Session::new(
        state.catalog.clone(),
        state.id_generator.clone(),
    ));
    let reply = session.handle(payload).await?;

    let Some(id) = session.id().map(str::to_string) else {
        // initialize was answered with an error; the session is discarded
        return Ok((StatusCode::BAD_REQUEST, Json(reply)).into_response());
    };

    if let Err(error) = state.registry.create(id.clone(), session.clone()) {
        tracing::error!(session_id = %id, %error, "Session id collision");
        session.close();
        return Err(error);
    }
    tracing::info!(session_id = %id, sessions = state.registry.len(), "Session created");

    Ok(reply_response(Some(&id), reply))
}

fn reply_response(session_id: Option<&str>, reply: Option<serde_json::Value>) -> Response {
    let mut response = match reply {
        Some(body) => (StatusCode::OK, Json(body)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };
    if let Some(value) = session_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

/// DELETE: tear the named session down. Unknown or missing ids are a no-op.
pub async fn close_session(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(id) = header_session_id(&headers) {
        if let Some(session) = state.registry.lookup(id) {
            session.close();
            state.registry.remove(id);
            tracing::info!(session_id = %id, sessions = state.registry.len(), "Session closed");
        }
    }
    StatusCode::OK
}

pub async fn unsupported_method(method: Method) -> EchoError {
    EchoError::MethodNotSupported(method.to_string())
}

pub async fn not_found(uri: Uri) -> EchoError {
    EchoError::NotFound(uri.path().to_string())
}

impl IntoResponse for EchoError {
    fn into_response(self) -> Response {
        let category = self.category();
        if category.is_client_error() {
            tracing::warn!(error = %self, "Request rejected");
        } else {
            tracing::error!(error = %self, "Request failed");
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = JsonRpcResponse::failure(None, JsonRpcError::from(&self));
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_header_is_read_verbatim() {
        let mut headers = HeaderMap::new();
        assert_eq!(header_session_id(&headers), None);
        headers.insert(SESSION_HEADER, "abc".parse().unwrap());
        assert_eq!(header_session_id(&headers), Some("abc"));
    }

    #[test]
    fn errors_map_to_status_codes() {
        let cases = [
            (EchoError::InvalidSession, StatusCode::BAD_REQUEST),
            (EchoError::MethodNotSupported("PUT".into()), StatusCode::METHOD_NOT_ALLOWED),
            (EchoError::NotFound("/x".into()), StatusCode::NOT_FOUND),
            (EchoError::DuplicateSession("a".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
