//! Per-session transport binding: identifier slot, push channel and closure.

use std::sync::{Arc, OnceLock};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::mcp::protocol::JsonRpcNotification;
use crate::mcp::Notifier;

/// Produces identifiers for new sessions.
pub type SessionIdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Default generator: random UUID v4.
pub fn uuid_generator() -> SessionIdGenerator {
    Arc::new(|| uuid::Uuid::new_v4().to_string())
}

/// Transport state of one session.
///
/// The identifier is assigned at most once, during the initializing exchange.
pub struct StreamTransport {
    session_id: OnceLock<String>,
    generator: SessionIdGenerator,
    notifier: Notifier,
    closed: CancellationToken,
}

impl StreamTransport {
    pub fn new(generator: SessionIdGenerator) -> Self {
        Self {
            session_id: OnceLock::new(),
            generator,
            notifier: Notifier::default(),
            closed: CancellationToken::new(),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.get().map(String::as_str)
    }

    /// Assign the identifier if none is set yet, returning the current one.
    pub fn assign_id(&self) -> &str {
        self.session_id.get_or_init(|| (self.generator)())
    }

    /// Sender for push events; handed to the session's engine.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Open a new independent receiver on the push channel.
    pub fn subscribe(&self) -> broadcast::Receiver<JsonRpcNotification> {
        self.notifier.subscribe()
    }

    /// Mark the transport closed. Open streams end; idempotent.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Token cancelled when the transport closes.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }
}

impl std::fmt::Debug for StreamTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("session_id", &self.session_id())
            .field("closed", &self.is_closed())
            .field("streams", &self.notifier.receiver_count())
            .finish()
    }
}
