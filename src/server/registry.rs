//! Concurrent session registry.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::session::Session;
use crate::error::{EchoError, Result};

/// Sessions by identifier. Thread-safe and cheap to clone.
///
/// An entry is removed on explicit teardown or when its transport closes.
/// There is no idle expiry.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Insert `session` under `id` unless the id is taken.
    ///
    /// Spawns a watcher that drops the entry once the session's transport
    /// closes, so this must run inside a Tokio runtime.
    pub fn create(&self, id: impl Into<String>, session: Arc<Session>) -> Result<Arc<Session>> {
        let id = id.into();
        match self.sessions.entry(id.clone()) {
            Entry::Occupied(_) => return Err(EchoError::DuplicateSession(id)),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
            }
        }

        let closed = session.transport().closed_token();
        let watched = Arc::downgrade(&session);
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            closed.cancelled().await;
            let removed =
                sessions.remove_if(&id, |_, current| Arc::as_ptr(current) == watched.as_ptr());
            if removed.is_some() {
                tracing::debug!(session_id = %id, "Session removed after transport closed");
            }
        });

        Ok(session)
    }

    /// Drop the entry for `id`. Absent ids are a no-op.
    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Close every session and empty the registry.
    pub fn close_all(&self) {
        let sessions: Vec<_> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for session in &sessions {
            session.close();
        }
        self.sessions.clear();
        tracing::info!(closed = sessions.len(), "Closed all sessions");
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::ServerCatalog;
    use crate::server::transport::uuid_generator;
    use crate::tools::WikipediaClient;
    use std::time::Duration;

    fn session() -> Arc<Session> {
        let wiki = WikipediaClient::new("http://127.0.0.1:9").unwrap();
        Arc::new(Session::new(
            Arc::new(ServerCatalog::wikipedia(wiki)),
            uuid_generator(),
        ))
    }

    #[tokio::test]
    async fn create_then_lookup_returns_same_session() {
        let registry = SessionRegistry::new();
        let created = registry.create("a", session()).unwrap();
        let found = registry.lookup("a").unwrap();
        assert!(Arc::ptr_eq(&created, &found));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = SessionRegistry::new();
        registry.create("a", session()).unwrap();
        assert!(registry.remove("a").is_some());
        assert!(registry.lookup("a").is_none());
        assert!(registry.remove("a").is_none());
        assert!(registry.remove("never").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let registry = SessionRegistry::new();
        let first = registry.create("a", session()).unwrap();
        let err = registry.create("a", session()).unwrap_err();
        assert!(matches!(err, EchoError::DuplicateSession(id) if id == "a"));
        assert!(Arc::ptr_eq(&first, &registry.lookup("a").unwrap()));
    }

    #[tokio::test]
    async fn transport_closure_removes_entry() {
        let registry = SessionRegistry::new();
        let session = registry.create("a", session()).unwrap();
        session.close();

        tokio::time::timeout(Duration::from_secs(1), async {
            while registry.lookup("a").is_some() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("entry should be removed after close");
    }

    #[tokio::test]
    async fn close_all_closes_transports() {
        let registry = SessionRegistry::new();
        let a = registry.create("a", session()).unwrap();
        let b = registry.create("b", session()).unwrap();
        let mut ids = registry.ids();
        ids.sort();
        assert_eq!(ids, ["a", "b"]);

        registry.close_all();
        assert!(registry.is_empty());
        assert!(a.transport().is_closed() && b.transport().is_closed());
    }
}
