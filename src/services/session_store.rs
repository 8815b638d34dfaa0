use crate::error::Result;
use crate::models::session::SessionState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Last-write-wins key-value store for per-session state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fresh state when the session has never been seen.
    async fn get(&self, session_id: &str) -> Result<SessionState>;

    async fn put(&self, session_id: &str, state: SessionState) -> Result<()>;

    async fn reset(&self, session_id: &str) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionState>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<SessionState> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn put(&self, session_id: &str, state: SessionState) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), state);
        Ok(())
    }

    async fn reset(&self, session_id: &str) -> Result<()> {
        if self.sessions.write().await.remove(session_id).is_some() {
            tracing::info!(session_id, "Session reset");
        }
        Ok(())
    }
}
