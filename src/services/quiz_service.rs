use crate::error::Result;
use crate::models::catalog::DomainCatalog;
use crate::models::question::OptionLabel;
use crate::services::answer_service::{AnswerCheck, AnswerService};
use crate::services::catalog_provider::CatalogProvider;
use crate::services::orchestrator::{GenerationOutcome, QuestionOrchestrator};
use crate::services::session_store::SessionStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

type SessionLock = Arc<tokio::sync::Mutex<()>>;
type LockMap = Arc<Mutex<HashMap<String, SessionLock>>>;

/// Holds a session's lock; on drop, removes the map entry once nobody else uses it.
struct SessionGuard {
    locks: LockMap,
    session_id: String,
    lock: SessionLock,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let ours = locks
            .get(&self.session_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &self.lock));
        // The map and this guard are the only holders.
        if ours && Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.session_id);
        }
    }
}

/// Session-scoped entry point: load state, run one operation, store it back.
/// Calls for the same session are serialised; different sessions run freely.
#[derive(Clone)]
pub struct QuizService {
    orchestrator: Arc<QuestionOrchestrator>,
    answers: AnswerService,
    sessions: Arc<dyn SessionStore>,
    catalog: Arc<dyn CatalogProvider>,
    locks: LockMap,
}

impl QuizService {
    pub fn new(
        orchestrator: Arc<QuestionOrchestrator>,
        answers: AnswerService,
        sessions: Arc<dyn SessionStore>,
        catalog: Arc<dyn CatalogProvider>,
    ) -> Self {
        Self {
            orchestrator,
            answers,
            sessions,
            catalog,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock_for(&self, session_id: &str) -> SessionLock {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(session_id.to_string()).or_default())
    }

    async fn acquire(&self, session_id: &str) -> SessionGuard {
        let lock = self.lock_for(session_id);
        let guard = Arc::clone(&lock).lock_owned().await;
        SessionGuard {
            locks: Arc::clone(&self.locks),
            session_id: session_id.to_string(),
            lock,
            guard: Some(guard),
        }
    }

    /// Number of sessions currently holding or waiting on a lock.
    pub fn active_locks(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub async fn next_question(&self, session_id: &str) -> Result<(GenerationOutcome, u32)> {
        let _session = self.acquire(session_id).await;

        let mut state = self.sessions.get(session_id).await?;
        let outcome = self.orchestrator.generate_question(&mut state).await;
        let number = state.total_generated;
        self.sessions.put(session_id, state).await?;

        tracing::info!(
            session_id,
            question_number = number,
            source = ?outcome.record.source,
            "Question served"
        );
        Ok((outcome, number))
    }

    pub async fn answer(&self, session_id: &str, choice: OptionLabel) -> Result<AnswerCheck> {
        let _session = self.acquire(session_id).await;

        let state = self.sessions.get(session_id).await?;
        self.answers.check(&state, choice).await
    }

    pub async fn reset(&self, session_id: &str) -> Result<()> {
        let _session = self.acquire(session_id).await;
        self.sessions.reset(session_id).await
    }

    pub async fn catalog(&self) -> Result<DomainCatalog> {
        self.catalog.catalog().await
    }
}
