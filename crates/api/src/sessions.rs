//! In-memory session registry.
//!
//! Each session owns one [`WorkflowState`] behind its own lock; the registry
//! lock is only held to look a session up, never while a workflow operation
//! runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use decora_core::error::CoreError;
use decora_core::types::{SessionId, Timestamp};
use decora_core::workflow::WorkflowState;
use decora_pipeline::Session;
use tokio::sync::RwLock;

/// How often the idle sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A registered session, when it was created and when a client last
/// looked it up.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub id: SessionId,
    pub created_at: Timestamp,
    pub last_seen: Timestamp,
    pub session: Arc<Session>,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh session in the `Empty` phase.
    pub async fn create(&self) -> SessionEntry {
        let now = chrono::Utc::now();
        let entry = SessionEntry {
            id: uuid::Uuid::new_v4(),
            created_at: now,
            last_seen: now,
            session: Arc::new(Session::new(WorkflowState::new())),
        };
        self.sessions.write().await.insert(entry.id, entry.clone());
        tracing::debug!(session_id = %entry.id, "Session created");
        entry
    }

    /// Look a session up and mark it as seen.
    pub async fn get(&self, id: SessionId) -> Result<SessionEntry, CoreError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
        entry.last_seen = chrono::Utc::now();
        Ok(entry.clone())
    }

    /// Drop a session. Background runs still holding it finish against the
    /// detached state.
    pub async fn remove(&self, id: SessionId) -> Result<(), CoreError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| tracing::debug!(session_id = %id, "Session removed"))
            .ok_or_else(|| session_not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every session not seen since `cutoff`. Returns how many were
    /// evicted.
    pub async fn evict_idle(&self, cutoff: Timestamp) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen >= cutoff);
        before - sessions.len()
    }

    /// Periodically evict sessions idle for longer than `ttl`. Runs until
    /// the runtime shuts down.
    pub async fn run_sweeper(self: Arc<Self>, ttl: Duration, every: Duration) {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let mut interval = tokio::time::interval(every);

        loop {
            interval.tick().await;
            let cutoff = chrono::Utc::now()
                .checked_sub_signed(ttl)
                .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);
            let evicted = self.evict_idle(cutoff).await;
            if evicted > 0 {
                let remaining = self.len().await;
                tracing::info!(evicted, remaining, "Idle sessions evicted");
            }
        }
    }
}

fn session_not_found(id: SessionId) -> CoreError {
    CoreError::NotFound {
        entity: "Session",
        id: id.to_string(),
    }
}
