//! In-memory store — useful for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use foundry_core::checkpoint::{validate_session_id, CheckpointStore, SessionState};
use foundry_core::error::CheckpointError;
use tokio::sync::RwLock;

/// Sessions kept in a map; lost when the process exits.
#[derive(Clone, Default)]
pub struct InMemoryCheckpointStore {
    sessions: Arc<RwLock<HashMap<String, SessionState>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, state: &SessionState) -> Result<(), CheckpointError> {
        validate_session_id(&state.session_id)?;
        self.sessions
            .write()
            .await
            .insert(state.session_id.clone(), state.clone());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<SessionState, CheckpointError> {
        validate_session_id(session_id)?;
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| CheckpointError::NotFound(session_id.to_string()))
    }

    async fn delete(&self, session_id: &str) -> Result<(), CheckpointError> {
        validate_session_id(session_id)?;
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}
