//! Checkpoint trait — session persistence for the execution runtime.
//!
//! A checkpoint is the full message history of one session after its last
//! completed run. Stores must make `save` atomic: a reader sees either the
//! previous state or the new one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;
use crate::message::Message;

/// The persisted state of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,

    /// Name of the agent that produced this state
    pub agent: String,

    /// Full history, oldest first, without the system prompt
    pub messages: Vec<Message>,

    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>, agent: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            session_id: session_id.into(),
            agent: agent.into(),
            messages,
            updated_at: Utc::now(),
        }
    }
}

/// Session ids are used as storage keys; keep them to a safe alphabet.
pub fn validate_session_id(id: &str) -> Result<(), CheckpointError> {
    let ok = !id.is_empty()
        && id.len() <= 128
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(CheckpointError::InvalidSessionId(id.to_string()))
    }
}

/// Persistence backend for session state.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Atomically replace the state stored for `state.session_id`.
    async fn save(&self, state: &SessionState) -> Result<(), CheckpointError>;

    /// Load a session, or `CheckpointError::NotFound`.
    async fn load(&self, session_id: &str) -> Result<SessionState, CheckpointError>;

    /// Remove a session. Removing an unknown session is not an error.
    async fn delete(&self, session_id: &str) -> Result<(), CheckpointError>;
}
