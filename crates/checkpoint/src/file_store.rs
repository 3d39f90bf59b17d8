//! File-based checkpoint store: one JSON document per session.
//!
//! Storage location: `<dir>/<session_id>.json` (by default
//! `~/.foundry/sessions`). Writes go to a temporary file in the same
//! directory which is then renamed over the target, so a crash mid-write
//! leaves the previous checkpoint intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use foundry_core::checkpoint::{validate_session_id, CheckpointStore, SessionState};
use foundry_core::error::CheckpointError;
use tracing::debug;
use uuid::Uuid;

pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf, CheckpointError> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{session_id}.json")))
    }
}

fn storage(context: &str, e: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::Storage(format!("{context}: {e}"))
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, state: &SessionState) -> Result<(), CheckpointError> {
        let path = self.path_for(&state.session_id)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage("Failed to create checkpoint directory", e))?;

        let body = serde_json::to_vec_pretty(state).map_err(|e| storage("Failed to serialize session", e))?;
        let tmp = self.dir.join(format!(".{}.{}.tmp", state.session_id, Uuid::new_v4().simple()));

        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(storage("Failed to write checkpoint", e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(storage("Failed to commit checkpoint", e));
        }

        debug!(session = %state.session_id, messages = state.messages.len(), "Checkpoint saved");
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<SessionState, CheckpointError> {
        let path = self.path_for(session_id)?;
        let body = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound(session_id.to_string()));
            }
            Err(e) => return Err(storage("Failed to read checkpoint", e)),
        };
        serde_json::from_slice(&body).map_err(|e| storage("Corrupted checkpoint", e))
    }

    async fn delete(&self, session_id: &str) -> Result<(), CheckpointError> {
        let path = self.path_for(session_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage("Failed to delete checkpoint", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundry_core::Message;

    #[tokio::test]
    async fn persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let state = SessionState::new("thread_1", "helper", vec![Message::user("hi"), Message::assistant("hello")]);

        FileCheckpointStore::new(dir.path()).save(&state).await.unwrap();

        let reopened = FileCheckpointStore::new(dir.path());
        let loaded = reopened.load("thread_1").await.unwrap();
        assert_eq!(loaded.agent, "helper");
        assert_eq!(loaded.messages.len(), 2);
        assert_eq!(loaded.messages[1].content, "hello");
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("nested"));
        assert!(matches!(store.load("nope").await, Err(CheckpointError::NotFound(_))));
        store.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        for i in 0..3 {
            let msgs = (0..=i).map(|n| Message::user(format!("m{n}"))).collect();
            store.save(&SessionState::new("s", "a", msgs)).await.unwrap();
        }
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["s.json".to_string()]);
        assert_eq!(store.load("s").await.unwrap().messages.len(), 3);
    }

    #[tokio::test]
    async fn corrupted_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let store = FileCheckpointStore::new(dir.path());
        assert!(matches!(store.load("bad").await, Err(CheckpointError::Storage(_))));
    }

    #[tokio::test]
    async fn path_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let state = SessionState::new("../escape", "a", vec![]);
        assert!(matches!(store.save(&state).await, Err(CheckpointError::InvalidSessionId(_))));
    }
}
