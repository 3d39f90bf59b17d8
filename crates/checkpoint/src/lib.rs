//! Checkpoint stores for the execution runtime.
//!
//! All stores implement `foundry_core::CheckpointStore`.
//! [`from_config`] selects a backend from configuration.

pub mod file_store;
pub mod in_memory;

use std::sync::Arc;

use foundry_config::CheckpointConfig;
use foundry_core::CheckpointStore;

pub use file_store::FileCheckpointStore;
pub use in_memory::InMemoryCheckpointStore;

/// Build the configured checkpoint store.
pub fn from_config(config: &CheckpointConfig) -> Arc<dyn CheckpointStore> {
    match config.backend.as_str() {
        "file" => Arc::new(FileCheckpointStore::new(config.resolved_dir())),
        _ => Arc::new(InMemoryCheckpointStore::new()),
    }
}
