//! # Foundry Core
//!
//! Domain types, traits, and error definitions for the agent foundry.
//! This crate has **no framework dependencies**: it defines the declarative
//! agent model and the seams every other crate implements against.
//!
//! ## Layout
//!
//! - [`spec`]: the `AgentSpec` document and its validation rules
//! - [`tool`]: the `Tool` trait and the process-wide `ToolRegistry`
//! - [`provider`]: the `Provider` trait and model-tier resolution
//! - [`checkpoint`]: the `CheckpointStore` trait for session persistence
//! - [`message`]: conversation messages exchanged with providers

pub mod checkpoint;
pub mod error;
pub mod message;
pub mod provider;
pub mod spec;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use checkpoint::{CheckpointStore, SessionState};
pub use error::{CheckpointError, ProviderError, SpecError, ToolError};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{ModelHandle, ModelResolver, Provider, ProviderRequest, ProviderResponse, StreamChunk, TierResolver};
pub use spec::{AgentSpec, SubAgentSpec, ValidationErrors, Violation};
pub use tool::{Tool, ToolCatalogItem, ToolMap, ToolRegistry};

/// Generate an opaque identifier of the form `{prefix}_{32 hex chars}`.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}
