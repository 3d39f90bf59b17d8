//! Error types shared across the foundry crates.
//!
//! One `thiserror` enum per seam: providers, tools, checkpoint stores and
//! spec documents. Crates further up (assembly, runs, elicitation) define
//! their own enums that wrap these.

use thiserror::Error;

use crate::spec::ValidationErrors;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {name} (available: {})", available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Clone, Error)]
pub enum CheckpointError {
    #[error("No checkpoint for session {0}")]
    NotFound(String),

    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("Session {0} is already in use by another run")]
    SessionBusy(String),

    #[error("Checkpoint storage error: {0}")]
    Storage(String),
}

/// Errors produced while reading an agent spec document.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Malformed spec document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid spec: {0}")]
    Invalid(#[from] ValidationErrors),
}
