//! Error types for assembly, execution, and elicitation.
//!
//! Every variant has a stable `kind()` string that the event protocol and
//! the gateway report to clients.

use foundry_core::error::{CheckpointError, ProviderError};
use foundry_core::spec::ValidationErrors;
use thiserror::Error;

/// Why a spec could not be turned into an executable graph.
#[derive(Debug, Clone, Error)]
pub enum AssemblyError {
    #[error("Invalid spec: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Agent '{agent}' references unknown tool '{name}' (available: {})", available.join(", "))]
    UnresolvedTool {
        agent: String,
        name: String,
        available: Vec<String>,
    },

    #[error("Agent '{agent}' uses unknown model tier '{tier}' (known: {})", known.join(", "))]
    UnknownModelTier {
        agent: String,
        tier: String,
        known: Vec<String>,
    },

    #[error("Agent '{name}' is nested {depth} levels deep; the limit is {max}")]
    MaxDepthExceeded { name: String, depth: usize, max: usize },

    #[error("Agent '{name}' lists itself as a sub-agent")]
    SelfReference { name: String },
}

impl AssemblyError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::UnresolvedTool { .. } => "unresolved_tool",
            Self::UnknownModelTier { .. } => "unknown_model_tier",
            Self::MaxDepthExceeded { .. } => "max_depth_exceeded",
            Self::SelfReference { .. } => "self_reference",
        }
    }
}

/// Why a run ended without a final state.
#[derive(Debug, Clone, Error)]
pub enum RunError {
    #[error("Model call failed: {0}")]
    Model(#[from] ProviderError),

    #[error("Iteration limit of {0} reached without a final answer")]
    IterationLimit(u32),

    #[error("Checkpoint failed: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Run cancelled")]
    Cancelled,
}

impl RunError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::IterationLimit(_) => "iteration_limit",
            Self::Checkpoint(_) => "checkpoint",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ElicitationError {
    #[error("Failed to assemble the architect agent: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Elicitation run failed: {0}")]
    Run(#[from] RunError),

    #[error("Architect replied without asking or saving: {text}")]
    Unclassified { text: String },

    #[error("Architect produced an invalid outcome: {0}")]
    InvalidOutcome(String),

    #[error("Elicitation session is already finalized")]
    AlreadyFinalized,
}

impl ElicitationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Assembly(e) => e.kind(),
            Self::Run(e) => e.kind(),
            Self::Unclassified { .. } => "unclassified",
            Self::InvalidOutcome(_) => "invalid_outcome",
            Self::AlreadyFinalized => "already_finalized",
        }
    }
}
