//! Agent assembly and execution for the agent foundry.
//!
//! A declarative [`AgentSpec`](foundry_core::AgentSpec) goes through three
//! stages:
//!
//! 1. **Assemble**: the [`Assembler`] validates the spec tree, resolves model
//!    tiers and tool names, and wraps sub-agents as tools, producing an
//!    [`AgentGraph`]
//! 2. **Bind**: the [`Runtime`] pairs the graph with an optional checkpoint
//!    store, producing an [`ExecutableAgent`]
//! 3. **Run**: `invoke` runs to completion, `stream` yields
//!    [`AgentStreamEvent`]s as the run progresses
//!
//! The [`ElicitationEngine`] is an agent built the same way whose job is to
//! write specs by talking to a user.

pub mod assembler;
pub mod elicitation;
pub mod error;
pub mod graph;
pub mod runtime;
pub mod stream_event;
pub mod subagent;

#[cfg(any(test, feature = "testing"))]
pub mod test_helpers;

pub use assembler::{AgentDefinition, Assembler, AssemblyOptions, DEFAULT_MAX_DEPTH};
pub use elicitation::{
    ClarifyingQuestion, ElicitationEngine, ElicitationOutcome, ElicitationSession, ElicitationState,
    format_tool_catalog,
};
pub use error::{AssemblyError, ElicitationError, RunError};
pub use graph::{AgentGraph, DEFAULT_MAX_ITERATIONS, RunState, RunStream};
pub use runtime::{CheckpointPolicy, ExecutableAgent, RunRequest, Runtime};
pub use stream_event::AgentStreamEvent;
pub use subagent::SubAgentTool;
pub use tokio_util::sync::CancellationToken;
