//! Run-level streaming events.
//!
//! `AgentStreamEvent` is what a streaming run yields and what the gateway
//! forwards over SSE. Within one run the order is causal: `run_started`
//! first, a `tool_call_result` only after its `tool_call_started`, and
//! exactly one terminal event (`run_finished` or `run_error`) last. A
//! cancelled run stops without a terminal event.

use serde::{Deserialize, Serialize};

use crate::elicitation::ElicitationOutcome;
use crate::graph::RunState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    RunStarted { run_id: String, thread_id: String },

    /// Partial text from the model.
    TextDelta { delta: String },

    ToolCallStarted {
        id: String,
        name: String,
        args: serde_json::Value,
    },

    /// Exactly one of `result` and `error` is set.
    ToolCallResult {
        id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// The tool about to run is a nested agent.
    SubagentDelegated { name: String, task: String },

    /// Structured outcome of an elicitation turn.
    Elicitation { outcome: ElicitationOutcome },

    RunFinished { final_state: RunState },

    RunError { kind: String, message: String },
}

impl AgentStreamEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::TextDelta { .. } => "text_delta",
            Self::ToolCallStarted { .. } => "tool_call_started",
            Self::ToolCallResult { .. } => "tool_call_result",
            Self::SubagentDelegated { .. } => "subagent_delegated",
            Self::Elicitation { .. } => "elicitation",
            Self::RunFinished { .. } => "run_finished",
            Self::RunError { .. } => "run_error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunFinished { .. } | Self::RunError { .. })
    }
}
