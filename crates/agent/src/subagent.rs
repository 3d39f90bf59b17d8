//! Nested agents exposed to their parent as ordinary tools.

use async_trait::async_trait;
use foundry_core::error::ToolError;
use foundry_core::message::{Message, final_answer};
use foundry_core::tool::{Tool, ToolResult};
use tracing::debug;

use crate::graph::AgentGraph;

/// Runs an assembled child graph on a single `task`.
///
/// The child starts from a fresh conversation holding only the task, and
/// only its final answer is returned to the parent.
pub struct SubAgentTool {
    name: String,
    description: String,
    graph: AgentGraph,
}

impl SubAgentTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, graph: AgentGraph) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            graph,
        }
    }

    pub fn graph(&self) -> &AgentGraph {
        &self.graph
    }
}

#[async_trait]
impl Tool for SubAgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "description": "The task to delegate, with all context the agent needs"
                }
            },
            "required": ["task"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let task = arguments["task"]
            .as_str()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'task' argument".into()))?;

        debug!(subagent = %self.graph.name(), tool = %self.name, "Delegating task");
        let state = self
            .graph
            .invoke(vec![Message::user(task)])
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: format!("Sub-agent '{}' error: {e}", self.graph.name()),
            })?;

        let answer = state
            .output
            .clone()
            .or_else(|| final_answer(&state.messages).map(str::to_string))
            .unwrap_or_default();
        Ok(ToolResult::text(answer))
    }
}
