//! Current time tool.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use foundry_core::error::ToolError;
use foundry_core::tool::{Tool, ToolResult};

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Return the current date and time in UTC (RFC 3339)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let now = Utc::now();
        Ok(ToolResult {
            output: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            data: Some(serde_json::json!({ "unix": now.timestamp() })),
        })
    }
}
