//! Built-in tool implementations.
//!
//! Specs reference tools by name; these are the names available out of the
//! box. Applications register their own tools into the same registry.

pub mod calculator;
pub mod current_time;

use std::sync::Arc;

use foundry_core::tool::{Tool, ToolRegistry};
use tracing::info;

/// Every built-in tool.
pub fn builtin_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(calculator::CalculatorTool),
        Arc::new(current_time::CurrentTimeTool),
    ]
}

/// Register every built-in tool into `registry`.
pub fn register_builtin(registry: &ToolRegistry) {
    let tools = builtin_tools();
    let count = tools.len();
    for tool in tools {
        registry.register(tool);
    }
    info!(count, "Registered built-in tools");
}
