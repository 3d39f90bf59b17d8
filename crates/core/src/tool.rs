//! Tool trait and the process-wide tool registry.
//!
//! Tools are named capabilities an agent can call: a name, a description
//! for the model, a JSON input schema, and an async `execute`. Agent specs
//! reference tools by name; the registry is where those names resolve.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output content fed back to the model
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            data: None,
        }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;

    /// When true, a successful call ends the run and its output becomes the
    /// run's final answer.
    fn returns_directly(&self) -> bool {
        false
    }

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Name → tool mapping handed to the assembler.
pub type ToolMap = BTreeMap<String, Arc<dyn Tool>>;

/// One entry of the registry catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCatalogItem {
    pub name: String,
    pub description: String,
}

/// A shared registry of available tools.
///
/// Cloning the registry clones the handle, not the contents. Writers build a
/// new map and swap it in under the lock, so a reader always sees either the
/// old map or the new one, never a partially registered tool.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<RwLock<Arc<ToolMap>>>,
}

static GLOBAL: OnceLock<ToolRegistry> = OnceLock::new();

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static ToolRegistry {
        GLOBAL.get_or_init(ToolRegistry::new)
    }

    fn snapshot(&self) -> Arc<ToolMap> {
        Arc::clone(&self.tools.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        let mut guard = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = ToolMap::clone(&guard);
        if next.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replacing previously registered tool");
        } else {
            debug!(tool = %name, "Registered tool");
        }
        *guard = Arc::new(next);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> std::result::Result<Arc<dyn Tool>, ToolError> {
        let tools = self.snapshot();
        tools.get(name).cloned().ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
            available: tools.keys().cloned().collect(),
        })
    }

    /// A copy of the whole mapping. Later registrations do not affect it.
    pub fn get_all(&self) -> ToolMap {
        ToolMap::clone(&self.snapshot())
    }

    /// `(name, description)` for every tool, sorted by name.
    pub fn catalog(&self) -> Vec<ToolCatalogItem> {
        self.snapshot()
            .values()
            .map(|t| ToolCatalogItem {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.snapshot().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Remove every tool. Only available to tests.
    #[cfg(any(test, feature = "testing"))]
    pub fn reset(&self) {
        *self.tools.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(ToolMap::new());
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}
