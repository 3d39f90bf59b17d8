//! Turns agent specs into executable graphs.
//!
//! Assembly is all-or-nothing. The whole tree is checked before anything is
//! built:
//!
//! 1. A structural pass bounds the nesting depth and rejects agents that
//!    list themselves as sub-agents. It walks the tree iteratively, so
//!    hostile documents cannot exhaust the stack.
//! 2. Every validation rule runs over the whole tree and all violations are
//!    reported together.
//! 3. Model tiers and tool names are resolved per agent, bottom-up through
//!    the sub-agents, and any miss fails the whole assembly.

use std::sync::Arc;

use foundry_core::provider::ModelResolver;
use foundry_core::spec::{AgentSpec, ValidationErrors, Violation};
use foundry_core::tool::{Tool, ToolMap};
use tracing::info;

use crate::error::AssemblyError;
use crate::graph::{AgentGraph, BoundTool, DEFAULT_MAX_ITERATIONS, ToolKind};
use crate::subagent::SubAgentTool;

/// Deepest sub-agent nesting accepted by default. The root is depth 0.
pub const DEFAULT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyOptions {
    pub max_depth: usize,
    /// Iteration bound for agents whose spec does not set one
    pub default_max_iterations: u32,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            default_max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// An agent described in code rather than as a spec document.
#[derive(Clone)]
pub struct AgentDefinition {
    pub name: String,
    pub model_tier: String,
    pub system_prompt: String,
    pub tools: Vec<Arc<dyn Tool>>,
    pub temperature: f64,
    pub max_iterations: Option<u32>,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, model_tier: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_tier: model_tier.into(),
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
            temperature: foundry_core::spec::DEFAULT_TEMPERATURE,
            max_iterations: None,
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

#[derive(Clone)]
pub struct Assembler {
    resolver: Arc<dyn ModelResolver>,
    options: AssemblyOptions,
}

impl Assembler {
    pub fn new(resolver: Arc<dyn ModelResolver>) -> Self {
        Self {
            resolver,
            options: AssemblyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AssemblyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn options(&self) -> AssemblyOptions {
        self.options
    }

    pub fn resolver(&self) -> &Arc<dyn ModelResolver> {
        &self.resolver
    }

    /// Assemble `spec` against `tools`. The map is only read.
    pub fn assemble(&self, spec: &AgentSpec, tools: &ToolMap) -> Result<AgentGraph, AssemblyError> {
        self.check_structure(spec)?;
        spec.validate()?;
        self.build(spec, tools)
    }

    /// Build a graph from a code-level definition. Its tools are bound in
    /// the order given and their names must be unique.
    pub fn create_agent(&self, definition: AgentDefinition) -> Result<AgentGraph, AssemblyError> {
        let mut tools = ToolMap::new();
        let mut violations = Vec::new();
        for (i, tool) in definition.tools.iter().enumerate() {
            if tools.insert(tool.name().to_string(), Arc::clone(tool)).is_some() {
                violations.push(Violation::new(
                    format!("tools[{i}]"),
                    format!("tool name '{}' is listed more than once", tool.name()),
                ));
            }
        }

        let mut builder = AgentSpec::builder(definition.name, definition.system_prompt, definition.model_tier)
            .with_temperature(definition.temperature)
            .with_tools(definition.tools.iter().map(|t| t.name().to_string()));
        if let Some(max) = definition.max_iterations {
            builder = builder.with_max_iterations(max);
        }
        let spec = builder.build_unchecked();

        if let Err(errors) = spec.validate() {
            violations.extend(errors.0);
        }
        if !violations.is_empty() {
            return Err(ValidationErrors(violations).into());
        }
        self.build(&spec, &tools)
    }

    fn check_structure(&self, spec: &AgentSpec) -> Result<(), AssemblyError> {
        let max = self.options.max_depth;
        for node in spec.walk(max.saturating_add(1)) {
            if node.depth > max {
                return Err(AssemblyError::MaxDepthExceeded {
                    name: node.spec.name.clone(),
                    depth: node.depth,
                    max,
                });
            }
            if let Some(parent) = node.parent
                && parent.name == node.spec.name
            {
                return Err(AssemblyError::SelfReference {
                    name: node.spec.name.clone(),
                });
            }
        }
        Ok(())
    }

    // Recursion depth is bounded by `check_structure`.
    fn build(&self, spec: &AgentSpec, tools: &ToolMap) -> Result<AgentGraph, AssemblyError> {
        let model = self
            .resolver
            .resolve(&spec.model_tier)
            .ok_or_else(|| AssemblyError::UnknownModelTier {
                agent: spec.name.clone(),
                tier: spec.model_tier.clone(),
                known: self.resolver.tiers(),
            })?;

        let mut bound = Vec::with_capacity(spec.tool_names.len() + spec.subagents().len());
        for name in &spec.tool_names {
            let tool = tools.get(name).ok_or_else(|| AssemblyError::UnresolvedTool {
                agent: spec.name.clone(),
                name: name.clone(),
                available: tools.keys().cloned().collect(),
            })?;
            bound.push(BoundTool {
                tool: Arc::clone(tool),
                kind: ToolKind::Tool,
            });
        }

        for sub in spec.subagents() {
            let graph = self.build(&sub.agent, tools)?;
            bound.push(BoundTool {
                tool: Arc::new(SubAgentTool::new(&sub.tool_name, &sub.tool_description, graph)),
                kind: ToolKind::SubAgent,
            });
        }

        info!(
            agent = %spec.name,
            tier = %spec.model_tier,
            model = %model.model,
            tools = bound.len(),
            temperature = spec.temperature,
            "Assembled agent"
        );

        Ok(AgentGraph::new(
            &spec.name,
            &spec.system_prompt,
            model,
            spec.temperature,
            spec.max_iterations.unwrap_or(self.options.default_max_iterations),
            bound,
        ))
    }
}
