//! The `AgentSpec` document: a declarative, validated description of an
//! agent, its tools, and its nested sub-agents.
//!
//! Specs are plain data. They are validated when built or parsed, consumed
//! by the assembler, and never mutated afterwards. Validation reports every
//! violation at once, each tagged with the field path it applies to
//! (`subagents[0].agent.temperature`).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SpecError;

/// Temperature used when a document omits it.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Upper bound accepted for `temperature`.
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Main agent specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Identifier, `[A-Za-z0-9_]+`, unique within the whole tree
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub system_prompt: String,

    /// Symbolic model tier, resolved at assembly (`"pro"`, `"flash"`, ...)
    #[serde(alias = "model")]
    pub model_tier: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Tool references, resolved against a tool map at assembly
    #[serde(default, alias = "tools")]
    pub tool_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subagents: Option<Vec<SubAgentSpec>>,

    #[serde(default = "default_version")]
    pub version: String,

    /// Upper bound on model round-trips; unset means the runtime default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
}

/// A nested agent exposed to its parent as a single tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAgentSpec {
    /// Name under which the parent sees this sub-agent
    pub tool_name: String,

    /// Description the parent's model reads when deciding to delegate
    pub tool_description: String,

    pub agent: AgentSpec,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_version() -> String {
    "1.0".into()
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted field path, e.g. `subagents[1].agent.name`
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Every violation found in one spec tree.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{}", render(.0))]
pub struct ValidationErrors(pub Vec<Violation>);

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.path, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    /// Whether any violation points at exactly `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.0.iter().any(|v| v.path == path)
    }
}

/// One agent in a pre-order traversal of a spec tree.
#[derive(Debug, Clone)]
pub struct SpecNode<'a> {
    pub spec: &'a AgentSpec,
    /// Path prefix for this agent's fields (`""` for the root)
    pub prefix: String,
    /// 0 for the root
    pub depth: usize,
    pub parent: Option<&'a AgentSpec>,
}

/// Whether `s` is a non-empty `[A-Za-z0-9_]+` identifier.
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl AgentSpec {
    /// Start building a spec from its required fields.
    pub fn builder(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model_tier: impl Into<String>,
    ) -> AgentSpecBuilder {
        AgentSpecBuilder {
            spec: AgentSpec {
                name: name.into(),
                description: String::new(),
                system_prompt: system_prompt.into(),
                model_tier: model_tier.into(),
                temperature: DEFAULT_TEMPERATURE,
                tool_names: Vec::new(),
                subagents: None,
                version: default_version(),
                max_iterations: None,
            },
        }
    }

    /// Parse, normalize, and validate a JSON spec document.
    pub fn parse(json: &str) -> Result<Self, SpecError> {
        let spec: AgentSpec = serde_json::from_str(json)?;
        spec.finish().map_err(SpecError::from)
    }

    /// Like [`AgentSpec::parse`] for an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SpecError> {
        let spec: AgentSpec = serde_json::from_value(value)?;
        spec.finish().map_err(SpecError::from)
    }

    /// Serialize to a pretty-printed JSON document.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn finish(mut self) -> Result<Self, ValidationErrors> {
        self.normalize();
        self.validate()?;
        Ok(self)
    }

    /// Collapse duplicate tool references everywhere in the tree, keeping the
    /// first occurrence.
    pub fn normalize(&mut self) {
        let mut stack: Vec<&mut AgentSpec> = vec![self];
        while let Some(spec) = stack.pop() {
            let mut seen = HashSet::new();
            spec.tool_names.retain(|n| seen.insert(n.clone()));
            if let Some(subs) = spec.subagents.as_mut() {
                for sub in subs.iter_mut() {
                    stack.push(&mut sub.agent);
                }
            }
        }
    }

    /// Direct sub-agents, or an empty slice.
    pub fn subagents(&self) -> &[SubAgentSpec] {
        self.subagents.as_deref().unwrap_or(&[])
    }

    /// Names this agent's model can call: tool names first, then sub-agents.
    pub fn exposed_tool_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tool_names
            .iter()
            .chain(self.subagents().iter().map(|s| &s.tool_name))
            .filter(|n| seen.insert(n.as_str()))
            .cloned()
            .collect()
    }

    /// Pre-order traversal of the tree without recursion.
    ///
    /// Children past `max_depth` are not visited; pass `usize::MAX` for the
    /// whole tree.
    pub fn walk(&self, max_depth: usize) -> Vec<SpecNode<'_>> {
        let mut out = Vec::new();
        let mut stack = vec![SpecNode {
            spec: self,
            prefix: String::new(),
            depth: 0,
            parent: None,
        }];
        while let Some(node) = stack.pop() {
            if node.depth < max_depth {
                for (i, sub) in node.spec.subagents().iter().enumerate().rev() {
                    stack.push(SpecNode {
                        spec: &sub.agent,
                        prefix: format!("{}subagents[{i}].agent.", node.prefix),
                        depth: node.depth + 1,
                        parent: Some(node.spec),
                    });
                }
            }
            out.push(node);
        }
        out
    }

    /// Deepest nesting level (0 when there are no sub-agents).
    pub fn depth(&self) -> usize {
        self.walk(usize::MAX).iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Check every rule on the whole tree and report all violations.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut violations = Vec::new();
        let mut first_use: HashMap<&str, String> = HashMap::new();

        for node in self.walk(usize::MAX) {
            let spec = node.spec;
            let p = &node.prefix;

            if !is_identifier(&spec.name) {
                violations.push(Violation::new(
                    format!("{p}name"),
                    format!("'{}' is not an identifier ([A-Za-z0-9_]+)", spec.name),
                ));
            } else if let Some(first) = first_use.get(spec.name.as_str()) {
                violations.push(Violation::new(
                    format!("{p}name"),
                    format!("agent name '{}' is already used at {first}name", spec.name),
                ));
            } else {
                first_use.insert(&spec.name, p.clone());
            }

            if spec.system_prompt.trim().is_empty() {
                violations.push(Violation::new(format!("{p}system_prompt"), "must not be empty"));
            }
            if spec.model_tier.trim().is_empty() {
                violations.push(Violation::new(format!("{p}model_tier"), "must not be empty"));
            }
            if !spec.temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&spec.temperature) {
                violations.push(Violation::new(
                    format!("{p}temperature"),
                    format!("{} is outside [0, {MAX_TEMPERATURE}]", spec.temperature),
                ));
            }
            if spec.max_iterations == Some(0) {
                violations.push(Violation::new(format!("{p}max_iterations"), "must be positive"));
            }
            for (i, tool) in spec.tool_names.iter().enumerate() {
                if tool.trim().is_empty() {
                    violations.push(Violation::new(format!("{p}tool_names[{i}]"), "must not be empty"));
                }
            }

            let mut exposed: HashSet<&str> = spec.tool_names.iter().map(String::as_str).collect();
            for (i, sub) in spec.subagents().iter().enumerate() {
                let sp = format!("{p}subagents[{i}]");
                if !is_identifier(&sub.tool_name) {
                    violations.push(Violation::new(
                        format!("{sp}.tool_name"),
                        format!("'{}' is not an identifier ([A-Za-z0-9_]+)", sub.tool_name),
                    ));
                } else if !exposed.insert(&sub.tool_name) {
                    violations.push(Violation::new(
                        format!("{sp}.tool_name"),
                        format!("tool name '{}' is already exposed by agent '{}'", sub.tool_name, spec.name),
                    ));
                }
                if sub.tool_description.trim().is_empty() {
                    violations.push(Violation::new(format!("{sp}.tool_description"), "must not be empty"));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(violations))
        }
    }
}

/// Builder for [`AgentSpec`]. `build()` normalizes and validates.
#[derive(Debug, Clone)]
pub struct AgentSpecBuilder {
    spec: AgentSpec,
}

impl AgentSpecBuilder {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = description.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.spec.temperature = temperature;
        self
    }

    pub fn with_tool(mut self, name: impl Into<String>) -> Self {
        self.spec.tool_names.push(name.into());
        self
    }

    pub fn with_tools<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.tool_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_subagent(
        mut self,
        tool_name: impl Into<String>,
        tool_description: impl Into<String>,
        agent: AgentSpec,
    ) -> Self {
        self.spec.subagents.get_or_insert_with(Vec::new).push(SubAgentSpec {
            tool_name: tool_name.into(),
            tool_description: tool_description.into(),
            agent,
        });
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.spec.version = version.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.spec.max_iterations = Some(max_iterations);
        self
    }

    pub fn build(self) -> Result<AgentSpec, ValidationErrors> {
        self.spec.finish()
    }

    /// Return the spec without validating it. Lets callers hand invalid
    /// trees to code that must reject them.
    pub fn build_unchecked(self) -> AgentSpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> AgentSpec {
        AgentSpec::builder(name, "You research things.", "flash").build().unwrap()
    }

    #[test]
    fn parse_applies_defaults() {
        let spec = AgentSpec::parse(
            r#"{"name":"helper","system_prompt":"Be helpful.","model_tier":"pro"}"#,
        )
        .unwrap();
        assert_eq!(spec.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(spec.version, "1.0");
        assert!(spec.tool_names.is_empty());
        assert!(spec.subagents.is_none());
        assert!(spec.max_iterations.is_none());
    }

    #[test]
    fn parse_accepts_legacy_keys() {
        let spec = AgentSpec::parse(
            r#"{"name":"helper","description":"d","system_prompt":"p","model":"flash","tools":["calculator"]}"#,
        )
        .unwrap();
        assert_eq!(spec.model_tier, "flash");
        assert_eq!(spec.tool_names, vec!["calculator"]);

        let json = spec.to_json_pretty().unwrap();
        assert!(json.contains("\"model_tier\""));
        assert!(json.contains("\"tool_names\""));
    }

    #[test]
    fn duplicate_tools_collapse_keeping_first() {
        let spec = AgentSpec::builder("a", "p", "pro")
            .with_tools(["search", "calculator", "search"])
            .build()
            .unwrap();
        assert_eq!(spec.tool_names, vec!["search", "calculator"]);
    }

    #[test]
    fn validation_reports_every_violation_with_paths() {
        let child = AgentSpec::builder("bad name", "", "flash")
            .with_temperature(3.5)
            .build_unchecked();
        let err = AgentSpec::builder("root", "p", "pro")
            .with_max_iterations(0)
            .with_subagent("helper", "", child)
            .build()
            .unwrap_err();

        assert!(err.has_path("max_iterations"));
        assert!(err.has_path("subagents[0].tool_description"));
        assert!(err.has_path("subagents[0].agent.name"));
        assert!(err.has_path("subagents[0].agent.system_prompt"));
        assert!(err.has_path("subagents[0].agent.temperature"));
        assert_eq!(err.violations().len(), 5);
    }

    #[test]
    fn temperature_bounds_are_inclusive() {
        for t in [0.0, 2.0] {
            assert!(AgentSpec::builder("a", "p", "pro").with_temperature(t).build().is_ok());
        }
        for t in [-0.1, 2.01, f64::NAN, f64::INFINITY] {
            let err = AgentSpec::builder("a", "p", "pro").with_temperature(t).build().unwrap_err();
            assert!(err.has_path("temperature"));
        }
    }

    #[test]
    fn names_must_be_unique_across_the_tree() {
        let grandchild = leaf("researcher");
        let child = AgentSpec::builder("writer", "p", "flash")
            .with_subagent("deep_research", "Digs deeper", grandchild)
            .build()
            .unwrap();
        let err = AgentSpec::builder("root", "p", "pro")
            .with_subagent("research", "Researches", leaf("researcher"))
            .with_subagent("write", "Writes", child)
            .build()
            .unwrap_err();
        assert!(err.has_path("subagents[1].agent.subagents[0].agent.name"));
        assert!(err.to_string().contains("already used at subagents[0].agent.name"));
    }

    #[test]
    fn exposed_names_must_not_collide() {
        let err = AgentSpec::builder("root", "p", "pro")
            .with_tool("research")
            .with_subagent("research", "Researches", leaf("researcher"))
            .build()
            .unwrap_err();
        assert!(err.has_path("subagents[0].tool_name"));
    }

    #[test]
    fn exposed_tool_names_lists_tools_then_subagents() {
        let spec = AgentSpec::builder("root", "p", "pro")
            .with_tools(["calculator"])
            .with_subagent("research", "Researches", leaf("researcher"))
            .build()
            .unwrap();
        assert_eq!(spec.exposed_tool_names(), vec!["calculator", "research"]);
    }

    #[test]
    fn walk_is_preorder_and_depth_limited() {
        let mid = AgentSpec::builder("mid", "p", "pro")
            .with_subagent("leaf_tool", "Leaf", leaf("leaf"))
            .build()
            .unwrap();
        let root = AgentSpec::builder("root", "p", "pro")
            .with_subagent("mid_tool", "Mid", mid)
            .with_subagent("other_tool", "Other", leaf("other"))
            .build()
            .unwrap();

        let names: Vec<_> = root.walk(usize::MAX).iter().map(|n| n.spec.name.clone()).collect();
        assert_eq!(names, vec!["root", "mid", "leaf", "other"]);
        assert_eq!(root.depth(), 2);
        assert_eq!(root.walk(1).len(), 3);
    }

    #[test]
    fn round_trip_preserves_spec() {
        let spec = AgentSpec::builder("root", "Plan trips.", "pro")
            .with_description("Trip planner")
            .with_tools(["calculator"])
            .with_subagent("research", "Researches", leaf("researcher"))
            .with_max_iterations(10)
            .build()
            .unwrap();
        let parsed = AgentSpec::parse(&spec.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = AgentSpec::parse(r#"{"name": 3}"#).unwrap_err();
        assert!(matches!(err, SpecError::Parse(_)));
    }
}
