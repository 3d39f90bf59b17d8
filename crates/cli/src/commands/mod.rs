pub mod design;
pub mod init;
pub mod run;
pub mod serve;
pub mod tools;
pub mod validate;

use std::path::Path;

use anyhow::Context;
use foundry_config::AppConfig;
use foundry_core::spec::AgentSpec;
use foundry_core::tool::ToolRegistry;

pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    AppConfig::load().context("Failed to load config")
}

/// The process-wide registry with the built-in tools registered.
pub(crate) fn registry() -> ToolRegistry {
    let registry = ToolRegistry::global().clone();
    foundry_tools::register_builtin(&registry);
    registry
}

pub(crate) fn read_spec(path: &Path) -> anyhow::Result<AgentSpec> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    AgentSpec::parse(&text).with_context(|| format!("Invalid spec in {}", path.display()))
}
