//! `foundry validate` — Check a spec document.
//!
//! Reports every rule violation, then assembles the spec against the
//! built-in tools and configured tiers without running it.

use std::path::Path;

use anyhow::{Context, bail};
use foundry_core::error::SpecError;
use foundry_core::spec::AgentSpec;

pub fn run(path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let spec = match AgentSpec::parse(&text) {
        Ok(spec) => spec,
        Err(SpecError::Invalid(errors)) => {
            for violation in errors.violations() {
                println!("  {}: {}", violation.path, violation.message);
            }
            bail!("{} has {} violation(s)", path.display(), errors.violations().len());
        }
        Err(e) => bail!("{}: {e}", path.display()),
    };

    let config = super::load_config()?;
    let runtime = foundry_gateway::build_runtime(&config);
    let graph = runtime
        .assembler()
        .assemble(&spec, &super::registry().get_all())
        .with_context(|| format!("{} does not assemble", path.display()))?;

    println!("{} is valid", path.display());
    println!("   Agent:     {} ({} tier)", spec.name, spec.model_tier);
    println!("   Tools:     {}", graph.tool_names().join(", "));
    println!("   Depth:     {}", spec.depth());
    Ok(())
}
