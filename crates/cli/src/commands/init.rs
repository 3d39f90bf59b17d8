//! `foundry init` — Write a default config file.

use anyhow::{Context, bail};
use foundry_config::AppConfig;

pub fn run(force: bool) -> anyhow::Result<()> {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    std::fs::write(&path, AppConfig::default_toml()).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote {}", path.display());
    println!("Set FOUNDRY_API_KEY or OPENAI_API_KEY, or add provider.api_key to the file.");
    Ok(())
}
