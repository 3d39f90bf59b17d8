//! Configuration loading, validation, and management for the agent foundry.
//!
//! Loads configuration from `~/.foundry/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.foundry/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model tier table
    #[serde(default)]
    pub models: ModelsConfig,

    /// LLM provider connection
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Spec assembly limits
    #[serde(default)]
    pub assembly: AssemblyConfig,

    /// Session persistence
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Supervising agent that designs specs
    #[serde(default)]
    pub elicitation: ElicitationConfig,
}

/// Symbolic tier → concrete model id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_pro_model")]
    pub pro: String,

    #[serde(default = "default_flash_model")]
    pub flash: String,

    /// Additional tiers beyond `pro` and `flash`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

fn default_pro_model() -> String {
    "gpt-5.2".into()
}
fn default_flash_model() -> String {
    "gpt-5-mini".into()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            pro: default_pro_model(),
            flash: default_flash_model(),
            extra: BTreeMap::new(),
        }
    }
}

impl ModelsConfig {
    /// Every configured tier, including `pro` and `flash`.
    pub fn tiers(&self) -> BTreeMap<String, String> {
        let mut tiers = self.extra.clone();
        tiers.insert("pro".into(), self.pro.clone());
        tiers.insert("flash".into(), self.flash.clone());
        tiers
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_name")]
    pub name: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Deepest allowed sub-agent nesting (root is depth 0)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Iteration bound for specs that leave `max_iterations` unset
    #[serde(default = "default_max_iterations")]
    pub default_max_iterations: u32,
}

fn default_max_depth() -> usize {
    5
}
fn default_max_iterations() -> u32 {
    25
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            default_max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// "memory" or "file"
    #[serde(default = "default_checkpoint_backend")]
    pub backend: String,

    /// Directory for the file backend (defaults to `~/.foundry/sessions`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Abort runs whose checkpoint cannot be read or written
    #[serde(default)]
    pub required: bool,
}

fn default_checkpoint_backend() -> String {
    "memory".into()
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: default_checkpoint_backend(),
            dir: None,
            required: false,
        }
    }
}

impl CheckpointConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("sessions"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElicitationConfig {
    #[serde(default = "default_elicitation_tier")]
    pub model_tier: String,
}

fn default_elicitation_tier() -> String {
    "pro".into()
}

impl Default for ElicitationConfig {
    fn default() -> Self {
        Self {
            model_tier: default_elicitation_tier(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.foundry/config.toml),
    /// then apply environment overrides:
    /// - `FOUNDRY_API_KEY`, then `OPENAI_API_KEY` (when no key is configured)
    /// - `OPENAI_BASE_URL`
    /// - `FOUNDRY_PRO_MODEL`, `FOUNDRY_FLASH_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if self.provider.api_key.is_none() {
            self.provider.api_key = env("FOUNDRY_API_KEY").or_else(|| env("OPENAI_API_KEY"));
        }
        if let Some(url) = env("OPENAI_BASE_URL") {
            self.provider.base_url = url;
        }
        if let Some(model) = env("FOUNDRY_PRO_MODEL") {
            self.models.pro = model;
        }
        if let Some(model) = env("FOUNDRY_FLASH_MODEL") {
            self.models.flash = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".foundry")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assembly.max_depth == 0 {
            return Err(ConfigError::ValidationError("assembly.max_depth must be >= 1".into()));
        }
        if self.assembly.default_max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "assembly.default_max_iterations must be >= 1".into(),
            ));
        }
        if let Some((tier, _)) = self.models.tiers().into_iter().find(|(_, m)| m.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "models.{tier} must name a model"
            )));
        }
        if !matches!(self.checkpoint.backend.as_str(), "memory" | "file") {
            return Err(ConfigError::ValidationError(format!(
                "checkpoint.backend must be \"memory\" or \"file\", got {:?}",
                self.checkpoint.backend
            )));
        }
        if !self.models.tiers().contains_key(&self.elicitation.model_tier) {
            return Err(ConfigError::ValidationError(format!(
                "elicitation.model_tier {:?} is not a configured tier",
                self.elicitation.model_tier
            )));
        }
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
