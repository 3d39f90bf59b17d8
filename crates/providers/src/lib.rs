//! LLM provider implementations for the agent foundry.
//!
//! All providers implement the `foundry_core::Provider` trait.
//! [`build_resolver`] turns the configured tier table into the
//! `ModelResolver` the assembler uses.

pub mod openai_compat;

use std::sync::Arc;

use foundry_config::AppConfig;
use foundry_core::provider::TierResolver;

pub use openai_compat::OpenAiCompatProvider;

/// Build the tier resolver described by `config`.
///
/// Every configured tier maps onto the single configured provider.
pub fn build_resolver(config: &AppConfig) -> TierResolver {
    let provider = OpenAiCompatProvider::new(
        &config.provider.name,
        &config.provider.base_url,
        config.provider.api_key.clone().unwrap_or_default(),
    );
    let mut resolver = TierResolver::new(Arc::new(provider));
    for (tier, model) in config.models.tiers() {
        tracing::debug!(tier = %tier, model = %model, "Mapping model tier");
        resolver = resolver.with_tier(tier, model);
    }
    resolver
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundry_core::provider::ModelResolver;

    #[test]
    fn resolver_follows_config_tiers() {
        let mut config = AppConfig::default();
        config.models.extra.insert("local".into(), "llama3".into());
        let resolver = build_resolver(&config);

        assert_eq!(resolver.resolve("pro").unwrap().model, "gpt-5.2");
        assert_eq!(resolver.resolve("flash").unwrap().model, "gpt-5-mini");
        assert_eq!(resolver.resolve("local").unwrap().model, "llama3");
        assert_eq!(resolver.resolve("pro").unwrap().provider.name(), "openai");
        assert!(resolver.resolve("ultra").is_none());
    }
}
