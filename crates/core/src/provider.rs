//! Provider trait — the abstraction over LLM backends — and model-tier
//! resolution.
//!
//! Agent specs never name a concrete model. They carry a symbolic tier
//! (`"pro"`, `"flash"`, ...) which a [`ModelResolver`] maps to a provider and
//! a model id when the spec is assembled.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{Message, MessageToolCall};

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The concrete model id (e.g., "gpt-5.2")
    pub model: String,

    /// The conversation messages, system prompt first
    pub messages: Vec<Message>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Completed tool calls (providers accumulate argument fragments)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The graph loop calls `stream()`
/// without knowing which provider is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Send a request and get a stream of response chunks.
    ///
    /// Default implementation calls `complete()` and wraps the result as a single chunk.
    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>,
        ProviderError,
    > {
        let response = self.complete(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                content: Some(response.message.content),
                tool_calls: response.message.tool_calls,
                done: true,
                usage: response.usage,
            }))
            .await;
        Ok(rx)
    }
}

/// A provider bound to one concrete model id.
#[derive(Clone)]
pub struct ModelHandle {
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

/// Maps a symbolic model tier to a concrete model handle.
pub trait ModelResolver: Send + Sync {
    /// Resolve a tier, or `None` when the tier is not mapped.
    fn resolve(&self, tier: &str) -> Option<ModelHandle>;

    /// All tiers this resolver knows, for diagnostics.
    fn tiers(&self) -> Vec<String>;
}

/// A fixed tier table over a single provider.
#[derive(Clone)]
pub struct TierResolver {
    provider: Arc<dyn Provider>,
    tiers: BTreeMap<String, String>,
}

impl TierResolver {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            tiers: BTreeMap::new(),
        }
    }

    /// Map `tier` to `model`. Later calls for the same tier replace earlier ones.
    pub fn with_tier(mut self, tier: impl Into<String>, model: impl Into<String>) -> Self {
        self.tiers.insert(tier.into(), model.into());
        self
    }
}

impl ModelResolver for TierResolver {
    fn resolve(&self, tier: &str) -> Option<ModelHandle> {
        self.tiers.get(tier).map(|model| ModelHandle {
            provider: Arc::clone(&self.provider),
            model: model.clone(),
        })
    }

    fn tiers(&self) -> Vec<String> {
        self.tiers.keys().cloned().collect()
    }
}
