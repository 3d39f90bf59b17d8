//! HTTP gateway for the agent foundry.
//!
//! Serves the tool catalogue, spec validation, and two streaming endpoints
//! in the AG-UI style: one runs a submitted spec, the other talks to the
//! elicitation engine. Streams are Server-Sent Events whose `event:` is the
//! event type and whose `data:` is the event JSON.
//!
//! Built on Axum. A client that disconnects drops the SSE body, which
//! cancels the run behind it.

pub mod agui;
pub mod api_v1;

use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, routing::get};
use foundry_agent::{AssemblyOptions, CheckpointPolicy, ElicitationEngine, ElicitationError, Runtime};
use foundry_config::AppConfig;
use foundry_core::checkpoint::CheckpointStore;
use foundry_core::spec::Violation;
use foundry_core::tool::ToolRegistry;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub runtime: Runtime,
    pub registry: ToolRegistry,
    pub checkpoint: Arc<dyn CheckpointStore>,
    pub elicitation: ElicitationEngine,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Wire up the gateway. The elicitation engine captures the registry's
    /// catalogue here.
    pub fn new(
        runtime: Runtime,
        registry: ToolRegistry,
        checkpoint: Arc<dyn CheckpointStore>,
        elicitation_tier: &str,
    ) -> Result<Self, ElicitationError> {
        let elicitation = ElicitationEngine::new(&runtime, &registry, elicitation_tier, Some(Arc::clone(&checkpoint)))?;
        Ok(Self {
            runtime,
            registry,
            checkpoint,
            elicitation,
        })
    }

    /// State for `config`, with the built-in tools registered on the
    /// process-wide registry.
    pub fn from_config(config: &AppConfig) -> Result<Self, ElicitationError> {
        let registry = ToolRegistry::global().clone();
        foundry_tools::register_builtin(&registry);
        Self::new(
            build_runtime(config),
            registry,
            foundry_checkpoint::from_config(&config.checkpoint),
            &config.elicitation.model_tier,
        )
    }
}

/// A runtime for the configured provider, tiers, and assembly limits.
pub fn build_runtime(config: &AppConfig) -> Runtime {
    let resolver = Arc::new(foundry_providers::build_resolver(config));
    let policy = if config.checkpoint.required {
        CheckpointPolicy::Required
    } else {
        CheckpointPolicy::BestEffort
    };
    Runtime::new(resolver)
        .with_options(AssemblyOptions {
            max_depth: config.assembly.max_depth,
            default_max_iterations: config.assembly.default_max_iterations,
        })
        .with_checkpoint_policy(policy)
}

/// Error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Violation>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn unprocessable(kind: &str, error: impl Into<String>, errors: Vec<Violation>) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: error.into(),
            kind: kind.into(),
            errors,
        }),
    )
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router())
        .nest("/agui", agui::agui_router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    if !config.has_api_key() {
        warn!("No API key configured; model calls will fail until one is set");
    }

    let state = Arc::new(GatewayState::from_config(&config)?);
    info!(
        tools = state.registry.len(),
        checkpoint = state.checkpoint.name(),
        "Gateway state ready"
    );

    let app = build_router(state);
    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(gateway(vec![]).state);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn runtime_follows_config() {
        let mut config = AppConfig::default();
        config.assembly.max_depth = 2;
        config.checkpoint.required = true;
        let runtime = build_runtime(&config);
        assert_eq!(runtime.assembler().options().max_depth, 2);
        assert_eq!(runtime.checkpoint_policy(), CheckpointPolicy::Required);
        assert!(runtime.assembler().resolver().resolve("flash").is_some());
    }
}
