//! HTTP API v1: catalogue and spec validation.
//!
//! Endpoints:
//!
//! - `GET  /v1/tools`           — Registered tools, sorted by name
//! - `POST /v1/specs/validate`  — Check a spec document without running it

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use foundry_core::error::SpecError;
use foundry_core::spec::{AgentSpec, Violation};
use foundry_core::tool::ToolCatalogItem;
use serde::Serialize;
use tracing::debug;

use crate::SharedState;

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router() -> Router<SharedState> {
    Router::new()
        .route("/tools", get(list_tools_handler))
        .route("/specs/validate", post(validate_spec_handler))
}

#[derive(Debug, Serialize)]
struct ToolListResponse {
    tools: Vec<ToolCatalogItem>,
    count: usize,
}

/// `GET /v1/tools`
async fn list_tools_handler(State(state): State<SharedState>) -> Json<ToolListResponse> {
    let tools = state.registry.catalog();
    Json(ToolListResponse {
        count: tools.len(),
        tools,
    })
}

#[derive(Debug, Serialize)]
struct ValidationResponse {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec: Option<AgentSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<Violation>,
}

/// `POST /v1/specs/validate`: 200 with the normalized spec, or 422 with
/// every violation.
async fn validate_spec_handler(Json(document): Json<serde_json::Value>) -> (StatusCode, Json<ValidationResponse>) {
    match AgentSpec::from_value(document) {
        Ok(spec) => {
            debug!(agent = %spec.name, "Spec is valid");
            (
                StatusCode::OK,
                Json(ValidationResponse {
                    valid: true,
                    spec: Some(spec),
                    errors: Vec::new(),
                }),
            )
        }
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationResponse {
                valid: false,
                spec: None,
                errors: violations(e),
            }),
        ),
    }
}

/// Flatten a spec error into field-level violations. Parse errors have no
/// field path.
pub(crate) fn violations(error: SpecError) -> Vec<Violation> {
    match error {
        SpecError::Invalid(errors) => errors.0,
        SpecError::Parse(e) => vec![Violation::new("", e.to_string())],
    }
}
