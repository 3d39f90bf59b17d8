//! AG-UI style streaming endpoints.
//!
//! - `POST /agui/runtime/run`  — Run a submitted spec, stream its events
//! - `GET  /agui/runtime/run`  — Same, with the body URL-encoded in `?payload=`
//!                               for EventSource clients
//! - `POST /agui/master/run`   — One turn with the elicitation engine
//!
//! Bad input is rejected with 422 before any stream starts. Once a stream
//! is open, failures arrive as `run_error` events.

use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::sse::{Event as SseEvent, KeepAlive, KeepAliveStream, Sse},
    routing::post,
};
use foundry_agent::{AssemblyError, CancellationToken, RunRequest, RunStream};
use foundry_core::message::Message;
use foundry_core::spec::AgentSpec;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::info;

use crate::{ApiError, SharedState, api_v1, unprocessable};

/// Build the AG-UI router. Nest this under "/agui" in the main router.
pub fn agui_router() -> Router<SharedState> {
    Router::new()
        .route("/runtime/run", post(runtime_run_handler).get(runtime_run_get_handler))
        .route("/master/run", post(master_run_handler))
}

#[derive(Debug, Deserialize)]
pub struct RuntimeRunRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    /// Checkpoint key; omit for a stateless run
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub agent_spec: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PayloadQuery {
    payload: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatUserMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct MasterRunRequest {
    /// Session to continue; omit to start a new one
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
    pub message: ChatUserMessage,
}

type EventStream =
    Sse<KeepAliveStream<std::pin::Pin<Box<dyn Stream<Item = Result<SseEvent, Infallible>> + Send>>>>;

/// Encode a run as SSE. Dropping the response body drops the run stream,
/// which cancels the run.
fn sse(run: RunStream) -> EventStream {
    let events = run.map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event.event_type()).data(data))
    });
    Sse::new(events.boxed()).keep_alive(KeepAlive::default())
}

/// `POST /agui/runtime/run`
async fn runtime_run_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RuntimeRunRequest>,
) -> Result<EventStream, ApiError> {
    start_runtime_run(&state, payload)
}

/// `GET /agui/runtime/run?payload=<url-encoded JSON>`
async fn runtime_run_get_handler(
    State(state): State<SharedState>,
    Query(query): Query<PayloadQuery>,
) -> Result<EventStream, ApiError> {
    let payload: RuntimeRunRequest = serde_json::from_str(&query.payload)
        .map_err(|e| unprocessable("invalid_payload", format!("Invalid payload JSON: {e}"), Vec::new()))?;
    start_runtime_run(&state, payload)
}

fn start_runtime_run(state: &SharedState, payload: RuntimeRunRequest) -> Result<EventStream, ApiError> {
    let document = payload
        .agent_spec
        .ok_or_else(|| unprocessable("validation", "agent_spec is required", Vec::new()))?;
    let spec = AgentSpec::from_value(document)
        .map_err(|e| unprocessable("validation", "agent_spec is invalid", api_v1::violations(e)))?;

    let agent = state
        .runtime
        .build(&spec, &state.registry.get_all(), Some(state.checkpoint.clone()))
        .map_err(assembly_rejection)?;

    let mut request = RunRequest::new(payload.messages);
    request.session_id = payload.session_id;
    request.run_id = payload.run_id;
    request.thread_id = payload.thread_id;

    info!(agent = %spec.name, session = ?request.session_id, "Runtime run starting");
    Ok(sse(agent.stream(request, CancellationToken::new())))
}

fn assembly_rejection(error: AssemblyError) -> ApiError {
    let kind = error.kind();
    let message = error.to_string();
    let errors = match error {
        AssemblyError::Validation(errors) => errors.0,
        _ => Vec::new(),
    };
    unprocessable(kind, message, errors)
}

/// `POST /agui/master/run`
async fn master_run_handler(
    State(state): State<SharedState>,
    Json(payload): Json<MasterRunRequest>,
) -> Result<EventStream, ApiError> {
    if payload.message.content.trim().is_empty() {
        return Err(unprocessable("validation", "message.content must not be empty", Vec::new()));
    }

    let mut request = RunRequest::user(payload.message.content);
    request.session_id = payload.session_id;
    request.run_id = payload.message.id;

    info!(session = ?request.session_id, "Elicitation turn starting");
    Ok(sse(state.elicitation.stream(request, CancellationToken::new())))
}

#[cfg(test)]
mod tests {
    use crate::build_router;
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use foundry_agent::test_helpers::*;
    use foundry_core::CheckpointStore;
    use tower::ServiceExt;

    fn helper_spec(tools: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "name": "helper",
            "system_prompt": "You help.",
            "model_tier": "flash",
            "tool_names": tools
        })
    }

    fn percent_encode(raw: &str) -> String {
        raw.bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
                _ => format!("%{b:02X}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn runtime_run_streams_events() {
        let gw = gateway(vec![
            make_tool_call_response(vec![make_tool_call("echo", serde_json::json!({"text": "ping"}))], ""),
            make_text_response("pong"),
        ]);
        let app = build_router(gw.state.clone());
        let body = serde_json::json!({
            "run_id": "run_42",
            "messages": [{"role": "user", "content": "ping please"}],
            "agent_spec": helper_spec(&["echo"])
        });

        let response = app
            .oneshot(json_request("POST", "/agui/runtime/run", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "text/event-stream"
        );

        let text = body_text(response).await;
        assert_eq!(
            sse_event_names(&text),
            vec!["run_started", "tool_call_started", "tool_call_result", "text_delta", "run_finished"]
        );
        assert!(text.contains(r#""run_id":"run_42""#));
        assert!(text.contains("pong"));
        assert_eq!(gw.provider.call_count(), 2);
    }

    #[tokio::test]
    async fn runtime_run_checkpoints_sessions() {
        let gw = gateway(vec![make_text_response("Hello Ada")]);
        let app = build_router(gw.state.clone());
        let body = serde_json::json!({
            "session_id": "sess-1",
            "messages": [{"role": "user", "content": "I'm Ada"}],
            "agent_spec": helper_spec(&[])
        });

        let response = app
            .oneshot(json_request("POST", "/agui/runtime/run", body))
            .await
            .unwrap();
        let text = body_text(response).await;
        assert!(text.contains(r#""thread_id":"sess-1""#));

        let saved = gw.store.load("sess-1").await.unwrap();
        assert_eq!(saved.messages.len(), 2);
    }

    #[tokio::test]
    async fn runtime_run_rejects_bad_specs_before_streaming() {
        let gw = gateway(vec![]);

        let response = build_router(gw.state.clone())
            .oneshot(json_request(
                "POST",
                "/agui/runtime/run",
                serde_json::json!({"messages": [], "agent_spec": {"name": "x y", "system_prompt": "", "model_tier": "pro"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["kind"], "validation");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);

        let response = build_router(gw.state.clone())
            .oneshot(json_request(
                "POST",
                "/agui/runtime/run",
                serde_json::json!({"messages": [], "agent_spec": helper_spec(&["web_search"])}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["kind"], "unresolved_tool");
        assert!(body["error"].as_str().unwrap().contains("web_search"));

        let response = build_router(gw.state.clone())
            .oneshot(json_request("POST", "/agui/runtime/run", serde_json::json!({"messages": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(gw.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn runtime_run_get_accepts_encoded_payload() {
        let gw = gateway(vec![make_text_response("Hi there")]);
        let payload = serde_json::json!({
            "messages": [{"role": "user", "content": "Hello"}],
            "agent_spec": helper_spec(&[])
        });
        let uri = format!("/agui/runtime/run?payload={}", percent_encode(&payload.to_string()));

        let response = build_router(gw.state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert_eq!(sse_event_names(&text).last().unwrap(), "run_finished");

        let response = build_router(gw.state.clone())
            .oneshot(
                Request::builder()
                    .uri("/agui/runtime/run?payload=not-json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn master_run_streams_the_elicitation_outcome() {
        let ask = make_tool_call(
            "ask_clarifying_questions",
            serde_json::json!({"questions": [{"question": "Which units?", "suggested_answers": ["Celsius", "Fahrenheit"]}]}),
        );
        let gw = gateway(vec![make_tool_call_response(vec![ask], "")]);
        let body = serde_json::json!({
            "sessionId": "design-1",
            "message": {"id": "run_msg_1", "content": "I want a weather bot"}
        });

        let response = build_router(gw.state.clone())
            .oneshot(json_request("POST", "/agui/master/run", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert_eq!(
            sse_event_names(&text),
            vec!["run_started", "tool_call_started", "tool_call_result", "elicitation", "run_finished"]
        );
        assert!(text.contains(r#""type":"clarification""#));
        assert!(text.contains(r#""run_id":"run_msg_1""#));
        assert!(gw.store.load("design-1").await.is_ok());
    }

    #[tokio::test]
    async fn master_run_refuses_finalized_sessions() {
        let save = make_tool_call(
            "save_agent_spec",
            serde_json::json!({"name": "echoer", "system_prompt": "You echo.", "model_tier": "flash", "tool_names": ["echo"]}),
        );
        let gw = gateway(vec![make_tool_call_response(vec![save], "")]);
        let body = |content: &str| {
            serde_json::json!({"sessionId": "design-2", "message": {"content": content}})
        };

        let response = build_router(gw.state.clone())
            .oneshot(json_request("POST", "/agui/master/run", body("An echo bot")))
            .await
            .unwrap();
        assert!(body_text(response).await.contains(r#""type":"finalized""#));

        let response = build_router(gw.state.clone())
            .oneshot(json_request("POST", "/agui/master/run", body("Also add search")))
            .await
            .unwrap();
        let text = body_text(response).await;
        assert_eq!(sse_event_names(&text), vec!["run_started", "run_error"]);
        assert!(text.contains(r#""kind":"already_finalized""#));
        assert_eq!(gw.provider.call_count(), 1);
    }

    #[tokio::test]
    async fn master_run_rejects_empty_messages() {
        let gw = gateway(vec![]);
        let response = build_router(gw.state.clone())
            .oneshot(json_request(
                "POST",
                "/agui/master/run",
                serde_json::json!({"message": {"content": "  "}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
