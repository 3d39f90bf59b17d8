//! End-to-end tests for the agent foundry.
//!
//! These exercise the whole pipeline: spec documents in, assembly against
//! the built-in tools, streamed runs with sub-agent delegation, file
//! checkpoints, and elicitation output fed back into the runtime.

use std::sync::Arc;
use std::time::Duration;

use foundry_agent::test_helpers::*;
use foundry_agent::{
    AgentStreamEvent, CancellationToken, ElicitationEngine, ElicitationOutcome, RunRequest, Runtime,
};
use foundry_checkpoint::FileCheckpointStore;
use foundry_core::CheckpointStore;
use foundry_core::spec::AgentSpec;
use foundry_core::tool::ToolRegistry;
use futures::StreamExt;

const MATH_TEAM: &str = r#"{
    "name": "lead",
    "description": "Answers questions, delegating arithmetic",
    "system_prompt": "You answer questions. Delegate arithmetic to the math specialist.",
    "model_tier": "pro",
    "subagents": [{
        "tool_name": "math",
        "tool_description": "Solves arithmetic problems",
        "agent": {
            "name": "mathematician",
            "system_prompt": "You solve arithmetic with the calculator.",
            "model": "flash",
            "temperature": 0.1,
            "tools": ["calculator"]
        }
    }]
}"#;

fn builtin_registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    foundry_tools::register_builtin(&registry);
    registry
}

#[tokio::test]
async fn spec_document_runs_with_delegation_and_checkpoints() {
    // Responses are consumed in call order: lead, mathematician, mathematician, lead.
    let provider = Arc::new(SequentialMockProvider::new(vec![
        make_tool_call_response(
            vec![make_tool_call("math", serde_json::json!({"task": "Compute 25 * 4 + 10"}))],
            "",
        ),
        make_tool_call_response(
            vec![make_tool_call("calculator", serde_json::json!({"expression": "25 * 4 + 10"}))],
            "",
        ),
        make_text_response("110"),
        make_text_response("The answer is 110."),
    ]));
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCheckpointStore::new(dir.path()));

    let spec = AgentSpec::parse(MATH_TEAM).unwrap();
    let agent = Runtime::new(mock_resolver(provider.clone()))
        .build(&spec, &builtin_registry().get_all(), Some(store.clone()))
        .unwrap();
    assert_eq!(agent.graph().tool_names(), vec!["math"]);

    let events: Vec<_> = agent
        .stream(
            RunRequest::user("What is 25 * 4 + 10?").with_session("math-1"),
            CancellationToken::new(),
        )
        .collect()
        .await;

    let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec![
            "run_started",
            "tool_call_started",
            "subagent_delegated",
            "tool_call_result",
            "text_delta",
            "run_finished"
        ]
    );
    match &events[3] {
        AgentStreamEvent::ToolCallResult { name, result, .. } => {
            assert_eq!(name, "math");
            assert_eq!(result.as_deref(), Some("110"));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // The mathematician saw only its task and called the real calculator.
    let requests = provider.requests();
    assert_eq!(requests[1].model, "mock-flash");
    assert_eq!(requests[1].messages.len(), 2);
    assert_eq!(requests[1].messages[1].content, "Compute 25 * 4 + 10");
    let calc_result = requests[2].messages.iter().find(|m| m.tool_call_id.is_some()).unwrap();
    assert_eq!(calc_result.content, "110");

    let saved = store.load("math-1").await.unwrap();
    assert_eq!(saved.agent, "lead");
    assert_eq!(saved.messages.last().unwrap().content, "The answer is 110.");
    assert!(dir.path().join("math-1.json").exists());
}

#[tokio::test]
async fn elicited_spec_assembles_and_runs() {
    let save = make_tool_call(
        "save_agent_spec",
        serde_json::json!({
            "name": "calc_helper",
            "description": "Does sums",
            "system_prompt": "You do arithmetic with the calculator.",
            "model_tier": "flash",
            "temperature": 0.2,
            "tool_names": ["calculator"]
        }),
    );
    let provider = Arc::new(SequentialMockProvider::new(vec![
        make_tool_call_response(vec![save], ""),
        make_tool_call_response(
            vec![make_tool_call("calculator", serde_json::json!({"expression": "2 ^ 10"}))],
            "",
        ),
        make_text_response("1024"),
    ]));
    let registry = builtin_registry();
    let runtime = Runtime::new(mock_resolver(provider.clone()));

    let engine = ElicitationEngine::new(&runtime, &registry, "pro", None).unwrap();
    let outcome = engine
        .turn(RunRequest::user("An agent that does arithmetic with the calculator, flash tier"))
        .await
        .unwrap();
    let ElicitationOutcome::Finalized { spec } = outcome else {
        panic!("expected a finalized spec, got {outcome:?}");
    };

    // Round-trip through the document form before running it.
    let spec = AgentSpec::parse(&spec.to_json_pretty().unwrap()).unwrap();
    let agent = runtime.build(&spec, &registry.get_all(), None).unwrap();
    let state = agent.invoke(RunRequest::user("What is 2 ^ 10?")).await.unwrap();
    assert_eq!(state.output.as_deref(), Some("1024"));
    assert_eq!(state.tool_calls_made, 1);
}

#[tokio::test]
async fn cancelled_run_leaves_no_checkpoint() {
    let provider = Arc::new(SequentialMockProvider::new(vec![
        make_tool_call_response(vec![make_tool_call("slow", serde_json::json!({}))], ""),
        make_text_response("never"),
    ]));
    let registry = builtin_registry();
    registry.register(Arc::new(SlowTool));
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCheckpointStore::new(dir.path()));

    let spec = AgentSpec::builder("waiter", "You wait.", "flash")
        .with_tool("slow")
        .build()
        .unwrap();
    let agent = Runtime::new(mock_resolver(provider))
        .build(&spec, &registry.get_all(), Some(store.clone()))
        .unwrap();

    let mut stream = agent.stream(RunRequest::user("wait").with_session("w1"), CancellationToken::new());
    while let Some(event) = stream.next().await {
        if matches!(event, AgentStreamEvent::ToolCallStarted { .. }) {
            break;
        }
    }
    drop(stream);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(store.load("w1").await.is_err());
    assert_eq!(std::fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0), 0);
}
