//! Conversational spec design.
//!
//! The elicitation engine is itself an assembled agent, the architect. It
//! talks with a user about what they want and ends every turn by calling
//! one of two internal tools, both of which end the run:
//!
//! - `ask_clarifying_questions` produces a `clarification` outcome
//! - `save_agent_spec` validates a complete spec and produces a `finalized`
//!   outcome
//!
//! The final tool output is parsed strictly and a finalized spec is checked
//! again before it is returned, since it was written by a model.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use foundry_core::checkpoint::CheckpointStore;
use foundry_core::error::ToolError;
use foundry_core::message::{Message, Role};
use foundry_core::spec::AgentSpec;
use foundry_core::tool::{Tool, ToolCatalogItem, ToolMap, ToolRegistry, ToolResult};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ElicitationError;
use crate::graph::{EventSink, RunState, RunStream};
use crate::runtime::{ExecutableAgent, RunRequest, Runtime, run_ids};
use crate::stream_event::AgentStreamEvent;

pub const ARCHITECT_NAME: &str = "agent_architect";
pub const ASK_TOOL: &str = "ask_clarifying_questions";
pub const SAVE_TOOL: &str = "save_agent_spec";

const ARCHITECT_TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    pub question: String,

    /// Options offered to the user
    #[serde(default)]
    pub suggested_answers: Vec<String>,

    /// Whether several suggested answers may be picked
    #[serde(default)]
    pub allow_multiple: bool,
}

/// The structured result of one elicitation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElicitationOutcome {
    Clarification { questions: Vec<ClarifyingQuestion> },
    Finalized { spec: AgentSpec },
}

impl ElicitationOutcome {
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ElicitationState {
    #[default]
    Gathering,
    Finalized(AgentSpec),
}

/// Render the catalogue the way the architect's prompt lists it.
pub fn format_tool_catalog(items: &[ToolCatalogItem]) -> String {
    if items.is_empty() {
        return "No tools available.".into();
    }
    items
        .iter()
        .map(|item| format!("### {}\n**Description:** {}", item.name, item.description))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn architect_prompt(catalog: &str) -> String {
    format!(
        r#"## Role
You are an AI agent architect. Through conversation you work out what the user needs and design an agent for it.

## How to work
- If anything required is unclear, call `{ASK_TOOL}` with a few focused questions and suggested answers.
- Once every field is settled, call `{SAVE_TOOL}` with the complete spec.
- Never answer in plain text. Every reply is exactly one of those two tool calls.

## Spec fields
- **name**: identifier such as `weather_assistant` (letters, digits, underscores)
- **description**: one sentence
- **system_prompt**: the agent's role, style, and limits turned into a structured prompt
- **model_tier**: "pro" by default, "flash" for simple tasks
- **temperature**: 0.7 by default, lower for precise tasks, higher for creative ones
- **tool_names**: exact names from the catalogue below, nothing else
- **subagents**: optional specialists, each with `tool_name`, `tool_description`, and a nested `agent`

## Available tools
{catalog}
"#
    )
}

/// Tool names used anywhere in `spec` that are not in `known`.
fn unknown_tools(spec: &AgentSpec, known: &BTreeSet<String>) -> Vec<String> {
    let mut unknown: Vec<String> = spec
        .walk(usize::MAX)
        .iter()
        .flat_map(|node| node.spec.tool_names.iter())
        .filter(|name| !known.contains(*name))
        .cloned()
        .collect();
    unknown.sort();
    unknown.dedup();
    unknown
}

fn encode(outcome: &ElicitationOutcome, tool: &str) -> Result<ToolResult, ToolError> {
    let output = serde_json::to_string(outcome).map_err(|e| ToolError::ExecutionFailed {
        tool_name: tool.into(),
        reason: e.to_string(),
    })?;
    Ok(ToolResult {
        output,
        data: serde_json::to_value(outcome).ok(),
    })
}

struct AskClarifyingQuestionsTool;

#[derive(Deserialize)]
struct AskArgs {
    questions: Vec<ClarifyingQuestion>,
}

#[async_trait]
impl Tool for AskClarifyingQuestionsTool {
    fn name(&self) -> &str {
        ASK_TOOL
    }

    fn description(&self) -> &str {
        "Ask the user clarifying questions to gather what is needed to design the agent. \
         Use it whenever a required field is uncertain, the right tools are unclear, or the \
         request is vague."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "questions": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": { "type": "string" },
                            "suggested_answers": { "type": "array", "items": { "type": "string" } },
                            "allow_multiple": { "type": "boolean" }
                        },
                        "required": ["question", "suggested_answers"]
                    }
                }
            },
            "required": ["questions"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: AskArgs =
            serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if args.questions.is_empty() {
            return Err(ToolError::InvalidArguments("at least one question is required".into()));
        }
        if let Some(i) = args.questions.iter().position(|q| q.question.trim().is_empty()) {
            return Err(ToolError::InvalidArguments(format!("questions[{i}].question is empty")));
        }
        encode(
            &ElicitationOutcome::Clarification {
                questions: args.questions,
            },
            ASK_TOOL,
        )
    }

    fn returns_directly(&self) -> bool {
        true
    }
}

struct SaveAgentSpecTool {
    known_tools: Arc<BTreeSet<String>>,
}

#[async_trait]
impl Tool for SaveAgentSpecTool {
    fn name(&self) -> &str {
        SAVE_TOOL
    }

    fn description(&self) -> &str {
        "Save the finished agent spec. Only call this once every field is settled."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "pattern": "^[A-Za-z0-9_]+$" },
                "description": { "type": "string" },
                "system_prompt": { "type": "string" },
                "model_tier": { "type": "string", "enum": ["pro", "flash"] },
                "temperature": { "type": "number", "minimum": 0, "maximum": 2 },
                "tool_names": { "type": "array", "items": { "type": "string" } },
                "subagents": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "tool_name": { "type": "string" },
                            "tool_description": { "type": "string" },
                            "agent": { "type": "object" }
                        },
                        "required": ["tool_name", "tool_description", "agent"]
                    }
                }
            },
            "required": ["name", "system_prompt", "model_tier"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let spec = AgentSpec::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let unknown = unknown_tools(&spec, &self.known_tools);
        if !unknown.is_empty() {
            return Err(ToolError::InvalidArguments(format!(
                "tools not in the catalogue: {}",
                unknown.join(", ")
            )));
        }
        debug!(agent = %spec.name, "Spec saved");
        encode(&ElicitationOutcome::Finalized { spec }, SAVE_TOOL)
    }

    fn returns_directly(&self) -> bool {
        true
    }
}

/// The architect agent plus the catalogue it was built against.
#[derive(Clone)]
pub struct ElicitationEngine {
    agent: ExecutableAgent,
    catalog: Vec<ToolCatalogItem>,
    known_tools: Arc<BTreeSet<String>>,
}

impl std::fmt::Debug for ElicitationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElicitationEngine")
            .field("agent", &self.agent)
            .field("catalog", &self.catalog.len())
            .finish()
    }
}

impl ElicitationEngine {
    /// Build the architect. The registry catalogue is captured now; tools
    /// registered later are not offered.
    pub fn new(
        runtime: &Runtime,
        registry: &ToolRegistry,
        model_tier: &str,
        checkpoint: Option<Arc<dyn CheckpointStore>>,
    ) -> Result<Self, ElicitationError> {
        let catalog = registry.catalog();
        let known_tools: Arc<BTreeSet<String>> = Arc::new(catalog.iter().map(|c| c.name.clone()).collect());

        let mut tools = ToolMap::new();
        tools.insert(ASK_TOOL.into(), Arc::new(AskClarifyingQuestionsTool) as Arc<dyn Tool>);
        tools.insert(
            SAVE_TOOL.into(),
            Arc::new(SaveAgentSpecTool {
                known_tools: Arc::clone(&known_tools),
            }),
        );

        let spec = AgentSpec::builder(ARCHITECT_NAME, architect_prompt(&format_tool_catalog(&catalog)), model_tier)
            .with_description("Designs agent specs through conversation")
            .with_temperature(ARCHITECT_TEMPERATURE)
            .with_tools([ASK_TOOL, SAVE_TOOL])
            .build_unchecked();
        let agent = runtime.build(&spec, &tools, checkpoint)?;

        info!(tier = model_tier, catalog = catalog.len(), "Elicitation engine ready");
        Ok(Self {
            agent,
            catalog,
            known_tools,
        })
    }

    pub fn catalog(&self) -> &[ToolCatalogItem] {
        &self.catalog
    }

    pub fn agent(&self) -> &ExecutableAgent {
        &self.agent
    }

    /// Reject a checkpointed session whose history already holds a
    /// finalized spec. Load failures are left to the run itself.
    pub async fn ensure_open(&self, session_id: Option<&str>) -> Result<(), ElicitationError> {
        let (Some(store), Some(session_id)) = (self.agent.checkpoint(), session_id) else {
            return Ok(());
        };
        match store.load(session_id).await {
            Ok(saved) if finalized_in(&saved.messages) => {
                debug!(session = %session_id, "Turn on a finalized session rejected");
                Err(ElicitationError::AlreadyFinalized)
            }
            _ => Ok(()),
        }
    }

    /// One turn, returning the outcome and the run's final state.
    pub async fn run_turn(&self, request: RunRequest) -> Result<(ElicitationOutcome, RunState), ElicitationError> {
        self.ensure_open(request.session_id.as_deref()).await?;
        let state = self.agent.invoke(request).await?;
        let outcome = self.classify(&state)?;
        Ok((outcome, state))
    }

    pub async fn turn(&self, request: RunRequest) -> Result<ElicitationOutcome, ElicitationError> {
        self.run_turn(request).await.map(|(outcome, _)| outcome)
    }

    /// Read the outcome of a finished run.
    pub fn classify(&self, state: &RunState) -> Result<ElicitationOutcome, ElicitationError> {
        let text = state.output.clone().unwrap_or_default();
        let Some(tool) = state.ended_by_tool.as_deref() else {
            return Err(ElicitationError::Unclassified { text });
        };

        let outcome: ElicitationOutcome =
            serde_json::from_str(&text).map_err(|e| ElicitationError::InvalidOutcome(e.to_string()))?;

        match (&outcome, tool) {
            (ElicitationOutcome::Clarification { questions }, ASK_TOOL) => {
                if questions.is_empty() {
                    return Err(ElicitationError::InvalidOutcome("no questions asked".into()));
                }
            }
            (ElicitationOutcome::Finalized { spec }, SAVE_TOOL) => {
                spec.validate()
                    .map_err(|e| ElicitationError::InvalidOutcome(e.to_string()))?;
                let unknown = unknown_tools(spec, &self.known_tools);
                if !unknown.is_empty() {
                    return Err(ElicitationError::InvalidOutcome(format!(
                        "spec uses tools outside the catalogue: {}",
                        unknown.join(", ")
                    )));
                }
            }
            (_, other) => {
                return Err(ElicitationError::InvalidOutcome(format!(
                    "unexpected outcome from tool '{other}'"
                )));
            }
        }
        Ok(outcome)
    }

    /// Stream one turn. An `elicitation` event carrying the outcome comes
    /// just before `run_finished`; a turn that cannot be classified ends
    /// with `run_error`.
    pub fn stream(&self, request: RunRequest, cancel: CancellationToken) -> RunStream {
        let engine = self.clone();
        RunStream::spawn(cancel, move |sink, cancel| async move {
            let (run_id, thread_id) = run_ids(&request);
            if sink
                .emit(AgentStreamEvent::RunStarted { run_id, thread_id })
                .await
                .is_err()
            {
                return;
            }
            if let Err(e) = engine.ensure_open(request.session_id.as_deref()).await {
                return fail(&sink, e).await;
            }

            let state = match engine
                .agent
                .execute(request.messages, request.session_id.as_deref(), &sink, &cancel)
                .await
            {
                Ok(state) => state,
                Err(e) => return sink.finish(Err(e)).await,
            };

            match engine.classify(&state) {
                Ok(outcome) => {
                    if sink.emit(AgentStreamEvent::Elicitation { outcome }).await.is_ok() {
                        sink.finish(Ok(state)).await;
                    }
                }
                Err(e) => fail(&sink, e).await,
            }
        })
    }
}

async fn fail(sink: &EventSink, error: ElicitationError) {
    let _ = sink
        .emit(AgentStreamEvent::RunError {
            kind: error.kind().to_string(),
            message: error.to_string(),
        })
        .await;
}

/// Whether `history` contains a successful `save_agent_spec` result.
fn finalized_in(history: &[Message]) -> bool {
    history.iter().any(|m| {
        m.role == Role::Tool
            && matches!(
                serde_json::from_str::<ElicitationOutcome>(&m.content),
                Ok(ElicitationOutcome::Finalized { .. })
            )
    })
}

/// A conversation with the architect, held in memory.
#[derive(Debug)]
pub struct ElicitationSession {
    engine: ElicitationEngine,
    state: ElicitationState,
    history: Vec<Message>,
}

impl ElicitationSession {
    pub fn new(engine: ElicitationEngine) -> Self {
        Self {
            engine,
            state: ElicitationState::Gathering,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> &ElicitationState {
        &self.state
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Send the user's next message. Fails once a spec has been finalized.
    pub async fn respond(&mut self, text: impl Into<String>) -> Result<ElicitationOutcome, ElicitationError> {
        if matches!(self.state, ElicitationState::Finalized(_)) {
            return Err(ElicitationError::AlreadyFinalized);
        }
        let mut messages = self.history.clone();
        messages.push(Message::user(text));

        let (outcome, state) = self.engine.run_turn(RunRequest::new(messages)).await?;
        self.history = state.messages;
        if let ElicitationOutcome::Finalized { spec } = &outcome {
            self.state = ElicitationState::Finalized(spec.clone());
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use foundry_core::message::MessageToolCall;
    use futures::StreamExt;

    fn registry() -> ToolRegistry {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry
    }

    fn engine(provider: Arc<SequentialMockProvider>) -> ElicitationEngine {
        ElicitationEngine::new(&Runtime::new(mock_resolver(provider)), &registry(), "pro", None).unwrap()
    }

    fn ask_call() -> MessageToolCall {
        make_tool_call(
            ASK_TOOL,
            serde_json::json!({
                "questions": [{
                    "question": "Which cities should the assistant cover?",
                    "suggested_answers": ["Just mine", "Any city"]
                }]
            }),
        )
    }

    fn save_call(tool: &str) -> MessageToolCall {
        make_tool_call(
            SAVE_TOOL,
            serde_json::json!({
                "name": "echo_assistant",
                "description": "Repeats things back",
                "system_prompt": "You repeat what the user says.",
                "model_tier": "flash",
                "temperature": 0.2,
                "tool_names": [tool]
            }),
        )
    }

    #[test]
    fn catalog_formatting() {
        assert_eq!(format_tool_catalog(&[]), "No tools available.");
        let text = format_tool_catalog(&registry().catalog());
        assert_eq!(text, "### echo\n**Description:** Echo the given text back");
    }

    #[tokio::test]
    async fn architect_prompt_embeds_the_catalog() {
        let provider = Arc::new(SequentialMockProvider::new(vec![make_tool_call_response(vec![ask_call()], "")]));
        let engine = engine(provider.clone());
        engine.turn(RunRequest::user("I want an assistant")).await.unwrap();

        let request = provider.last_request().unwrap();
        assert!(request.messages[0].content.contains("### echo"));
        let offered: Vec<_> = request.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(offered, vec![ASK_TOOL, SAVE_TOOL]);
        assert_eq!(engine.agent().graph().model().model, "mock-pro");
    }

    #[tokio::test]
    async fn vague_intent_gets_questions() {
        let provider = Arc::new(SequentialMockProvider::new(vec![make_tool_call_response(vec![ask_call()], "")]));
        let outcome = engine(provider).turn(RunRequest::user("Make me a weather bot")).await.unwrap();
        match outcome {
            ElicitationOutcome::Clarification { questions } => {
                assert_eq!(questions.len(), 1);
                assert_eq!(questions[0].suggested_answers.len(), 2);
                assert!(!questions[0].allow_multiple);
            }
            other => panic!("expected clarification, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn session_finalizes_then_refuses_more_turns() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![ask_call()], ""),
            make_tool_call_response(vec![save_call("echo")], ""),
        ]));
        let mut session = ElicitationSession::new(engine(provider.clone()));

        let first = session.respond("I need an echo assistant").await.unwrap();
        assert!(!first.is_finalized());
        assert_eq!(session.state(), &ElicitationState::Gathering);

        let second = session.respond("Just mine").await.unwrap();
        match (&second, session.state()) {
            (ElicitationOutcome::Finalized { spec }, ElicitationState::Finalized(saved)) => {
                assert_eq!(spec, saved);
                assert_eq!(spec.tool_names, vec!["echo"]);
            }
            other => panic!("expected finalized, got {other:?}"),
        }

        // The second turn saw the whole first exchange.
        let request = provider.last_request().unwrap();
        assert!(request.messages.iter().any(|m| m.content == "I need an echo assistant"));
        assert!(request.messages.iter().any(|m| m.content == "Just mine"));

        let err = session.respond("one more thing").await.unwrap_err();
        assert!(matches!(err, ElicitationError::AlreadyFinalized));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn checkpointed_sessions_stay_finalized() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![ask_call()], ""),
            make_tool_call_response(vec![save_call("echo")], ""),
        ]));
        let store = Arc::new(foundry_checkpoint::InMemoryCheckpointStore::new());
        let engine = ElicitationEngine::new(
            &Runtime::new(mock_resolver(provider.clone())),
            &registry(),
            "pro",
            Some(store),
        )
        .unwrap();

        let first = engine
            .turn(RunRequest::user("I need an echo assistant").with_session("d1"))
            .await
            .unwrap();
        assert!(!first.is_finalized());
        let second = engine
            .turn(RunRequest::user("Just mine").with_session("d1"))
            .await
            .unwrap();
        assert!(second.is_finalized());

        let err = engine
            .turn(RunRequest::user("one more thing").with_session("d1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ElicitationError::AlreadyFinalized));

        let events: Vec<_> = engine
            .stream(RunRequest::user("and another").with_session("d1"), CancellationToken::new())
            .collect()
            .await;
        let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["run_started", "run_error"]);
        match &events[1] {
            AgentStreamEvent::RunError { kind, .. } => assert_eq!(kind, "already_finalized"),
            other => panic!("expected run_error, got {other:?}"),
        }
        assert_eq!(provider.call_count(), 2);

        // Other sessions are unaffected.
        assert!(engine.ensure_open(Some("d2")).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_specs_go_back_to_the_model() {
        let bad = make_tool_call(
            SAVE_TOOL,
            serde_json::json!({"name": "bad name", "system_prompt": "", "model_tier": "pro"}),
        );
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![bad], ""),
            make_tool_call_response(vec![save_call("echo")], ""),
        ]));
        let (outcome, state) = engine(provider.clone())
            .run_turn(RunRequest::user("An echo assistant, flash tier"))
            .await
            .unwrap();

        assert!(outcome.is_finalized());
        assert_eq!(provider.call_count(), 2);
        let feedback = state
            .messages
            .iter()
            .find(|m| m.tool_call_id.is_some() && m.content.starts_with("Error: "))
            .unwrap();
        assert!(feedback.content.contains("system_prompt"));
    }

    #[tokio::test]
    async fn tools_outside_the_catalog_are_refused() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![save_call("web_search")], ""),
            make_text_response("I could not save that."),
        ]));
        let err = engine(provider).turn(RunRequest::user("Search the web")).await.unwrap_err();
        match err {
            ElicitationError::Unclassified { text } => assert_eq!(text, "I could not save that."),
            other => panic!("expected unclassified, got {other:?}"),
        }
    }

    #[test]
    fn classify_rechecks_finalized_specs() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let engine = engine(provider);
        let forged = serde_json::json!({
            "type": "finalized",
            "spec": {
                "name": "sneaky",
                "system_prompt": "You do things.",
                "model_tier": "pro",
                "tool_names": ["shell"]
            }
        });
        let state = RunState {
            output: Some(forged.to_string()),
            ended_by_tool: Some(SAVE_TOOL.into()),
            ..RunState::default()
        };
        let err = engine.classify(&state).unwrap_err();
        assert!(matches!(err, ElicitationError::InvalidOutcome(ref m) if m.contains("shell")));

        let mismatched = RunState {
            output: Some(forged.to_string()),
            ended_by_tool: Some(ASK_TOOL.into()),
            ..RunState::default()
        };
        assert_eq!(engine.classify(&mismatched).unwrap_err().kind(), "invalid_outcome");
    }

    #[tokio::test]
    async fn stream_emits_the_outcome_before_finishing() {
        let provider = Arc::new(SequentialMockProvider::new(vec![make_tool_call_response(vec![ask_call()], "")]));
        let events: Vec<_> = engine(provider)
            .stream(RunRequest::user("A weather bot"), CancellationToken::new())
            .collect()
            .await;
        let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec!["run_started", "tool_call_started", "tool_call_result", "elicitation", "run_finished"]
        );
    }

    #[tokio::test]
    async fn stream_reports_plain_text_as_run_error() {
        let provider = Arc::new(SequentialMockProvider::single_text("Sure, here is a bot."));
        let events: Vec<_> = engine(provider)
            .stream(RunRequest::user("A weather bot"), CancellationToken::new())
            .collect()
            .await;
        match events.last().unwrap() {
            AgentStreamEvent::RunError { kind, .. } => assert_eq!(kind, "unclassified"),
            other => panic!("expected run_error, got {other:?}"),
        }
        assert!(!events.iter().any(|e| matches!(e, AgentStreamEvent::Elicitation { .. })));
    }

    #[test]
    fn unknown_tier_fails_engine_construction() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let err = ElicitationEngine::new(&Runtime::new(mock_resolver(provider)), &registry(), "ultra", None)
            .unwrap_err();
        assert_eq!(err.kind(), "unknown_model_tier");
    }
}
