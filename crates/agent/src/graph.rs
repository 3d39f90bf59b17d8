//! The executable agent graph and its tool-calling loop.
//!
//! An `AgentGraph` is what the assembler produces: a system prompt, a bound
//! model, an ordered tool set, and an iteration bound. It holds no
//! conversation state; every run receives its history and returns the
//! final state.
//!
//! Each iteration of the loop:
//!
//! 1. Sends system prompt + history + tool definitions to the model (streaming)
//! 2. Forwards text deltas as they arrive
//! 3. If the model asked for no tools, the text is the final answer
//! 4. Otherwise runs each tool call in order and appends the results
//!
//! Tool failures go back to the model as error results. Model failures end
//! the run. Every model and tool await is raced against the run's
//! cancellation token.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use foundry_core::error::ToolError;
use foundry_core::message::{Message, MessageToolCall};
use foundry_core::new_id;
use foundry_core::provider::{ModelHandle, ProviderRequest, ToolDefinition};
use foundry_core::tool::{Tool, ToolResult};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::error::RunError;
use crate::stream_event::AgentStreamEvent;

/// Iteration bound for agents that do not set one.
pub const DEFAULT_MAX_ITERATIONS: u32 = 25;

/// Capacity of the event channel between a run and its consumer.
pub(crate) const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// A capability resolved from the tool map
    Tool,
    /// A nested agent exposed as a tool
    SubAgent,
}

/// A tool as bound into a graph.
#[derive(Clone)]
pub struct BoundTool {
    pub tool: Arc<dyn Tool>,
    pub kind: ToolKind,
}

/// The final state of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Full history, oldest first, without the system prompt
    pub messages: Vec<Message>,

    /// Model round-trips used
    pub iterations: u32,

    pub tool_calls_made: usize,

    /// Final answer, or the output of the tool that ended the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Set when a returns-directly tool ended the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_by_tool: Option<String>,
}

#[derive(Clone)]
pub struct AgentGraph {
    name: String,
    system_prompt: String,
    model: ModelHandle,
    temperature: f32,
    max_iterations: u32,
    tools: Vec<BoundTool>,
}

impl std::fmt::Debug for AgentGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentGraph")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_iterations", &self.max_iterations)
            .field("tools", &self.tool_names())
            .finish()
    }
}

impl AgentGraph {
    pub(crate) fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model: ModelHandle,
        temperature: f64,
        max_iterations: u32,
        tools: Vec<BoundTool>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            model,
            temperature: temperature as f32,
            max_iterations,
            tools,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Names the model can call, in binding order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.tool.name()).collect()
    }

    pub fn tool(&self, name: &str) -> Option<&BoundTool> {
        self.tools.iter().find(|t| t.tool.name() == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.tool.to_definition()).collect()
    }

    /// Run to completion without streaming.
    pub async fn invoke(&self, history: Vec<Message>) -> Result<RunState, RunError> {
        self.run(history, &EventSink::detached(), &CancellationToken::new()).await
    }

    /// Run in a background task and stream its events.
    ///
    /// Dropping the returned stream cancels the run.
    pub fn stream(&self, history: Vec<Message>, cancel: CancellationToken) -> RunStream {
        let graph = self.clone();
        RunStream::spawn(cancel, move |sink, cancel| async move {
            let started = AgentStreamEvent::RunStarted {
                run_id: new_id("run"),
                thread_id: new_id("thread"),
            };
            if sink.emit(started).await.is_err() {
                return;
            }
            let result = graph.run(history, &sink, &cancel).await;
            sink.finish(result).await;
        })
    }

    pub(crate) async fn run(
        &self,
        history: Vec<Message>,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<RunState, RunError> {
        info!(agent = %self.name, model = %self.model.model, messages = history.len(), "Run started");

        let definitions = self.definitions();
        let mut state = RunState {
            messages: history,
            ..RunState::default()
        };

        while state.iterations < self.max_iterations {
            if cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            state.iterations += 1;
            debug!(agent = %self.name, iteration = state.iterations, "Calling model");

            let (content, tool_calls) = self.call_model(&state.messages, &definitions, sink, cancel).await?;

            if tool_calls.is_empty() {
                state.messages.push(Message::assistant(content.clone()));
                state.output = Some(content);
                info!(
                    agent = %self.name,
                    iterations = state.iterations,
                    tool_calls = state.tool_calls_made,
                    "Run finished"
                );
                return Ok(state);
            }

            state
                .messages
                .push(Message::assistant_with_tool_calls(content, tool_calls.clone()));

            for (i, call) in tool_calls.iter().enumerate() {
                state.tool_calls_made += 1;
                let (output, direct) = self.call_tool(call, sink, cancel).await?;
                state.messages.push(Message::tool_result(&call.id, &output));

                if direct {
                    // The remaining calls never ran; answer them so the history stays well-formed.
                    for skipped in &tool_calls[i + 1..] {
                        state.messages.push(Message::tool_result(
                            &skipped.id,
                            format!("Skipped: the run was ended by {}", call.name),
                        ));
                    }
                    info!(agent = %self.name, tool = %call.name, "Run ended by tool");
                    state.output = Some(output);
                    state.ended_by_tool = Some(call.name.clone());
                    return Ok(state);
                }
            }
        }

        warn!(agent = %self.name, limit = self.max_iterations, "Iteration limit reached");
        Err(RunError::IterationLimit(self.max_iterations))
    }

    /// One streamed model round-trip: the accumulated text and the tool calls.
    async fn call_model(
        &self,
        history: &[Message],
        definitions: &[ToolDefinition],
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<(String, Vec<MessageToolCall>), RunError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(history.iter().cloned());

        let request = ProviderRequest {
            model: self.model.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: None,
            tools: definitions.to_vec(),
            stream: true,
        };

        let mut chunks = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RunError::Cancelled),
            rx = self.model.provider.stream(request) => rx?,
        };

        let mut content = String::new();
        let mut tool_calls: Vec<MessageToolCall> = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RunError::Cancelled),
                next = chunks.recv() => next,
            };
            let chunk = match next {
                None => break,
                Some(chunk) => chunk?,
            };

            if let Some(text) = chunk.content
                && !text.is_empty()
            {
                content.push_str(&text);
                sink.emit(AgentStreamEvent::TextDelta { delta: text }).await?;
            }
            for call in chunk.tool_calls {
                match tool_calls.iter_mut().find(|t| t.id == call.id) {
                    Some(existing) => *existing = call,
                    None => tool_calls.push(call),
                }
            }
            if chunk.done {
                break;
            }
        }
        Ok((content, tool_calls))
    }

    /// Execute one tool call. Returns the text fed back to the model and
    /// whether the call ends the run.
    async fn call_tool(
        &self,
        call: &MessageToolCall,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<(String, bool), RunError> {
        let parsed = parse_arguments(&call.arguments);
        sink.emit(AgentStreamEvent::ToolCallStarted {
            id: call.id.clone(),
            name: call.name.clone(),
            args: parsed
                .clone()
                .unwrap_or_else(|_| serde_json::Value::String(call.arguments.clone())),
        })
        .await?;

        let bound = self.tool(&call.name);
        if let (Some(bound), Ok(args)) = (bound, &parsed)
            && bound.kind == ToolKind::SubAgent
        {
            sink.emit(AgentStreamEvent::SubagentDelegated {
                name: call.name.clone(),
                task: args["task"].as_str().unwrap_or_default().to_string(),
            })
            .await?;
        }

        let outcome: Result<ToolResult, ToolError> = match (bound, parsed) {
            (None, _) => Err(ToolError::NotFound {
                name: call.name.clone(),
                available: self.tool_names().into_iter().map(String::from).collect(),
            }),
            (Some(_), Err(reason)) => Err(ToolError::InvalidArguments(reason)),
            (Some(bound), Ok(args)) => {
                debug!(agent = %self.name, tool = %call.name, "Executing tool");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RunError::Cancelled),
                    result = bound.tool.execute(args) => result,
                }
            }
        };

        match outcome {
            Ok(result) => {
                sink.emit(AgentStreamEvent::ToolCallResult {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    result: Some(result.output.clone()),
                    error: None,
                })
                .await?;
                let direct = bound.is_some_and(|b| b.tool.returns_directly());
                Ok((result.output, direct))
            }
            Err(e) => {
                warn!(agent = %self.name, tool = %call.name, error = %e, "Tool call failed");
                sink.emit(AgentStreamEvent::ToolCallResult {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    result: None,
                    error: Some(e.to_string()),
                })
                .await?;
                Ok((format!("Error: {e}"), false))
            }
        }
    }
}

fn parse_arguments(raw: &str) -> Result<serde_json::Value, String> {
    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(raw).map_err(|e| format!("arguments are not valid JSON: {e}"))
}

/// Where a run sends its events. Detached sinks drop everything.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: Option<mpsc::Sender<AgentStreamEvent>>,
    cancel: CancellationToken,
}

impl EventSink {
    pub(crate) fn detached() -> Self {
        Self {
            tx: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Send one event, waiting for room in the channel. Fails once the run
    /// is cancelled or the consumer is gone.
    pub(crate) async fn emit(&self, event: AgentStreamEvent) -> Result<(), RunError> {
        let Some(tx) = &self.tx else {
            return Ok(());
        };
        if self.cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RunError::Cancelled),
            sent = tx.send(event) => sent.map_err(|_| RunError::Cancelled),
        }
    }

    /// Emit the terminal event for `result`. Cancelled runs end silently.
    pub(crate) async fn finish(&self, result: Result<RunState, RunError>) {
        let event = match result {
            Ok(final_state) => AgentStreamEvent::RunFinished { final_state },
            Err(RunError::Cancelled) => return,
            Err(e) => AgentStreamEvent::RunError {
                kind: e.kind().to_string(),
                message: e.to_string(),
            },
        };
        let _ = self.emit(event).await;
    }
}

/// The event stream of one run.
///
/// Yields events in causal order and ends after the terminal event. Once
/// the run is cancelled the stream yields nothing more, and dropping the
/// stream cancels the run.
pub struct RunStream {
    events: ReceiverStream<AgentStreamEvent>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl RunStream {
    pub(crate) fn spawn<F, Fut>(cancel: CancellationToken, producer: F) -> Self
    where
        F: FnOnce(EventSink, CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let sink = EventSink {
            tx: Some(tx),
            cancel: cancel.clone(),
        };
        tokio::spawn(producer(sink, cancel.clone()));
        Self {
            events: ReceiverStream::new(rx),
            cancel: cancel.clone(),
            _guard: cancel.drop_guard(),
        }
    }

    /// Cancel the run. No further events are yielded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for RunStream {
    type Item = AgentStreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.events.poll_next_unpin(cx)
    }
}
