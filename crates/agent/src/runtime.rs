//! Execution runtime: assembled graphs bound to a checkpoint store.
//!
//! A run with a session id loads the session's previous history, appends
//! the new messages, runs the graph, and saves the final history once the
//! run completes. Cancelled and failed runs write nothing. Only one run per
//! session may be active at a time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use foundry_core::checkpoint::{CheckpointStore, SessionState, validate_session_id};
use foundry_core::error::CheckpointError;
use foundry_core::message::Message;
use foundry_core::new_id;
use foundry_core::provider::ModelResolver;
use foundry_core::spec::AgentSpec;
use foundry_core::tool::ToolMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::assembler::{AgentDefinition, Assembler, AssemblyOptions};
use crate::error::{AssemblyError, RunError};
use crate::graph::{AgentGraph, EventSink, RunState, RunStream};
use crate::stream_event::AgentStreamEvent;

/// What a checkpoint failure does to the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckpointPolicy {
    /// Log the failure and keep going.
    #[default]
    BestEffort,
    /// Fail the run with `RunError::Checkpoint`.
    Required,
}

/// Input to one run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// New messages, appended after any checkpointed history
    pub messages: Vec<Message>,
    pub session_id: Option<String>,
    pub run_id: Option<String>,
    pub thread_id: Option<String>,
}

impl RunRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    /// A request holding a single user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(vec![Message::user(content)])
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

/// Session ids held by active runs.
#[derive(Clone, Default)]
struct SessionLeases(Arc<Mutex<HashSet<String>>>);

impl SessionLeases {
    fn acquire(&self, session_id: &str) -> Result<SessionLease, CheckpointError> {
        let mut held = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(session_id.to_string()) {
            return Err(CheckpointError::SessionBusy(session_id.to_string()));
        }
        Ok(SessionLease {
            leases: self.clone(),
            session_id: session_id.to_string(),
        })
    }
}

struct SessionLease {
    leases: SessionLeases,
    session_id: String,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.leases
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

#[derive(Clone)]
pub struct Runtime {
    assembler: Assembler,
    policy: CheckpointPolicy,
    leases: SessionLeases,
}

impl Runtime {
    pub fn new(resolver: Arc<dyn ModelResolver>) -> Self {
        Self {
            assembler: Assembler::new(resolver),
            policy: CheckpointPolicy::default(),
            leases: SessionLeases::default(),
        }
    }

    pub fn with_options(mut self, options: AssemblyOptions) -> Self {
        self.assembler = self.assembler.with_options(options);
        self
    }

    pub fn with_checkpoint_policy(mut self, policy: CheckpointPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    pub fn checkpoint_policy(&self) -> CheckpointPolicy {
        self.policy
    }

    /// Assemble `spec` and bind it to an optional checkpoint store.
    pub fn build(
        &self,
        spec: &AgentSpec,
        tools: &ToolMap,
        checkpoint: Option<Arc<dyn CheckpointStore>>,
    ) -> Result<ExecutableAgent, AssemblyError> {
        let graph = self.assembler.assemble(spec, tools)?;
        Ok(self.wrap(graph, checkpoint))
    }

    pub fn from_definition(
        &self,
        definition: AgentDefinition,
        checkpoint: Option<Arc<dyn CheckpointStore>>,
    ) -> Result<ExecutableAgent, AssemblyError> {
        let graph = self.assembler.create_agent(definition)?;
        Ok(self.wrap(graph, checkpoint))
    }

    /// Bind an already assembled graph.
    pub fn wrap(&self, graph: AgentGraph, checkpoint: Option<Arc<dyn CheckpointStore>>) -> ExecutableAgent {
        ExecutableAgent {
            graph,
            checkpoint,
            policy: self.policy,
            leases: self.leases.clone(),
        }
    }
}

/// An assembled graph plus its persistence.
#[derive(Clone)]
pub struct ExecutableAgent {
    graph: AgentGraph,
    checkpoint: Option<Arc<dyn CheckpointStore>>,
    policy: CheckpointPolicy,
    leases: SessionLeases,
}

impl std::fmt::Debug for ExecutableAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableAgent")
            .field("graph", &self.graph)
            .field("checkpoint", &self.checkpoint.as_ref().map(|c| c.name().to_string()))
            .field("policy", &self.policy)
            .finish()
    }
}

impl ExecutableAgent {
    pub fn graph(&self) -> &AgentGraph {
        &self.graph
    }

    pub fn name(&self) -> &str {
        self.graph.name()
    }

    pub fn checkpoint(&self) -> Option<&Arc<dyn CheckpointStore>> {
        self.checkpoint.as_ref()
    }

    /// Run to completion without streaming.
    pub async fn invoke(&self, request: RunRequest) -> Result<RunState, RunError> {
        self.execute(
            request.messages,
            request.session_id.as_deref(),
            &EventSink::detached(),
            &CancellationToken::new(),
        )
        .await
    }

    /// Run in a background task and stream its events.
    ///
    /// `thread_id` defaults to the session id. Dropping the stream cancels
    /// the run.
    pub fn stream(&self, request: RunRequest, cancel: CancellationToken) -> RunStream {
        let agent = self.clone();
        RunStream::spawn(cancel, move |sink, cancel| async move {
            let (run_id, thread_id) = run_ids(&request);
            if sink
                .emit(AgentStreamEvent::RunStarted { run_id, thread_id })
                .await
                .is_err()
            {
                return;
            }
            let result = agent
                .execute(request.messages, request.session_id.as_deref(), &sink, &cancel)
                .await;
            sink.finish(result).await;
        })
    }

    pub(crate) async fn execute(
        &self,
        messages: Vec<Message>,
        session_id: Option<&str>,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> Result<RunState, RunError> {
        let (Some(store), Some(session_id)) = (&self.checkpoint, session_id) else {
            return self.graph.run(messages, sink, cancel).await;
        };

        validate_session_id(session_id)?;
        let _lease = self.leases.acquire(session_id)?;

        // A history that could not be read must not be overwritten by this
        // run's partial view of it.
        let (mut history, persist) = match store.load(session_id).await {
            Ok(state) => {
                debug!(session = %session_id, messages = state.messages.len(), "Resuming session");
                (state.messages, true)
            }
            Err(CheckpointError::NotFound(_)) => {
                debug!(session = %session_id, "Starting new session");
                (Vec::new(), true)
            }
            Err(e @ (CheckpointError::InvalidSessionId(_) | CheckpointError::SessionBusy(_))) => {
                return Err(e.into());
            }
            Err(e) => {
                self.tolerate(session_id, "load", e)?;
                warn!(session = %session_id, "Running without persistence");
                (Vec::new(), false)
            }
        };
        history.extend(messages);

        let state = self.graph.run(history, sink, cancel).await?;
        if !persist {
            return Ok(state);
        }

        let snapshot = SessionState::new(session_id, self.graph.name(), state.messages.clone());
        match store.save(&snapshot).await {
            Ok(()) => info!(session = %session_id, store = store.name(), "Session checkpointed"),
            Err(e) => self.tolerate(session_id, "save", e)?,
        }
        Ok(state)
    }

    fn tolerate(&self, session_id: &str, op: &str, e: CheckpointError) -> Result<(), RunError> {
        match self.policy {
            CheckpointPolicy::Required => Err(e.into()),
            CheckpointPolicy::BestEffort => {
                warn!(session = %session_id, op, error = %e, "Checkpoint failed, continuing");
                Ok(())
            }
        }
    }
}

/// The run and thread ids announced in `run_started`.
pub(crate) fn run_ids(request: &RunRequest) -> (String, String) {
    let run_id = request.run_id.clone().unwrap_or_else(|| new_id("run"));
    let thread_id = request
        .thread_id
        .clone()
        .or_else(|| request.session_id.clone())
        .unwrap_or_else(|| new_id("thread"));
    (run_id, thread_id)
}
