//! `foundry run` — Run a spec file on one message and stream the events.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::bail;
use foundry_agent::{AgentStreamEvent, CancellationToken, RunRequest};
use futures::StreamExt;

pub async fn run(spec_path: &Path, message: String, session: Option<String>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let spec = super::read_spec(spec_path)?;
    let registry = super::registry();
    let checkpoint = foundry_checkpoint::from_config(&config.checkpoint);

    let runtime = foundry_gateway::build_runtime(&config);
    let agent = runtime.build(&spec, &registry.get_all(), Some(Arc::clone(&checkpoint)))?;

    let mut request = RunRequest::user(message);
    request.session_id = session;

    // Ctrl+C cancels the run; the stream then ends without a terminal event.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut events = agent.stream(request, cancel.clone());
    let mut failure = None;
    let mut stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        if let AgentStreamEvent::RunError { kind, message } = &event {
            failure = Some(format!("{kind}: {message}"));
        }
        let line = if json {
            Some(format!("{}\n", serde_json::to_string(&event)?))
        } else {
            render(&event)
        };
        if let Some(line) = line {
            stdout.write_all(line.as_bytes())?;
            stdout.flush()?;
        }
    }

    if cancel.is_cancelled() {
        bail!("Run cancelled");
    }
    if let Some(failure) = failure {
        bail!("Run failed: {failure}");
    }
    Ok(())
}

/// Human-readable rendering of one event, or `None` for events not shown.
pub(crate) fn render(event: &AgentStreamEvent) -> Option<String> {
    match event {
        AgentStreamEvent::RunStarted { thread_id, .. } => Some(format!("[thread {thread_id}]\n")),
        AgentStreamEvent::TextDelta { delta } => Some(delta.clone()),
        AgentStreamEvent::ToolCallStarted { name, args, .. } => Some(format!("\n  -> {name} {args}\n")),
        AgentStreamEvent::ToolCallResult { name, result, error, .. } => match (result, error) {
            (_, Some(error)) => Some(format!("  <- {name} failed: {error}\n")),
            (Some(result), None) => Some(format!("  <- {name}: {}\n", first_line(result))),
            (None, None) => None,
        },
        AgentStreamEvent::SubagentDelegated { name, task } => Some(format!("  delegating to {name}: {task}\n")),
        AgentStreamEvent::RunFinished { final_state } => Some(format!(
            "\n[done: {} iterations, {} tool calls]\n",
            final_state.iterations, final_state.tool_calls_made
        )),
        AgentStreamEvent::RunError { kind, message } => Some(format!("\n[error {kind}] {message}\n")),
        AgentStreamEvent::Elicitation { .. } => None,
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
