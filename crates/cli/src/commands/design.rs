//! `foundry design` — One turn with the elicitation engine.

use std::sync::Arc;

use anyhow::Context;
use foundry_agent::{ElicitationEngine, ElicitationOutcome, RunRequest};

pub async fn run(intent: String, session: Option<String>) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let checkpoint = foundry_checkpoint::from_config(&config.checkpoint);
    let runtime = foundry_gateway::build_runtime(&config);
    let engine = ElicitationEngine::new(
        &runtime,
        &super::registry(),
        &config.elicitation.model_tier,
        Some(Arc::clone(&checkpoint)),
    )?;

    let mut request = RunRequest::user(intent);
    request.session_id = session.clone();

    let outcome = engine.turn(request).await.context("Design turn failed")?;
    print!("{}", describe(&outcome)?);
    if let (false, Some(session)) = (outcome.is_finalized(), session) {
        println!("\nAnswer with: foundry design --session {session} \"<your answers>\"");
    }
    Ok(())
}

pub(crate) fn describe(outcome: &ElicitationOutcome) -> anyhow::Result<String> {
    let mut out = String::new();
    match outcome {
        ElicitationOutcome::Clarification { questions } => {
            for (i, q) in questions.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, q.question));
                if !q.suggested_answers.is_empty() {
                    let hint = if q.allow_multiple { " (pick any)" } else { "" };
                    out.push_str(&format!("   options{hint}: {}\n", q.suggested_answers.join(" | ")));
                }
            }
        }
        ElicitationOutcome::Finalized { spec } => {
            out.push_str(&spec.to_json_pretty()?);
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundry_agent::ClarifyingQuestion;
    use foundry_core::spec::AgentSpec;

    #[test]
    fn clarifications_list_options() {
        let outcome = ElicitationOutcome::Clarification {
            questions: vec![ClarifyingQuestion {
                question: "Which units?".into(),
                suggested_answers: vec!["Celsius".into(), "Fahrenheit".into()],
                allow_multiple: true,
            }],
        };
        assert_eq!(
            describe(&outcome).unwrap(),
            "1. Which units?\n   options (pick any): Celsius | Fahrenheit\n"
        );
    }

    #[test]
    fn finalized_specs_print_as_json() {
        let spec = AgentSpec::builder("weather", "You report weather.", "flash").build().unwrap();
        let text = describe(&ElicitationOutcome::Finalized { spec: spec.clone() }).unwrap();
        assert_eq!(AgentSpec::parse(&text).unwrap(), spec);
    }
}
