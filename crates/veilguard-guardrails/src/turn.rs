//! Guarded conversation turn
//!
//! Sequences the guardrail calls of one turn and owns its redaction state:
//!
//! ```text
//! NEW → VARIABLES_REDACTED → PROMPT_GUARDED → MODEL_CALLED → OUTPUT_RESTORED → DONE
//!  └──────────────────────────────┘
//! ```
//!
//! Skipping variable redaction is legal; every other step must run in order.

use crate::error::{GuardrailsError, Result};
use crate::guardrails::Guardrails;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use veilguard_pii::{RedactionMap, RedactionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    New,
    VariablesRedacted,
    PromptGuarded,
    ModelCalled,
    OutputRestored,
    Done,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::New => "NEW",
            TurnPhase::VariablesRedacted => "VARIABLES_REDACTED",
            TurnPhase::PromptGuarded => "PROMPT_GUARDED",
            TurnPhase::ModelCalled => "MODEL_CALLED",
            TurnPhase::OutputRestored => "OUTPUT_RESTORED",
            TurnPhase::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Prompts ready to hand to the model client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedPrompt {
    pub system_prompt: String,
    pub user_prompt: String,
    pub pii_redacted: bool,
}

pub struct GuardedTurn<'g> {
    guardrails: &'g Guardrails,
    state: RedactionState,
    phase: TurnPhase,
    response: Option<String>,
}

impl<'g> GuardedTurn<'g> {
    pub fn new(guardrails: &'g Guardrails) -> Self {
        Self::resume(guardrails, guardrails.create_redaction_state())
    }

    /// Start a turn that continues the numbering of an earlier one
    pub fn resume(guardrails: &'g Guardrails, state: RedactionState) -> Self {
        Self {
            guardrails,
            state,
            phase: TurnPhase::New,
            response: None,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn redaction_map(&self) -> &RedactionMap {
        self.state.redaction_map()
    }

    /// Redact prompt variables. May be called repeatedly before the prompt is guarded.
    pub fn redact_variables(&mut self, variables: &Value) -> Result<Value> {
        self.ensure(
            &[TurnPhase::New, TurnPhase::VariablesRedacted],
            TurnPhase::VariablesRedacted,
        )?;

        let redacted = self.guardrails.engine().redact_tree(variables, &mut self.state)?;
        self.phase = TurnPhase::VariablesRedacted;
        Ok(redacted.value)
    }

    /// Defensive pass over the interpolated prompts
    pub fn guard_prompt(&mut self, system_prompt: &str, user_prompt: &str) -> Result<GuardedPrompt> {
        self.ensure(
            &[TurnPhase::New, TurnPhase::VariablesRedacted],
            TurnPhase::PromptGuarded,
        )?;

        let guarded =
            self.guardrails
                .apply_input_guardrails(system_prompt, user_prompt, Some(&mut self.state));
        self.phase = TurnPhase::PromptGuarded;

        Ok(GuardedPrompt {
            system_prompt: guarded.system_prompt,
            user_prompt: guarded.user_prompt,
            pii_redacted: guarded.pii_redacted,
        })
    }

    /// Hold on to the model's raw response
    pub fn record_response(&mut self, response: impl Into<String>) -> Result<()> {
        self.ensure(&[TurnPhase::PromptGuarded], TurnPhase::ModelCalled)?;
        self.response = Some(response.into());
        self.phase = TurnPhase::ModelCalled;
        Ok(())
    }

    /// Recorded response with original values put back
    pub fn restore_output(&mut self) -> Result<String> {
        self.ensure(&[TurnPhase::ModelCalled], TurnPhase::OutputRestored)?;

        let response = self.response.take().unwrap_or_default();
        let restored = self.guardrails.restore_output(&response, self.state.redaction_map());
        self.phase = TurnPhase::OutputRestored;
        Ok(restored)
    }

    /// Close the turn. The returned state may seed [`GuardedTurn::resume`].
    pub fn finish(mut self) -> Result<RedactionState> {
        self.ensure(&[TurnPhase::OutputRestored], TurnPhase::Done)?;
        self.phase = TurnPhase::Done;

        tracing::debug!(placeholders = self.state.redaction_map().len(), "Guarded turn finished");

        Ok(self.state)
    }

    fn ensure(&self, allowed: &[TurnPhase], to: TurnPhase) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(GuardrailsError::InvalidTransition {
                from: self.phase,
                to,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardrailsConfig;
    use crate::template::render_prompt;
    use serde_json::json;

    fn guardrails() -> Guardrails {
        Guardrails::from_config(&GuardrailsConfig::default()).unwrap()
    }

    #[test]
    fn test_full_turn() {
        let guardrails = guardrails();
        let mut turn = GuardedTurn::new(&guardrails);
        assert_eq!(turn.phase(), TurnPhase::New);

        let variables = turn
            .redact_variables(&json!({
                "lead": { "email": "jane@example.com" },
                "agent": { "email": "john@example.com" }
            }))
            .unwrap();
        assert_eq!(turn.phase(), TurnPhase::VariablesRedacted);

        let user_prompt = render_prompt("Email ${lead.email}, cc ${agent.email}", &variables);
        let prompt = turn.guard_prompt("You draft emails.", &user_prompt).unwrap();
        assert_eq!(prompt.user_prompt, "Email [EMAIL_1], cc [EMAIL_2]");
        assert!(prompt.pii_redacted);
        assert_eq!(turn.phase(), TurnPhase::PromptGuarded);

        turn.record_response("Draft email to [EMAIL_1] and CC [EMAIL_2].").unwrap();
        assert_eq!(turn.phase(), TurnPhase::ModelCalled);

        let output = turn.restore_output().unwrap();
        assert_eq!(output, "Draft email to jane@example.com and CC john@example.com.");
        assert_eq!(turn.phase(), TurnPhase::OutputRestored);

        let state = turn.finish().unwrap();
        assert_eq!(state.redaction_map().len(), 2);
    }

    #[test]
    fn test_skipping_variable_redaction_is_legal() {
        let guardrails = guardrails();
        let mut turn = GuardedTurn::new(&guardrails);

        let prompt = turn.guard_prompt("", "Text 555-123-4567").unwrap();
        assert_eq!(prompt.user_prompt, "Text [PHONE_1]");

        turn.record_response("Texted [PHONE_1]").unwrap();
        assert_eq!(turn.restore_output().unwrap(), "Texted 555-123-4567");
    }

    #[test]
    fn test_out_of_order_calls_fail() {
        let guardrails = guardrails();
        let mut turn = GuardedTurn::new(&guardrails);

        let err = turn.record_response("too early").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid turn transition from NEW to MODEL_CALLED"
        );
        assert!(matches!(turn.restore_output(), Err(GuardrailsError::InvalidTransition { .. })));

        turn.guard_prompt("", "hello").unwrap();
        assert!(turn.redact_variables(&json!({})).is_err());
        assert!(turn.guard_prompt("", "again").is_err());
        assert_eq!(turn.phase(), TurnPhase::PromptGuarded);
    }

    #[test]
    fn test_finish_requires_restored_output() {
        let guardrails = guardrails();
        let turn = GuardedTurn::new(&guardrails);
        assert!(turn.finish().is_err());
    }

    #[test]
    fn test_resume_carries_numbering() {
        let guardrails = guardrails();

        let mut first = GuardedTurn::new(&guardrails);
        first.guard_prompt("", "Email a@example.com").unwrap();
        first.record_response("ok").unwrap();
        first.restore_output().unwrap();
        let state = first.finish().unwrap();

        let mut second = GuardedTurn::resume(&guardrails, state);
        let prompt = second
            .guard_prompt("", "Email b@example.com and a@example.com")
            .unwrap();
        assert_eq!(prompt.user_prompt, "Email [EMAIL_2] and [EMAIL_1]");
    }

    #[test]
    fn test_failed_redaction_keeps_phase() {
        let config = GuardrailsConfig {
            max_depth: 1,
            ..GuardrailsConfig::default()
        };
        let guardrails = Guardrails::from_config(&config).unwrap();
        let mut turn = GuardedTurn::new(&guardrails);

        assert!(turn.redact_variables(&json!({ "a": { "b": "c" } })).is_err());
        assert_eq!(turn.phase(), TurnPhase::New);
    }

    #[test]
    fn test_phase_serde() {
        let json = serde_json::to_string(&TurnPhase::VariablesRedacted).unwrap();
        assert_eq!(json, "\"VARIABLES_REDACTED\"");
    }
}
