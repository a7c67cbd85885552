//! Guardrails orchestrator

use crate::config::GuardrailsConfig;
use crate::error::Result;
use serde_json::Value;
use veilguard_pii::{
    RedactionEngine, RedactionMap, RedactionState, contains_placeholder, restore_output,
};

/// Redacted prompt variables and the state that produced them
#[derive(Debug, Clone)]
pub struct VariableGuardrails {
    pub variables: Value,

    /// True iff the returned tree holds at least one placeholder
    pub pii_redacted: bool,

    /// State created by this call when the caller did not supply one.
    /// Thread it into the following calls of the turn.
    pub redaction_state: Option<RedactionState>,

    /// Snapshot of the state's map at return time
    pub redaction_map: RedactionMap,
}

/// Prompts after the defensive pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputGuardrails {
    pub system_prompt: String,
    pub user_prompt: String,

    /// True iff either prompt holds at least one placeholder
    pub pii_redacted: bool,

    pub redaction_map: RedactionMap,
}

/// Public façade used by the prompting layer
pub struct Guardrails {
    engine: RedactionEngine,
}

impl Guardrails {
    pub fn new(engine: RedactionEngine) -> Self {
        Self { engine }
    }

    pub fn from_config(config: &GuardrailsConfig) -> Result<Self> {
        config.validate()?;

        let engine = RedactionEngine::from_config(&config.pii)?.with_max_depth(config.max_depth);

        tracing::debug!(
            matchers = engine.matchers().count(),
            max_depth = config.max_depth,
            "Guardrails initialized"
        );

        Ok(Self::new(engine))
    }

    pub fn engine(&self) -> &RedactionEngine {
        &self.engine
    }

    /// Fresh state for a new conversation turn
    pub fn create_redaction_state(&self) -> RedactionState {
        RedactionState::new()
    }

    /// Redact every string leaf of `variables` before prompt interpolation.
    ///
    /// A supplied `redaction_state` is updated in place and stays with the
    /// caller even when the call fails. Otherwise a new state is started and
    /// handed back in the result for the remaining calls of the turn.
    pub fn apply_variable_guardrails(
        &self,
        variables: &Value,
        redaction_state: Option<&mut RedactionState>,
    ) -> Result<VariableGuardrails> {
        match redaction_state {
            Some(state) => self.guard_variables(variables, state),
            None => {
                let mut state = self.create_redaction_state();
                let mut guarded = self.guard_variables(variables, &mut state)?;
                guarded.redaction_state = Some(state);
                Ok(guarded)
            }
        }
    }

    fn guard_variables(
        &self,
        variables: &Value,
        state: &mut RedactionState,
    ) -> Result<VariableGuardrails> {
        let redacted = self.engine.redact_tree(variables, state)?;

        // Already-redacted input reports `changed == false` but still carries placeholders
        let pii_redacted = tree_contains_placeholder(&redacted.value);

        tracing::debug!(
            changed = redacted.changed,
            pii_redacted,
            placeholders = state.redaction_map().len(),
            "Applied variable guardrails"
        );

        Ok(VariableGuardrails {
            variables: redacted.value,
            pii_redacted,
            redaction_map: state.snapshot(),
            redaction_state: None,
        })
    }

    /// Defensive pass over interpolated prompts.
    ///
    /// Prompts built only from guarded variables come back byte-for-byte
    /// unchanged; anything the template itself introduced is redacted with the
    /// same numbering. Without a state a fresh one is used.
    pub fn apply_input_guardrails(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        redaction_state: Option<&mut RedactionState>,
    ) -> InputGuardrails {
        let mut fresh = RedactionState::new();
        let state = redaction_state.unwrap_or(&mut fresh);

        let system = self.engine.redact(system_prompt, state);
        let user = self.engine.redact(user_prompt, state);

        if system.changed || user.changed {
            tracing::warn!(
                system_replacements = system.replacements.len(),
                user_replacements = user.replacements.len(),
                "Input guardrails redacted PII that bypassed variable redaction"
            );
        }

        let pii_redacted = contains_placeholder(&system.text) || contains_placeholder(&user.text);

        InputGuardrails {
            system_prompt: system.text,
            user_prompt: user.text,
            pii_redacted,
            redaction_map: state.snapshot(),
        }
    }

    /// Put original values back into model output. Unknown placeholders stay verbatim.
    pub fn restore_output(&self, text: &str, redaction_map: &RedactionMap) -> String {
        restore_output(text, redaction_map)
    }
}

fn tree_contains_placeholder(value: &Value) -> bool {
    match value {
        Value::String(s) => contains_placeholder(s),
        Value::Array(items) => items.iter().any(tree_contains_placeholder),
        Value::Object(map) => map.values().any(tree_contains_placeholder),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}
