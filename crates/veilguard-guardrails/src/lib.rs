//! Veilguard Prompt Guardrails
//!
//! The application-facing façade over `veilguard-pii`. One conversation turn
//! runs through it in order:
//! - redact prompt variables before template interpolation
//! - run a defensive pass over the interpolated prompts
//! - restore original values in the model's response
//!
//! # Example
//! ```
//! use serde_json::json;
//! use veilguard_guardrails::{Guardrails, GuardrailsConfig, render_prompt};
//!
//! # fn main() -> veilguard_guardrails::Result<()> {
//! let guardrails = Guardrails::from_config(&GuardrailsConfig::default())?;
//!
//! let guarded = guardrails.apply_variable_guardrails(
//!     &json!({ "lead": { "email": "jane@example.com" } }),
//!     None,
//! )?;
//! let user_prompt = render_prompt("Write to ${lead.email}", &guarded.variables);
//! assert_eq!(user_prompt, "Write to [EMAIL_1]");
//!
//! let restored = guardrails.restore_output("Sent to [EMAIL_1].", &guarded.redaction_map);
//! assert_eq!(restored, "Sent to jane@example.com.");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod guardrails;
pub mod template;
pub mod turn;

pub use config::GuardrailsConfig;
pub use error::{GuardrailsError, Result};
pub use guardrails::{Guardrails, InputGuardrails, VariableGuardrails};
pub use template::render_prompt;
pub use turn::{GuardedPrompt, GuardedTurn, TurnPhase};

pub use veilguard_pii::{RedactionMap, RedactionState, restore_output};
