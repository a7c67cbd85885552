//! Error types for the guardrails layer

use crate::turn::TurnPhase;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardrailsError {
    #[error("Redaction error: {0}")]
    Redaction(#[from] veilguard_pii::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid turn transition from {from} to {to}")]
    InvalidTransition { from: TurnPhase, to: TurnPhase },
}

pub type Result<T> = std::result::Result<T, GuardrailsError>;
