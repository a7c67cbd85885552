//! Common test utilities for integration tests

use serde_json::{Value, json};
use veilguard_guardrails::{Guardrails, GuardrailsConfig};

/// Install a test subscriber once; honours RUST_LOG
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub fn default_guardrails() -> Guardrails {
    Guardrails::from_config(&GuardrailsConfig::default()).expect("default config is valid")
}

/// Prompt variables for a lead hand-off email
#[allow(dead_code)]
pub fn lead_handoff_variables() -> Value {
    json!({
        "lead": {
            "email": "jane@example.com",
            "phone": "(555) 123-4567",
            "stage": "negotiation",
            "budget": 725000,
            "preapproved": true
        },
        "agent": {
            "email": "john@example.com",
            "listings": [
                { "address": "12 Harbor View", "contact": "john@example.com" },
                { "address": "8 Elm Court", "contact": "front-desk@brokerage.com" }
            ]
        },
        "notes": null
    })
}
