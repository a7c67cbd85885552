//! End-to-end guardrail flow for one conversation turn

mod common;

use common::{default_guardrails, init_tracing, lead_handoff_variables};
use serde_json::json;
use veilguard_guardrails::{GuardedTurn, TurnPhase, render_prompt};
use veilguard_pii::{RedactionStrategy, restore_output};

#[test]
fn test_numbering_across_calls_on_one_state() {
    let guardrails = default_guardrails();
    let engine = guardrails.engine();
    let mut state = guardrails.create_redaction_state();

    let first = engine.redact_with("Email a@example.com", &mut state, RedactionStrategy::Placeholder);
    assert!(first.text.contains("[EMAIL_1]"));

    let second = engine.redact_with("Email b@example.com", &mut state, RedactionStrategy::Placeholder);
    assert!(second.text.contains("[EMAIL_2]"));

    assert_eq!(state.redaction_map().get("[EMAIL_1]"), Some("a@example.com"));
    assert_eq!(state.redaction_map().get("[EMAIL_2]"), Some("b@example.com"));

    let restored = restore_output("Contact: [EMAIL_1] + [EMAIL_2]", state.redaction_map());
    assert_eq!(restored, "Contact: a@example.com + b@example.com");
}

#[test]
fn test_variables_prompt_and_restore() {
    init_tracing();
    let guardrails = default_guardrails();

    let variables = json!({
        "lead": { "email": "jane@example.com" },
        "agent": { "email": "john@example.com" }
    });
    let mut guarded = guardrails.apply_variable_guardrails(&variables, None).unwrap();

    assert!(guarded.pii_redacted);
    let lead_email = guarded.variables["lead"]["email"].as_str().unwrap().to_string();
    let agent_email = guarded.variables["agent"]["email"].as_str().unwrap().to_string();
    assert_ne!(lead_email, agent_email);
    assert_eq!(guarded.redaction_map.len(), 2);

    let user_prompt = render_prompt(
        "Draft an email to ${lead.email} and CC ${agent.email}.",
        &guarded.variables,
    );
    let input = guardrails.apply_input_guardrails(
        "You are an assistant for a real-estate brokerage.",
        &user_prompt,
        guarded.redaction_state.as_mut(),
    );

    assert_eq!(input.user_prompt, user_prompt);
    assert!(input.pii_redacted);

    tracing::info!(prompt = %input.user_prompt, "Prompt handed to model");

    let model_output = "Draft email to [EMAIL_1] and CC [EMAIL_2].";
    let restored = guardrails.restore_output(model_output, &input.redaction_map);
    assert_eq!(
        restored,
        "Draft email to jane@example.com and CC john@example.com."
    );
}

#[test]
fn test_nested_tree_dedup_and_order() {
    let guardrails = default_guardrails();

    let guarded = guardrails
        .apply_variable_guardrails(&lead_handoff_variables(), None)
        .unwrap();

    assert_eq!(
        guarded.variables,
        json!({
            "lead": {
                "email": "[EMAIL_1]",
                "phone": "[PHONE_1]",
                "stage": "negotiation",
                "budget": 725000,
                "preapproved": true
            },
            "agent": {
                "email": "[EMAIL_2]",
                "listings": [
                    { "address": "12 Harbor View", "contact": "[EMAIL_2]" },
                    { "address": "8 Elm Court", "contact": "[EMAIL_3]" }
                ]
            },
            "notes": null
        })
    );

    let placeholders: Vec<&str> = guarded.redaction_map.placeholders().collect();
    assert_eq!(placeholders, vec!["[EMAIL_1]", "[PHONE_1]", "[EMAIL_2]", "[EMAIL_3]"]);
}

#[test]
fn test_guarded_turn_lifecycle() {
    let guardrails = default_guardrails();
    let mut turn = GuardedTurn::new(&guardrails);

    let variables = turn.redact_variables(&lead_handoff_variables()).unwrap();
    let system_prompt = render_prompt("Agent contact: ${agent.email}", &variables);
    let user_prompt = render_prompt(
        "Call ${lead.phone} about ${agent.listings.1.address}, then email ${lead.email}.",
        &variables,
    );

    let prompt = turn.guard_prompt(&system_prompt, &user_prompt).unwrap();
    assert_eq!(prompt.system_prompt, "Agent contact: [EMAIL_2]");
    assert_eq!(
        prompt.user_prompt,
        "Call [PHONE_1] about 8 Elm Court, then email [EMAIL_1]."
    );

    turn.record_response("I will call [PHONE_1] and email [EMAIL_1]; [EMAIL_9] is unknown.")
        .unwrap();
    let output = turn.restore_output().unwrap();
    assert_eq!(
        output,
        "I will call (555) 123-4567 and email jane@example.com; [EMAIL_9] is unknown."
    );
    assert_eq!(turn.phase(), TurnPhase::OutputRestored);

    let state = turn.finish().unwrap();
    assert_eq!(state.redaction_map().len(), 4);
}

#[test]
fn test_round_trip_through_restoration() {
    let guardrails = default_guardrails();
    let engine = guardrails.engine();
    let mut state = guardrails.create_redaction_state();

    let texts = [
        "Lead Jane (jane@example.com, 555-123-4567) wants a tour.",
        "SSN on file: 123-45-6789. Card 4532-0151-1283-0366 for the deposit.",
        "Office router at 192.168.10.1 forwarded john@example.com",
        "Nothing to hide here.",
        " -+a@b.com1685551924567",
        "4567678945674503664567+0366",
    ];

    for text in texts {
        let redacted = engine.redact(text, &mut state);
        assert!(!redacted.text.contains('@'));
        assert_eq!(restore_output(&redacted.text, state.redaction_map()), text);

        let again = engine.redact(&redacted.text, &mut state);
        assert_eq!(again.text, redacted.text);
    }
}
