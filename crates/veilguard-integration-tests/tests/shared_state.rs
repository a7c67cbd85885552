//! Parallel redaction of several prompt fields against one turn's state

mod common;

use common::default_guardrails;
use std::collections::HashSet;
use veilguard_pii::{SharedRedactionState, restore_output};

#[test]
fn test_parallel_fields_share_numbering() {
    let guardrails = default_guardrails();
    let engine = guardrails.engine();
    let shared = SharedRedactionState::new(guardrails.create_redaction_state());

    let fields: Vec<String> = (0..8)
        .map(|i| format!("Lead {} wrote from lead{}@example.com and cc'd team@example.com", i, i))
        .collect();

    let redacted: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = fields
            .iter()
            .map(|field| {
                let mut state = shared.clone();
                scope.spawn(move || engine.redact(field, &mut state).text)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let map = shared.snapshot();
    // Eight lead addresses plus one shared team address
    assert_eq!(map.len(), 9);

    let team: HashSet<&str> = redacted
        .iter()
        .map(|text| text.rsplit(' ').next().unwrap())
        .collect();
    assert_eq!(team.len(), 1);

    for (original, text) in fields.iter().zip(&redacted) {
        assert_eq!(&restore_output(text, &map), original);
    }
}
