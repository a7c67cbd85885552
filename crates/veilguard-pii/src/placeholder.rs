//! Placeholder token grammar
//!
//! Placeholders have the form `[TYPE_N]`: an uppercase tag made of letters and
//! underscores, an underscore, and a 1-based decimal sequence number, all inside
//! square brackets. The grammar is a stable wire format; text persisted with
//! placeholders can be restored later from the matching [`RedactionMap`].

use crate::entity::EntityType;
use crate::state::RedactionMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Matches any placeholder-shaped token, known tag or not
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Z_]+)_([0-9]+)\]").unwrap());

/// Build the placeholder for the `n`th value of `entity`
pub fn format_placeholder(entity: EntityType, n: u64) -> String {
    format!("[{}_{}]", entity.tag(), n)
}

/// Split a placeholder into its entity type and sequence number.
///
/// Returns `None` for text that is not exactly one placeholder or whose tag is
/// not a known entity type.
pub fn parse_placeholder(token: &str) -> Option<(EntityType, u64)> {
    let caps = PLACEHOLDER_REGEX.captures(token)?;
    let whole = caps.get(0)?;
    if whole.start() != 0 || whole.end() != token.len() {
        return None;
    }
    let entity = caps[1].parse().ok()?;
    let n = caps[2].parse().ok()?;
    Some((entity, n))
}

/// Whether `text` contains at least one placeholder-shaped token
pub fn contains_placeholder(text: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(text)
}

/// Byte ranges of every placeholder-shaped token in `text`, in order
pub fn placeholder_spans(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    PLACEHOLDER_REGEX.find_iter(text).map(|m| m.range())
}

/// Replace every placeholder in `text` with its original value.
///
/// Tokens without an entry in `map` are left verbatim; a model may echo
/// truncated or invented placeholders and those must not fail the response.
/// Substitution is single pass, so restored values are never re-expanded.
pub fn restore_output(text: &str, map: &RedactionMap) -> String {
    let mut unknown = 0usize;
    let restored = PLACEHOLDER_REGEX.replace_all(text, |caps: &regex::Captures| {
        let token = &caps[0];
        match map.get(token) {
            Some(value) => value.to_string(),
            None => {
                unknown += 1;
                token.to_string()
            }
        }
    });

    if unknown > 0 {
        tracing::warn!(unknown, "Left unresolved placeholders in restored output");
    }

    restored.into_owned()
}
