//! Dictionary matcher for literal values known to be PII

use crate::entity::EntityType;
use crate::error::{MatcherError, Result};
use crate::matcher::{EntityMatcher, PiiMatch};
use aho_corasick::{AhoCorasick, MatchKind};

/// Finds whole-word, ASCII case-insensitive occurrences of known values.
///
/// Useful for entity types without a reliable pattern, such as the names of
/// the people a prompt is about.
#[derive(Debug, Clone)]
pub struct KnownValueMatcher {
    name: String,
    entity: EntityType,
    automaton: AhoCorasick,
}

impl KnownValueMatcher {
    /// Build a matcher for `values`. Returns `None` when no non-blank value is given.
    pub fn new<S: AsRef<str>>(entity: EntityType, values: &[S]) -> Result<Option<Self>> {
        let patterns: Vec<&str> = values
            .iter()
            .map(|v| v.as_ref().trim())
            .filter(|v| !v.is_empty())
            .collect();

        if patterns.is_empty() {
            return Ok(None);
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)?;

        Ok(Some(Self {
            name: format!("known_{}", entity.tag().to_ascii_lowercase()),
            entity,
            automaton,
        }))
    }
}

impl EntityMatcher for KnownValueMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn entity_types(&self) -> Vec<EntityType> {
        vec![self.entity]
    }

    fn find(&self, text: &str) -> std::result::Result<Vec<PiiMatch>, MatcherError> {
        let matches = self
            .automaton
            .find_iter(text)
            .filter(|m| is_word_boundary(text, m.start(), m.end()))
            .map(|m| PiiMatch::new(self.entity, m.start(), m.end(), &text[m.start()..m.end()]))
            .collect();

        Ok(matches)
    }
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}
