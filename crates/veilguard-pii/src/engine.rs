//! Redaction engine
//!
//! Runs every matcher over the input, resolves overlapping candidates and
//! rewrites the text left to right. Placeholder-shaped substrings are cut out
//! before matchers run, and detection repeats over the remaining gaps until it
//! settles, which makes redaction idempotent.

mod tree;

pub use tree::RedactedTree;

use crate::entity::EntityType;
use crate::error::{MatcherError, Result};
use crate::matcher::{EntityMatcher, MatcherConfig, PiiMatch};
use crate::placeholder::placeholder_spans;
use crate::state::PlaceholderAllocator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};

/// How a detected span is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionStrategy {
    /// Reversible `[TYPE_N]` token allocated through the redaction state
    #[default]
    Placeholder,

    /// Irreversible `[TYPE]` label
    Mask,

    /// Irreversible, keeps the last `visible` characters
    Partial { visible: usize },
}

/// One rewritten span. Never carries the original value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub entity: EntityType,

    /// Start byte offset in the input text
    pub start: usize,

    /// End byte offset in the input text (exclusive)
    pub end: usize,

    /// Text written in place of the span
    pub replacement: String,
}

/// Result of redacting one string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactedText {
    pub text: String,

    /// True iff at least one span was substituted
    pub changed: bool,

    pub replacements: Vec<Replacement>,
}

impl RedactedText {
    fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            changed: false,
            replacements: Vec::new(),
        }
    }
}

/// Applies a set of matchers against a redaction state
pub struct RedactionEngine {
    matchers: Vec<Box<dyn EntityMatcher>>,
    max_depth: usize,
}

impl RedactionEngine {
    /// Deepest container nesting [`RedactionEngine::redact_tree`] accepts
    pub const DEFAULT_MAX_DEPTH: usize = 128;

    pub fn new(matchers: Vec<Box<dyn EntityMatcher>>) -> Self {
        Self {
            matchers,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Engine with the matchers described by `config`
    pub fn from_config(config: &MatcherConfig) -> Result<Self> {
        Ok(Self::new(config.build()?))
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn matchers(&self) -> impl Iterator<Item = &dyn EntityMatcher> {
        self.matchers.iter().map(|m| m.as_ref())
    }

    /// Merged, non-overlapping matches in `text`, sorted by start.
    ///
    /// Matchers are rerun on the gaps left between accepted spans until a round
    /// finds nothing. A gap is exactly what a later pass over the redacted text
    /// would hand the matchers, so redacting the output again is a no-op.
    pub fn detect(&self, text: &str) -> Vec<PiiMatch> {
        let mut reserved: Vec<Range<usize>> = placeholder_spans(text).collect();
        let mut accepted = Vec::new();

        loop {
            let mut candidates = Vec::new();
            let mut offset = 0;

            let end = text.len()..text.len();
            for span in reserved.iter().cloned().chain(std::iter::once(end)) {
                if span.start > offset {
                    self.collect_candidates(&text[offset..span.start], offset, &mut candidates);
                }
                offset = span.end;
            }

            // Every round reserves at least one non-empty span, so this terminates
            let found = resolve_overlaps(candidates);
            if found.is_empty() {
                break;
            }

            reserved.extend(found.iter().map(|m| m.start..m.end));
            reserved.sort_by_key(|span| span.start);
            accepted.extend(found);
        }

        accepted.sort_by_key(|m| m.start);
        accepted
    }

    /// Replace every detected span with a placeholder from `state`
    pub fn redact<A>(&self, text: &str, state: &mut A) -> RedactedText
    where
        A: PlaceholderAllocator + ?Sized,
    {
        self.redact_with(text, state, RedactionStrategy::Placeholder)
    }

    /// Replace every detected span according to `strategy`.
    ///
    /// Only [`RedactionStrategy::Placeholder`] touches `state`.
    pub fn redact_with<A>(&self, text: &str, state: &mut A, strategy: RedactionStrategy) -> RedactedText
    where
        A: PlaceholderAllocator + ?Sized,
    {
        let matches = self.detect(text);
        if matches.is_empty() {
            return RedactedText::unchanged(text);
        }

        let mut result = String::with_capacity(text.len());
        let mut replacements = Vec::with_capacity(matches.len());
        let mut last_end = 0;

        for m in matches {
            result.push_str(&text[last_end..m.start]);

            let replacement = match strategy {
                RedactionStrategy::Placeholder => state.allocate_placeholder(m.entity, &m.value),
                RedactionStrategy::Mask => format!("[{}]", m.entity.tag()),
                RedactionStrategy::Partial { visible } => partial_mask(&m.value, visible),
            };
            result.push_str(&replacement);

            last_end = m.end;
            replacements.push(Replacement {
                entity: m.entity,
                start: m.start,
                end: m.end,
                replacement,
            });
        }

        result.push_str(&text[last_end..]);

        tracing::debug!(
            replacements = replacements.len(),
            strategy = ?strategy,
            "Redacted text"
        );

        RedactedText {
            text: result,
            changed: true,
            replacements,
        }
    }

    /// Run every matcher over one placeholder-free segment
    fn collect_candidates(&self, segment: &str, offset: usize, candidates: &mut Vec<PiiMatch>) {
        for matcher in &self.matchers {
            let found = match find_isolated(matcher.as_ref(), segment) {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(matcher = matcher.name(), error = %e, "Skipping failed matcher");
                    continue;
                }
            };

            for m in found {
                if m.start >= m.end
                    || m.end > segment.len()
                    || !segment.is_char_boundary(m.start)
                    || !segment.is_char_boundary(m.end)
                {
                    tracing::warn!(
                        matcher = matcher.name(),
                        start = m.start,
                        end = m.end,
                        "Discarding invalid match span"
                    );
                    continue;
                }

                // The span is authoritative; the reported value may not be
                candidates.push(PiiMatch::new(
                    m.entity,
                    m.start + offset,
                    m.end + offset,
                    &segment[m.start..m.end],
                ));
            }
        }
    }
}

/// Run one matcher, turning a panic into a [`MatcherError`]
fn find_isolated(
    matcher: &dyn EntityMatcher,
    segment: &str,
) -> std::result::Result<Vec<PiiMatch>, MatcherError> {
    match panic::catch_unwind(AssertUnwindSafe(|| matcher.find(segment))) {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(MatcherError::new(matcher.name(), format!("panicked: {}", reason)))
        }
    }
}

/// Keep the best candidate of every overlapping group: higher priority first,
/// then longer span, then earlier start.
fn resolve_overlaps(mut candidates: Vec<PiiMatch>) -> Vec<PiiMatch> {
    candidates.sort_by(|a, b| {
        b.entity
            .priority()
            .cmp(&a.entity.priority())
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.start.cmp(&b.start))
    });

    // Accepted spans never overlap, so only the closest one starting before
    // the candidate's end can clash with it.
    let mut accepted: BTreeMap<usize, PiiMatch> = BTreeMap::new();
    for candidate in candidates {
        let clashes = accepted
            .range(..candidate.end)
            .next_back()
            .is_some_and(|(_, kept)| kept.end > candidate.start);
        if !clashes {
            accepted.insert(candidate.start, candidate);
        }
    }

    accepted.into_values().collect()
}

fn partial_mask(value: &str, visible: usize) -> String {
    let len = value.chars().count();
    if len <= visible {
        return "*".repeat(len);
    }

    let hidden = len - visible;
    let mut masked = "*".repeat(hidden);
    masked.extend(value.chars().skip(hidden));
    masked
}
