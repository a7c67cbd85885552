//! Error types for PII redaction

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Known value dictionary error: {0}")]
    KnownValues(#[from] aho_corasick::BuildError),

    #[error("Nesting depth limit of {limit} exceeded at {path}")]
    NestingTooDeep { path: String, limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a single matcher. The engine skips the matcher and
/// keeps going with the others.
#[derive(Debug, Error)]
#[error("Matcher '{matcher}' failed: {reason}")]
pub struct MatcherError {
    pub matcher: String,
    pub reason: String,
}

impl MatcherError {
    pub fn new(matcher: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            matcher: matcher.into(),
            reason: reason.into(),
        }
    }
}
