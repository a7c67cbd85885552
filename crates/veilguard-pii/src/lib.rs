//! Veilguard PII Redaction
//!
//! This crate keeps personally identifiable information out of language model
//! prompts while letting the model work with stable placeholder tokens:
//! - Pluggable entity matchers (email, phone, SSN, credit card, IP, custom)
//! - A per-turn redaction state allocating `[TYPE_N]` placeholders
//! - Text and JSON tree redaction with overlap resolution
//! - Restoration of original values from model output

pub mod engine;
pub mod entity;
pub mod error;
pub mod matcher;
pub mod placeholder;
pub mod state;

pub use engine::{RedactedText, RedactedTree, RedactionEngine, RedactionStrategy, Replacement};
pub use entity::{EntityType, ParseEntityTypeError};
pub use error::{Error, MatcherError, Result};
pub use matcher::{
    CustomPattern, EntityMatcher, KnownValueMatcher, KnownValues, MatcherConfig, PiiMatch,
    RegexMatcher,
};
pub use placeholder::{contains_placeholder, restore_output};
pub use state::{PlaceholderAllocator, RedactionMap, RedactionState, SharedRedactionState};
