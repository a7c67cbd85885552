//! Entity matchers

mod known_values;
mod regex_matcher;

pub use known_values::KnownValueMatcher;
pub use regex_matcher::RegexMatcher;

use crate::entity::EntityType;
use crate::error::{MatcherError, Result};
use serde::{Deserialize, Serialize};

/// A detected PII span within one input string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiMatch {
    /// Entity type the span was classified as
    pub entity: EntityType,

    /// Start byte offset in the text
    pub start: usize,

    /// End byte offset in the text (exclusive)
    pub end: usize,

    /// The matched text
    pub value: String,
}

impl PiiMatch {
    pub fn new(entity: EntityType, start: usize, end: usize, value: impl Into<String>) -> Self {
        Self {
            entity,
            start,
            end,
            value: value.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &PiiMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Trait for finding PII spans in text.
///
/// Implementations are stateless. Returned spans are sorted by `start` and do
/// not overlap each other; overlaps across matchers are resolved by the engine.
pub trait EntityMatcher: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Entity types this matcher can report
    fn entity_types(&self) -> Vec<EntityType>;

    /// Find PII spans in `text`
    fn find(&self, text: &str) -> std::result::Result<Vec<PiiMatch>, MatcherError>;
}

/// Configuration for the matcher set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Enable email detection
    #[serde(default = "default_true")]
    pub detect_email: bool,

    /// Enable phone number detection
    #[serde(default = "default_true")]
    pub detect_phone: bool,

    /// Enable SSN detection
    #[serde(default = "default_true")]
    pub detect_ssn: bool,

    /// Enable credit card detection
    #[serde(default = "default_true")]
    pub detect_credit_card: bool,

    /// Enable IP address detection
    #[serde(default = "default_true")]
    pub detect_ip_address: bool,

    /// Extra regex patterns mapped onto entity types
    #[serde(default)]
    pub custom_patterns: Vec<CustomPattern>,

    /// Literal values known to be PII
    #[serde(default)]
    pub known_values: Vec<KnownValues>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            detect_email: true,
            detect_phone: true,
            detect_ssn: true,
            detect_credit_card: true,
            detect_ip_address: true,
            custom_patterns: Vec::new(),
            known_values: Vec::new(),
        }
    }
}

impl MatcherConfig {
    /// Turn off the built-in matcher for `entity`, if there is one
    pub fn disable(&mut self, entity: EntityType) {
        match entity {
            EntityType::Email => self.detect_email = false,
            EntityType::Phone => self.detect_phone = false,
            EntityType::Ssn => self.detect_ssn = false,
            EntityType::CreditCard => self.detect_credit_card = false,
            EntityType::IpAddress => self.detect_ip_address = false,
            EntityType::Name | EntityType::Address => {}
        }
    }

    /// Compile the configured matchers
    pub fn build(&self) -> Result<Vec<Box<dyn EntityMatcher>>> {
        let mut matchers: Vec<Box<dyn EntityMatcher>> = Vec::new();

        if self.detect_ssn {
            matchers.push(Box::new(RegexMatcher::ssn()?));
        }
        if self.detect_credit_card {
            matchers.push(Box::new(RegexMatcher::credit_card()?));
        }
        if self.detect_email {
            matchers.push(Box::new(RegexMatcher::email()?));
        }
        if self.detect_ip_address {
            matchers.push(Box::new(RegexMatcher::ip_address()?));
        }
        if self.detect_phone {
            matchers.push(Box::new(RegexMatcher::phone()?));
        }

        for pattern in &self.custom_patterns {
            matchers.push(Box::new(RegexMatcher::custom(pattern)?));
        }

        for known in &self.known_values {
            if let Some(matcher) = KnownValueMatcher::new(known.entity, &known.values)? {
                matchers.push(Box::new(matcher));
            }
        }

        Ok(matchers)
    }
}

/// Custom regex pattern for detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPattern {
    /// Name of the pattern, used in logs
    pub name: String,

    /// Entity type reported for matches
    pub entity: EntityType,

    /// Regex pattern
    pub pattern: String,
}

/// Literal values of one entity type to always redact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownValues {
    pub entity: EntityType,
    pub values: Vec<String>,
}

fn default_true() -> bool {
    true
}
