//! Entity types recognised by the matchers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of PII a span was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// Email address
    Email,

    /// Phone number
    Phone,

    /// Social Security Number
    Ssn,

    /// Credit card number
    CreditCard,

    /// IPv4 or IPv6 address
    IpAddress,

    /// Person name
    Name,

    /// Postal address
    Address,
}

impl EntityType {
    pub const ALL: [EntityType; 7] = [
        EntityType::Email,
        EntityType::Phone,
        EntityType::Ssn,
        EntityType::CreditCard,
        EntityType::IpAddress,
        EntityType::Name,
        EntityType::Address,
    ];

    /// Uppercase tag used inside placeholder tokens
    pub fn tag(self) -> &'static str {
        match self {
            EntityType::Email => "EMAIL",
            EntityType::Phone => "PHONE",
            EntityType::Ssn => "SSN",
            EntityType::CreditCard => "CREDIT_CARD",
            EntityType::IpAddress => "IP_ADDRESS",
            EntityType::Name => "NAME",
            EntityType::Address => "ADDRESS",
        }
    }

    /// Overlap resolution rank. Higher wins.
    pub fn priority(self) -> u8 {
        match self {
            EntityType::Ssn => 90,
            EntityType::CreditCard => 80,
            EntityType::Email => 70,
            EntityType::IpAddress => 60,
            EntityType::Phone => 50,
            EntityType::Address => 40,
            EntityType::Name => 30,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown entity type tag: {0}")]
pub struct ParseEntityTypeError(pub String);

impl FromStr for EntityType {
    type Err = ParseEntityTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase();
        EntityType::ALL
            .into_iter()
            .find(|entity| entity.tag() == tag)
            .ok_or(ParseEntityTypeError(s.to_string()))
    }
}
