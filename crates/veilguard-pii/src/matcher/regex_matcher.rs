//! Regex-based entity matcher

use crate::entity::EntityType;
use crate::error::{Error, MatcherError, Result};
use crate::matcher::{CustomPattern, EntityMatcher, PiiMatch};
use regex::Regex;

type Validator = fn(&str) -> bool;

/// Matcher reporting every regex hit that passes an optional validator
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    name: String,
    entity: EntityType,
    regex: Regex,
    validator: Option<Validator>,
}

impl RegexMatcher {
    /// Create a matcher from a raw pattern
    pub fn new(name: impl Into<String>, entity: EntityType, pattern: &str) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            name: name.clone(),
            source,
        })?;

        Ok(Self {
            name,
            entity,
            regex,
            validator: None,
        })
    }

    /// Only report hits for which `validator` returns true
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn email() -> Result<Self> {
        Self::new(
            "email",
            EntityType::Email,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        )
    }

    /// Phone numbers: (123) 456-7890, 123-456-7890, 123.456.7890, +1 123 456 7890
    pub fn phone() -> Result<Self> {
        Ok(Self::new(
            "phone",
            EntityType::Phone,
            r"(\+?\d{1,3}[-.\s]?)?(\(?\d{3}\)?[-.\s]?)?\d{3}[-.\s]?\d{4}\b",
        )?
        .with_validator(validate_phone))
    }

    /// SSN: 123-45-6789 or 123456789
    pub fn ssn() -> Result<Self> {
        Ok(Self::new("ssn", EntityType::Ssn, r"\b\d{3}-?\d{2}-?\d{4}\b")?
            .with_validator(validate_ssn))
    }

    /// 13-19 digit card numbers with optional spaces or dashes
    pub fn credit_card() -> Result<Self> {
        Ok(Self::new(
            "credit_card",
            EntityType::CreditCard,
            r"\b(?:\d{4}[-\s]?){3}\d{1,7}\b",
        )?
        .with_validator(validate_credit_card))
    }

    /// IPv4 and full-form IPv6 addresses
    pub fn ip_address() -> Result<Self> {
        Self::new(
            "ip_address",
            EntityType::IpAddress,
            r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b|\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b",
        )
    }

    pub fn custom(pattern: &CustomPattern) -> Result<Self> {
        Self::new(pattern.name.clone(), pattern.entity, &pattern.pattern)
    }
}

impl EntityMatcher for RegexMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn entity_types(&self) -> Vec<EntityType> {
        vec![self.entity]
    }

    fn find(&self, text: &str) -> std::result::Result<Vec<PiiMatch>, MatcherError> {
        let matches = self
            .regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .filter(|m| self.validator.is_none_or(|validate| validate(m.as_str())))
            .map(|m| PiiMatch::new(self.entity, m.start(), m.end(), m.as_str()))
            .collect();

        Ok(matches)
    }
}

fn digits_of(text: &str) -> Vec<u32> {
    text.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Luhn checksum over 13-19 digits
fn validate_credit_card(number: &str) -> bool {
    let digits = digits_of(number);

    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }

    let checksum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    checksum.is_multiple_of(10)
}

fn validate_ssn(ssn: &str) -> bool {
    let digits: String = ssn.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() != 9 {
        return false;
    }

    // No all-zero group
    if digits.starts_with("000") || digits[3..5] == *"00" || digits[5..9] == *"0000" {
        return false;
    }

    // 666 and 9xx areas are never issued
    !(digits.starts_with("666") || digits.starts_with('9'))
}

fn validate_phone(phone: &str) -> bool {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 10 || digits.len() > 15 {
        return false;
    }

    // 11 digits means a US/Canada country code
    !(digits.len() == 11 && !digits.starts_with('1'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(matcher: &RegexMatcher, text: &str) -> Vec<PiiMatch> {
        matcher.find(text).unwrap()
    }

    #[test]
    fn test_email_detection() {
        let matcher = RegexMatcher::email().unwrap();
        let matches = find(&matcher, "Contact me at john.doe@example.com for more info.");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].entity, EntityType::Email);
        assert_eq!(matches[0].value, "john.doe@example.com");
        assert_eq!(matches[0].start, 14);
        assert_eq!(matches[0].end, 34);
    }

    #[test]
    fn test_email_tld_is_letters_only() {
        let matcher = RegexMatcher::email().unwrap();
        assert!(find(&matcher, "user@host.c|m").is_empty());
    }

    #[test]
    fn test_phone_detection() {
        let matcher = RegexMatcher::phone().unwrap();
        let matches = find(&matcher, "Call me at (555) 123-4567 or 555-987-6543.");

        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.entity == EntityType::Phone));
    }

    #[test]
    fn test_phone_rejects_short_numbers() {
        let matcher = RegexMatcher::phone().unwrap();
        assert!(find(&matcher, "Extension 123-4567").is_empty());
    }

    #[test]
    fn test_ssn_detection() {
        let matcher = RegexMatcher::ssn().unwrap();

        let matches = find(&matcher, "My SSN is 123-45-6789");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value, "123-45-6789");

        assert!(find(&matcher, "Bad SSN: 000-12-3456").is_empty());
        assert!(find(&matcher, "Bad SSN: 666-12-3456").is_empty());
        assert!(find(&matcher, "Bad SSN: 912-12-3456").is_empty());
        assert!(find(&matcher, "Bad SSN: 123-00-3456").is_empty());
    }

    #[test]
    fn test_credit_card_detection() {
        let matcher = RegexMatcher::credit_card().unwrap();

        // 4532015112830366 passes Luhn
        let matches = find(&matcher, "Card: 4532-0151-1283-0366");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].entity, EntityType::CreditCard);

        assert!(find(&matcher, "Bad card: 4532-0151-1283-0367").is_empty());
    }

    #[test]
    fn test_ip_detection() {
        let matcher = RegexMatcher::ip_address().unwrap();
        let text = "Server IP: 192.168.1.1 and IPv6: 2001:0db8:85a3:0000:0000:8a2e:0370:7334";
        let matches = find(&matcher, text);

        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.entity == EntityType::IpAddress));
    }

    #[test]
    fn test_custom_pattern() {
        let matcher = RegexMatcher::custom(&CustomPattern {
            name: "street".to_string(),
            entity: EntityType::Address,
            pattern: r"\d+ [A-Z][a-z]+ (?:Street|Avenue|Road)".to_string(),
        })
        .unwrap();

        let matches = find(&matcher, "Ship to 42 Maple Street please");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].entity, EntityType::Address);
        assert_eq!(matches[0].value, "42 Maple Street");
        assert_eq!(matcher.name(), "street");
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let result = RegexMatcher::custom(&CustomPattern {
            name: "broken".to_string(),
            entity: EntityType::Name,
            pattern: "[invalid(".to_string(),
        });

        match result {
            Err(Error::InvalidPattern { name, .. }) => assert_eq!(name, "broken"),
            other => panic!("expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_matches_are_dropped() {
        let matcher = RegexMatcher::new("empty", EntityType::Name, r"x*").unwrap();
        assert!(find(&matcher, "abc").is_empty());
    }

    #[test]
    fn test_luhn() {
        assert!(validate_credit_card("4532015112830366"));
        assert!(!validate_credit_card("1234567890123456"));
        assert!(!validate_credit_card("4532"));
    }
}
