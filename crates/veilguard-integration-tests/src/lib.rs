//! Integration tests for Veilguard
//!
//! Exercises whole conversation turns across the pii and guardrails crates.
