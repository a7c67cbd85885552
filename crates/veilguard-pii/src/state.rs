//! Redaction state shared by every call of one conversation turn

mod shared;

pub use shared::SharedRedactionState;

use crate::entity::EntityType;
use crate::placeholder::{format_placeholder, restore_output};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder to original value, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedactionMap(IndexMap<String, String>);

impl RedactionMap {
    /// Original value behind a placeholder
    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.0.get(placeholder).map(String::as_str)
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        self.0.contains_key(placeholder)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in allocation order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Put original values back into `text`
    pub fn restore(&self, text: &str) -> String {
        restore_output(text, self)
    }

    pub(crate) fn insert(&mut self, placeholder: String, value: String) {
        self.0.insert(placeholder, value);
    }

    pub(crate) fn remove(&mut self, placeholder: &str) -> Option<String> {
        // shift_remove keeps the remaining entries in first-seen order
        self.0.shift_remove(placeholder)
    }
}

impl FromIterator<(String, String)> for RedactionMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The single seam through which redaction mutates state
pub trait PlaceholderAllocator {
    /// Placeholder for `value`, allocating a new one only for unseen values
    fn allocate_placeholder(&mut self, entity: EntityType, value: &str) -> String;
}

/// Placeholder mapping and per-type counters for one unit of work.
///
/// Create one per conversation turn and pass it by `&mut` to every call that
/// has to agree on numbering. Cloning a state forks the numbering; pass the
/// same value forward instead when a later turn must stay consistent.
#[derive(Debug, Clone, Default)]
pub struct RedactionState {
    redaction_map: RedactionMap,
    value_index: HashMap<(EntityType, String), String>,
    counters: HashMap<EntityType, u64>,
}

impl RedactionState {
    /// Empty state: no entries, every counter at 1
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redaction_map(&self) -> &RedactionMap {
        &self.redaction_map
    }

    /// Sequence number the next new value of `entity` will receive
    pub fn next_number(&self, entity: EntityType) -> u64 {
        self.counters.get(&entity).copied().unwrap_or(1)
    }

    /// Placeholder already allocated for `value`, if any
    pub fn placeholder_for(&self, entity: EntityType, value: &str) -> Option<&str> {
        self.value_index
            .get(&(entity, value.to_string()))
            .map(String::as_str)
    }

    /// Drop an entry from the map and the value index.
    ///
    /// The counter is left untouched, so the number is never handed out again
    /// and re-redacting the same value yields a fresh placeholder.
    pub fn forget(&mut self, placeholder: &str) -> Option<String> {
        let value = self.redaction_map.remove(placeholder)?;
        self.value_index.retain(|_, existing| existing != placeholder);
        Some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.redaction_map.is_empty()
    }

    /// Owned copy of the current map
    pub fn snapshot(&self) -> RedactionMap {
        self.redaction_map.clone()
    }
}

impl PlaceholderAllocator for RedactionState {
    fn allocate_placeholder(&mut self, entity: EntityType, value: &str) -> String {
        let key = (entity, value.to_string());
        if let Some(existing) = self.value_index.get(&key) {
            return existing.clone();
        }

        let counter = self.counters.entry(entity).or_insert(1);
        let n = *counter;
        *counter += 1;

        let placeholder = format_placeholder(entity, n);
        self.redaction_map
            .insert(placeholder.clone(), value.to_string());
        self.value_index.insert(key, placeholder.clone());

        tracing::trace!(entity = %entity, placeholder = %placeholder, "Allocated placeholder");

        placeholder
    }
}
