//! Resolving context: tracks which keys are on the active resolution stack
//!
//! Keys are fixture ids and parameter names. A key is added when its
//! resolution starts and released once it has completed; entering a key
//! whose count is already 1 raises it to 2, which is a cycle.

use std::collections::BTreeMap;

use crate::error::CircularReferenceError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvingContext {
    resolving: BTreeMap<String, u32>,
}

impl ResolvingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse `existing` or start a fresh context, registering `key` if it is
    /// not already known
    pub fn create_from(existing: Option<ResolvingContext>, key: &str) -> ResolvingContext {
        let mut context = existing.unwrap_or_default();
        if !context.has(key) {
            context.add(key);
        }
        context
    }

    pub fn has(&self, key: &str) -> bool {
        self.resolving.contains_key(key)
    }

    pub fn add(&mut self, key: &str) {
        *self.resolving.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Leave the resolution of `key`. The key stays known with a count of 0.
    pub fn release(&mut self, key: &str) {
        if let Some(count) = self.resolving.get_mut(key) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn count(&self, key: &str) -> u32 {
        self.resolving.get(key).copied().unwrap_or(0)
    }

    pub fn check_for_circular_reference(&self, key: &str) -> Result<(), CircularReferenceError> {
        if self.count(key) > 1 {
            return Err(CircularReferenceError {
                key: key.to_string(),
                resolving: self.resolving.clone(),
            });
        }
        Ok(())
    }

    pub fn counts(&self) -> &BTreeMap<String, u32> {
        &self.resolving
    }
}
