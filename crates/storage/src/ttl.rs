//! TTL (Time-To-Live) index for efficient expiration cleanup
//!
//! Maps expiry instant → set of status keys using a BTreeMap, so
//! `find_expired()` costs O(expired count) instead of O(total records).

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

/// TTL index: expiry instant → keys
#[derive(Debug, Default)]
pub struct TtlIndex {
    index: BTreeMap<Instant, HashSet<String>>,
}

impl TtlIndex {
    /// Create a new empty TtlIndex
    pub fn new() -> Self {
        Self {
            index: BTreeMap::new(),
        }
    }

    /// Add key to the index with the given expiry
    pub fn insert(&mut self, expires_at: Instant, key: String) {
        self.index.entry(expires_at).or_default().insert(key);
    }

    /// Remove key from the index at the given expiry
    ///
    /// Used when a key is overwritten with a new expiry.
    /// If the set becomes empty, removes the instant entirely.
    pub fn remove(&mut self, expires_at: Instant, key: &str) {
        if let Some(keys) = self.index.get_mut(&expires_at) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(&expires_at);
            }
        }
    }

    /// All keys whose expiry is at or before `now`
    pub fn find_expired(&self, now: Instant) -> Vec<String> {
        self.index
            .range(..=now)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Drop all entries expired at or before `now`; returns the keys removed
    pub fn remove_expired(&mut self, now: Instant) -> Vec<String> {
        let expired: Vec<Instant> = self.index.range(..=now).map(|(at, _)| *at).collect();

        let mut keys = Vec::new();
        for at in expired {
            if let Some(set) = self.index.remove(&at) {
                keys.extend(set);
            }
        }
        keys
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Total number of keys in the index
    pub fn len(&self) -> usize {
        self.index.values().map(HashSet::len).sum()
    }
}
