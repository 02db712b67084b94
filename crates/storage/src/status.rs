//! MemoryStatusStore: key/value status store with per-key expiry
//!
//! Values live in a `DashMap` keyed by status key; a [`TtlIndex`] behind a
//! `parking_lot::Mutex` tracks expiry so the sweeper can purge in
//! O(expired). Expired values are also filtered at read time, so a reader
//! never sees a stale record even if the sweeper has not run yet.
//!
//! `set_available(false)` simulates a lost connection: every call then fails
//! with `StatusStoreUnavailable`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::trace;

use bulkops_core::{Error, Result, StatusStore};

use crate::ttl::TtlIndex;

#[derive(Debug, Clone)]
struct StoredStatus {
    value: String,
    expires_at: Instant,
}

impl StoredStatus {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-memory [`StatusStore`] with expiry
#[derive(Debug)]
pub struct MemoryStatusStore {
    data: DashMap<String, StoredStatus>,
    ttl_index: Mutex<TtlIndex>,
    available: AtomicBool,
}

impl Default for MemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStatusStore {
    /// Create an empty, reachable store
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            ttl_index: Mutex::new(TtlIndex::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate losing (false) or regaining (true) the connection
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of records held, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if no records are held
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Remove every record expired at or before `now`; returns how many were removed
    pub fn purge_expired(&self, now: Instant) -> usize {
        let keys = self.ttl_index.lock().remove_expired(now);
        let mut removed = 0;
        for key in keys {
            // A later set may have extended the record; only drop it if still expired
            if self
                .data
                .remove_if(&key, |_, stored| stored.is_expired(now))
                .is_some()
            {
                removed += 1;
            }
        }
        if removed > 0 {
            trace!(target: "bulkops::storage", removed, "Purged expired status records");
        }
        removed
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::StatusStoreUnavailable {
                reason: "connection refused".to_string(),
            })
        }
    }
}

impl StatusStore for MemoryStatusStore {
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check_available()?;
        let expires_at = Instant::now().checked_add(ttl).ok_or_else(|| {
            Error::invalid_input(format!("status ttl of {}s is out of range", ttl.as_secs()))
        })?;
        let previous = self.data.insert(
            key.to_string(),
            StoredStatus {
                value: value.to_string(),
                expires_at,
            },
        );

        let mut index = self.ttl_index.lock();
        if let Some(previous) = previous {
            index.remove(previous.expires_at, key);
        }
        index.insert(expires_at, key.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        let now = Instant::now();
        Ok(self
            .data
            .get(key)
            .filter(|stored| !stored.is_expired(now))
            .map(|stored| stored.value.clone()))
    }
}
