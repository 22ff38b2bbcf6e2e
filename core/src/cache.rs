//! Expiring cache for merged upstream records.
//!
//! # Design
//! `ResponseCache` is the seam a host plugs its own store into, such as a
//! CMS transient store. `MemoryCache` is the in-process implementation: a map
//! behind an `RwLock`, with expiry evaluated against a `Clock` so tests can
//! move time forward.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::types::Record;

/// Key-value store with per-entry expiry.
pub trait ResponseCache {
    /// Returns the entry for `key` if it exists and has not expired.
    fn get(&self, key: &str) -> Option<Record>;

    /// Stores `record` under `key` for `ttl`.
    fn set(&self, key: &str, record: Record, ttl: Duration);
}

impl<C: ResponseCache + ?Sized> ResponseCache for Arc<C> {
    fn get(&self, key: &str) -> Option<Record> {
        (**self).get(key)
    }

    fn set(&self, key: &str, record: Record, ttl: Duration) {
        (**self).set(key, record, ttl)
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if let Ok(delta) = chrono::Duration::from_std(by) {
            if let Some(next) = now.checked_add_signed(delta) {
                *now = next;
            }
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    record: Record,
    expires_at: DateTime<Utc>,
}

/// In-memory `ResponseCache`.
pub struct MemoryCache<K: Clock = SystemClock> {
    entries: RwLock<HashMap<String, Entry>>,
    clock: K,
}

impl MemoryCache<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clock> MemoryCache<K> {
    pub fn with_clock(clock: K) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, expired ones included until next access.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Clock> ResponseCache for MemoryCache<K> {
    fn get(&self, key: &str) -> Option<Record> {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.record.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, record: Record, ttl: Duration) {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl));
        let Some(expires_at) = expires_at else {
            warn!(key, "cache ttl out of range, entry not stored");
            return;
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), Entry { record, expires_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const HOUR: Duration = Duration::from_secs(3600);

    fn record(clicks: u64) -> Record {
        json!({ "Clicks": clicks }).as_object().unwrap().clone()
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn returns_stored_record_before_expiry() {
        let clock = clock();
        let cache = MemoryCache::with_clock(clock.clone());
        cache.set("post-1", record(5), 4 * HOUR);

        clock.advance(3 * HOUR);
        assert_eq!(cache.get("post-1"), Some(record(5)));
    }

    #[test]
    fn drops_record_once_ttl_has_elapsed() {
        let clock = clock();
        let cache = MemoryCache::with_clock(clock.clone());
        cache.set("post-1", record(5), 4 * HOUR);

        clock.advance(4 * HOUR);
        assert_eq!(cache.get("post-1"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn set_replaces_existing_entry_and_restarts_ttl() {
        let clock = clock();
        let cache = MemoryCache::with_clock(clock.clone());
        cache.set("post-1", record(5), HOUR);
        clock.advance(Duration::from_secs(1800));
        cache.set("post-1", record(9), HOUR);
        clock.advance(Duration::from_secs(1800));

        assert_eq!(cache.get("post-1"), Some(record(9)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_are_independent() {
        let cache = MemoryCache::new();
        cache.set("post-1", record(1), HOUR);
        assert_eq!(cache.get("post-2"), None);
        assert_eq!(cache.get("post-1"), Some(record(1)));
    }

    #[test]
    fn shared_cache_through_arc() {
        let cache = Arc::new(MemoryCache::new());
        let handle = Arc::clone(&cache);
        handle.set("post-1", record(2), HOUR);
        assert_eq!(ResponseCache::get(&cache, "post-1"), Some(record(2)));
    }
}
