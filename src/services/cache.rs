use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Thread-safe response cache with one time-to-live for every entry.
///
/// Expired entries are kept until overwritten so a caller can still
/// tell "stale" apart from "never fetched".
pub struct Cache<V> {
    data: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V: Clone> Cache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let entry = self.data.get(key)?;
        if self.expired(&entry, now) {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Store `value`, restarting its lifetime.
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.put_at(key, value, Instant::now());
    }

    pub fn put_at(&self, key: impl Into<String>, value: V, now: Instant) {
        self.data.insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: now,
            },
        );
    }

    /// True when `key` was never stored or its lifetime has passed.
    pub fn is_expired(&self, key: &str) -> bool {
        self.is_expired_at(key, Instant::now())
    }

    pub fn is_expired_at(&self, key: &str, now: Instant) -> bool {
        match self.data.get(key) {
            Some(entry) => self.expired(&entry, now),
            None => true,
        }
    }

    pub fn clear(&self) {
        self.data.clear();
    }

    fn expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) >= self.ttl
    }
}
