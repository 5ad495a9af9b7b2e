//! Expiring memo table for fetched universes and metrics tables.
//!
//! `CachedClient` keeps one table keyed by market key (`"sp500"`) and one
//! keyed by the comma-joined ticker list, so a repeated command with the
//! same selection skips the network until the TTL runs out.

use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Memo<V> {
    value: V,
    fetched_at: Instant,
}

/// Concurrent memo table with one TTL for every entry.
///
/// Reads clone the value, so callers store `Arc`s of tables. A stale entry
/// is dropped by the lookup that finds it.
pub struct MemoryCache<V> {
    store: DashMap<String, Memo<V>>,
    ttl: Duration,
}

impl<V: Clone> MemoryCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// The memoized value for `key` if it was stored less than one TTL ago.
    pub fn get(&self, key: &str) -> Option<V> {
        let memo = self.store.get(key)?;
        if memo.fetched_at.elapsed() > self.ttl {
            drop(memo);
            self.store.remove(key);
            return None;
        }
        Some(memo.value.clone())
    }

    /// Stores a freshly fetched value, replacing any previous one.
    pub fn set(&self, key: String, value: V) {
        self.store.insert(
            key,
            Memo {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Stored entries, stale ones included until they are looked up.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn clear(&self) {
        self.store.clear();
    }
}
