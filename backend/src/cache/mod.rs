use std::{hash::Hash, time::Duration};

use moka::sync::Cache;

/// Entry bound for each cache; least-recently-useful entries are evicted first.
pub const MAX_ENTRIES: u64 = 1_000;

/// In-process response cache honouring a fixed time-to-live.
///
/// Identical upstream requests made within the lifetime window are answered
/// from memory. A zero TTL disables caching entirely.
#[derive(Debug, Clone)]
pub struct ResponseCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    entries: Option<Cache<K, V>>,
}

impl<K, V> ResponseCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, MAX_ENTRIES)
    }

    pub fn with_capacity(ttl: Duration, max_entries: u64) -> Self {
        let entries = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build()
        });
        Self { entries }
    }

    /// Fresh copy of the cached value; expired entries are never returned.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.as_ref()?.get(key)
    }

    pub fn insert(&self, key: K, value: V) {
        if let Some(entries) = &self.entries {
            entries.insert(key, value);
        }
    }
}
