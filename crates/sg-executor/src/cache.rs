//! Bounded, TTL-based query result cache.
//!
//! The canonical stored value is the structural match list; presentation
//! format is derived by the caller, never cached. Capacity and TTL default
//! to the values in [`sg_core::Config`] but can be overridden per cache.

use sg_core::MatchRecord;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<MatchRecord>,
    inserted_at: Instant,
    last_used: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Inner {
    entries: HashMap<String, Entry>,
    capacity: usize,
    ttl: Duration,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// A cache keyed by [`sg_core::QueryFingerprint::cache_key`]. All methods are
/// safe under concurrent readers and writers; `get` and `put` both take the
/// same mutex, so puts are serialized with evictions by construction.
pub struct QueryCache {
    inner: Mutex<Inner>,
}

impl QueryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                capacity,
                ttl,
                clock: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    /// Returns a value iff present and not expired. Accessing an entry
    /// refreshes its recency for LRU eviction purposes.
    pub fn get(&self, key: &str) -> Option<Vec<MatchRecord>> {
        let mut inner = self.inner.lock().unwrap();
        inner.clock += 1;
        let tick = inner.clock;
        let ttl = inner.ttl;

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() > ttl,
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if expired {
            inner.entries.remove(key);
            inner.misses += 1;
            return None;
        }

        let entry = inner.entries.get_mut(key).unwrap();
        entry.last_used = tick;
        inner.hits += 1;
        Some(inner.entries.get(key).unwrap().value.clone())
    }

    /// Stores a value, evicting least-recently-used entries until the
    /// capacity invariant holds.
    pub fn put(&self, key: String, value: Vec<MatchRecord>) {
        let mut inner = self.inner.lock().unwrap();
        inner.clock += 1;
        let tick = inner.clock;
        inner.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
                last_used: tick,
            },
        );
        Self::evict_to_capacity(&mut inner);
    }

    fn evict_to_capacity(inner: &mut Inner) {
        while inner.entries.len() > inner.capacity {
            let lru_key = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            match lru_key {
                Some(k) => {
                    inner.entries.remove(&k);
                    inner.evictions += 1;
                }
                None => break,
            }
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        CacheStats {
            size: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sg_core::{Position, Range};

    fn sample_match(text: &str) -> MatchRecord {
        MatchRecord {
            file: "a.py".into(),
            range: Range {
                start: Position { line: 1, column: 1 },
                end: Position { line: 1, column: 2 },
            },
            text: text.to_string(),
            meta_variables: Default::default(),
        }
    }

    #[test]
    fn miss_then_hit() {
        let cache = QueryCache::new(10, Duration::from_secs(60));
        assert!(cache.get("k").is_none());
        cache.put("k".to_string(), vec![sample_match("x")]);
        assert!(cache.get("k").is_some());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = QueryCache::new(10, Duration::from_millis(1));
        cache.put("k".to_string(), vec![sample_match("x")]);
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn capacity_is_enforced_by_eviction() {
        let cache = QueryCache::new(2, Duration::from_secs(60));
        cache.put("a".to_string(), vec![sample_match("a")]);
        cache.put("b".to_string(), vec![sample_match("b")]);
        // touch "a" so "b" becomes the least recently used
        cache.get("a");
        cache.put("c".to_string(), vec![sample_match("c")]);
        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.evictions, 1);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = QueryCache::new(10, Duration::from_secs(60));
        cache.put("k".to_string(), vec![sample_match("x")]);
        cache.clear();
        assert_eq!(cache.stats().size, 0);
    }
}
