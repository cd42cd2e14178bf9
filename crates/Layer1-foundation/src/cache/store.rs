//! Concurrent response store
//!
//! One mutex guards the whole store. Every operation is in-memory, so the lock
//! is never held across I/O. Expiry is eventual: entries are only removed by
//! [`CacheStore::sweep`], and a `get` racing the sweeper may still return an
//! entry that has just crossed its TTL.

use super::config::CacheStoreConfig;
use super::lru::LruMap;
use super::sweeper::{self, SweeperHandle};
use crate::Result;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// One cached response
#[derive(Debug, Clone)]
pub struct CacheEntry {
    payload: Bytes,
    last_accessed: Instant,
}

impl CacheEntry {
    fn new(payload: Bytes, now: Instant) -> Self {
        Self {
            payload,
            last_accessed: now,
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn last_accessed(&self) -> Instant {
        self.last_accessed
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_accessed) > ttl
    }
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStoreStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    /// Entries dropped to make room for a new key
    pub evictions: u64,
    /// Entries removed by the sweeper
    pub expirations: u64,
}

impl CacheStoreStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    inserts: u64,
    evictions: u64,
    expirations: u64,
}

#[derive(Debug)]
struct StoreState {
    entries: LruMap<String, CacheEntry>,
    counters: Counters,
}

impl StoreState {
    fn insert(&mut self, key: String, payload: Bytes) {
        let entry = CacheEntry::new(payload, Instant::now());
        if let Some((evicted, _)) = self.entries.insert(key, entry) {
            self.counters.evictions += 1;
            debug!(key = %evicted, "evicted least recently used entry");
        }
        self.counters.inserts += 1;
    }
}

/// Bounded URL -> response map shared by every connection
#[derive(Debug)]
pub struct CacheStore {
    state: Mutex<StoreState>,
    config: CacheStoreConfig,
}

impl CacheStore {
    /// Build a store. Fails only when `max_items` is 0.
    pub fn new(config: CacheStoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(StoreState {
                entries: LruMap::new(config.max_items),
                counters: Counters::default(),
            }),
            config,
        })
    }

    /// Insert or replace the payload for `key`, resetting its last access time.
    ///
    /// A new key inserted at capacity silently evicts the least recently used entry.
    pub fn put(&self, key: impl Into<String>, payload: impl Into<Bytes>) {
        let key = key.into();
        trace!(key = %key, "cache put");
        self.state.lock().insert(key, payload.into());
    }

    /// Insert only if nothing is cached under `key` yet.
    ///
    /// Check and insert happen in one critical section. Returns `false` when a
    /// concurrent writer got there first; that entry's recency is left alone.
    pub fn put_if_absent(&self, key: impl Into<String>, payload: impl Into<Bytes>) -> bool {
        let key = key.into();
        let mut state = self.state.lock();
        if state.entries.contains(key.as_str()) {
            return false;
        }
        trace!(key = %key, "cache put");
        state.insert(key, payload.into());
        true
    }

    /// Look up a payload. A hit counts as a fresh use for LRU order and TTL.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state.entries.get_mut(key) {
            Some(entry) => {
                entry.last_accessed = Instant::now();
                state.counters.hits += 1;
                trace!(key, "cache hit");
                Some(entry.payload.clone())
            }
            None => {
                state.counters.misses += 1;
                trace!(key, "cache miss");
                None
            }
        }
    }

    /// Presence check that does not count as a use
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains(key)
    }

    /// Copy of an entry without touching it
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.state.lock().entries.peek(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.max_items
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl()
    }

    pub fn config(&self) -> &CacheStoreConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStoreStats {
        let state = self.state.lock();
        CacheStoreStats {
            entries: state.entries.len(),
            capacity: self.config.max_items,
            hits: state.counters.hits,
            misses: state.counters.misses,
            inserts: state.counters.inserts,
            evictions: state.counters.evictions,
            expirations: state.counters.expirations,
        }
    }

    /// Remove every entry idle for longer than the TTL.
    ///
    /// The scan runs under the lock; each removal then takes the lock on its own
    /// and yields to the scheduler afterwards, so a long sweep does not starve
    /// concurrent `get`/`put`. An entry touched between scan and removal is kept.
    /// Returns the number of entries removed. No-op when TTL is disabled.
    pub async fn sweep(&self) -> usize {
        let ttl = self.config.ttl();
        if ttl.is_zero() {
            return 0;
        }

        let now = Instant::now();
        let condemned: Vec<String> = {
            let state = self.state.lock();
            state
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_expired(now, ttl))
                .map(|(key, _)| key.clone())
                .collect()
        };

        let mut removed = 0;
        for key in condemned {
            {
                let mut state = self.state.lock();
                let still_expired = state
                    .entries
                    .peek(key.as_str())
                    .is_some_and(|entry| entry.is_expired(now, ttl));
                if still_expired {
                    state.entries.remove(key.as_str());
                    state.counters.expirations += 1;
                    removed += 1;
                    debug!(key = %key, "expired entry removed");
                }
            }
            tokio::task::yield_now().await;
        }

        removed
    }

    /// Start the background sweeper.
    ///
    /// Returns `None` unless both TTL and sweep interval are positive. The task
    /// waits one full interval before its first sweep, holds only a weak
    /// reference to the store, and stops when the handle is shut down or dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<SweeperHandle> {
        if !self.config.sweeper_enabled() {
            return None;
        }
        Some(sweeper::spawn(Arc::downgrade(self), self.config.sweep_interval()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded(max_items: usize) -> CacheStore {
        CacheStore::new(CacheStoreConfig::bounded(max_items)).unwrap()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(CacheStore::new(CacheStoreConfig::bounded(0)).is_err());
    }

    #[test]
    fn test_get_miss_is_none() {
        let store = bounded(4);
        assert_eq!(store.get("http://example.com/"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_lru_scenario() {
        let store = bounded(2);

        store.put("a", "X");
        store.put("b", "Y");
        assert_eq!(store.get("a"), Some(Bytes::from("X")));
        store.put("c", "Z");

        assert_eq!(store.get("b"), None);
        assert_eq!(store.get("a"), Some(Bytes::from("X")));
        assert_eq!(store.get("c"), Some(Bytes::from("Z")));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let store = bounded(3);
        for i in 0..50 {
            store.put(format!("key-{}", i % 7), vec![i as u8]);
            assert!(store.len() <= 3);
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_overflow_evicts_oldest_access() {
        let store = bounded(3);
        store.put("a", "1");
        store.put("b", "2");
        store.put("c", "3");

        // b and a refreshed, c now oldest
        store.get("b");
        store.get("a");
        store.put("d", "4");

        assert!(!store.contains("c"));
        assert!(store.contains("a"));
        assert!(store.contains("b"));
        assert!(store.contains("d"));
    }

    #[test]
    fn test_replace_keeps_size() {
        let store = bounded(2);
        store.put("a", "old");
        store.put("b", "y");
        store.put("a", "new");

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a"), Some(Bytes::from("new")));
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_put_if_absent() {
        let store = bounded(2);
        assert!(store.put_if_absent("a", "first"));
        assert!(!store.put_if_absent("a", "second"));
        assert_eq!(store.get("a"), Some(Bytes::from("first")));
    }

    #[test]
    fn test_contains_does_not_refresh() {
        let store = bounded(2);
        store.put("a", "1");
        store.put("b", "2");
        assert!(store.contains("a"));
        assert!(store.peek("a").is_some());
        store.put("c", "3");

        assert!(!store.contains("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_refreshes_last_accessed() {
        let store = bounded(2);
        store.put("a", "1");
        let inserted = store.peek("a").unwrap().last_accessed();

        tokio::time::advance(Duration::from_secs(5)).await;
        store.get("a");

        let touched = store.peek("a").unwrap().last_accessed();
        assert_eq!(touched - inserted, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_idle_entries() {
        let store = CacheStore::new(CacheStoreConfig::new(10, 0, 8)).unwrap();
        store.put("old", "1");
        tokio::time::advance(Duration::from_secs(8)).await;
        store.put("fresh", "2");
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(store.sweep().await, 1);
        assert!(!store.contains("old"));
        assert!(store.contains("fresh"));
        assert_eq!(store.stats().expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_keeps_entry_alive() {
        let store = CacheStore::new(CacheStoreConfig::new(10, 0, 8)).unwrap();
        store.put("a", "1");
        tokio::time::advance(Duration::from_secs(8)).await;
        store.get("a");
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(store.sweep().await, 0);
        assert!(store.contains("a"));
    }

    #[tokio::test]
    async fn test_sweep_noop_without_ttl() {
        let store = bounded(2);
        store.put("a", "1");
        assert_eq!(store.sweep().await, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stats_hit_rate() {
        let store = bounded(2);
        store.put("a", "1");
        store.get("a");
        store.get("missing");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
