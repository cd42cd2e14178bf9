//! Access-ordered map backing the cache store
//!
//! Every read or write through [`LruMap::get_mut`] / [`LruMap::insert`] moves the
//! key to the newest access tick. The eviction victim is always the smallest tick,
//! found through an ordered tick index instead of a full scan.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

#[derive(Debug)]
struct Slot<V> {
    value: V,
    tick: u64,
}

/// A bounded map with least-recently-used eviction
#[derive(Debug)]
pub struct LruMap<K, V> {
    /// Storage for cached items
    entries: HashMap<K, Slot<V>>,
    /// Access tick -> key, oldest first
    order: BTreeMap<u64, K>,
    /// Maximum number of entries (always >= 1)
    capacity: usize,
    /// Access counter for LRU tracking
    access_counter: u64,
}

impl<K: Eq + Hash + Clone, V> LruMap<K, V> {
    /// Create a map holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity.min(1024)),
            order: BTreeMap::new(),
            capacity,
            access_counter: 0,
        }
    }

    /// Get a mutable reference and mark the entry as most recently used
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.entries.get_mut(key)?;
        self.access_counter += 1;
        let tick = self.access_counter;
        if let Some(owned) = self.order.remove(&slot.tick) {
            self.order.insert(tick, owned);
        }
        slot.tick = tick;
        Some(&mut slot.value)
    }

    /// Look at an entry without touching its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Check if a key exists without updating access order
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Insert or replace a value, marking it most recently used.
    ///
    /// Returns the evicted entry when a new key pushed the map past capacity.
    /// Replacing an existing key never evicts.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.access_counter += 1;
        let tick = self.access_counter;

        if let Some(slot) = self.entries.get_mut(&key) {
            if let Some(owned) = self.order.remove(&slot.tick) {
                self.order.insert(tick, owned);
            }
            slot.tick = tick;
            slot.value = value;
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        self.order.insert(tick, key.clone());
        self.entries.insert(key, Slot { value, tick });
        evicted
    }

    /// Remove a specific key
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.entries.remove(key)?;
        self.order.remove(&slot.tick);
        Some(slot.value)
    }

    /// Remove and return the least recently used entry
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let (_, key) = self.order.pop_first()?;
        let slot = self.entries.remove(&key)?;
        Some((key, slot.value))
    }

    /// Iterate over all entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, slot)| (k, &slot.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_basic() {
        let mut map = LruMap::new(3);

        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("c", 3);

        assert_eq!(map.get_mut(&"a"), Some(&mut 1));
        assert_eq!(map.peek(&"b"), Some(&2));
        assert_eq!(map.peek(&"c"), Some(&3));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_lru_eviction() {
        let mut map = LruMap::new(2);

        map.insert("a", 1);
        map.insert("b", 2);

        // Access "a" to make it more recent
        map.get_mut(&"a");

        // Insert "c", should evict "b" (least recently used)
        let evicted = map.insert("c", 3);

        assert_eq!(evicted, Some(("b", 2)));
        assert_eq!(map.peek(&"a"), Some(&1));
        assert!(!map.contains(&"b"));
        assert_eq!(map.peek(&"c"), Some(&3));
    }

    #[test]
    fn test_lru_replace_does_not_evict() {
        let mut map = LruMap::new(2);

        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.insert("a", 10), None);

        assert_eq!(map.len(), 2);
        assert_eq!(map.peek(&"a"), Some(&10));

        // "b" is now the oldest
        assert_eq!(map.pop_lru(), Some(("b", 2)));
    }

    #[test]
    fn test_peek_keeps_order() {
        let mut map = LruMap::new(2);

        map.insert("a", 1);
        map.insert("b", 2);
        map.peek(&"a");

        assert_eq!(map.insert("c", 3), Some(("a", 1)));
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut map = LruMap::new(3);

        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.remove(&"a"), Some(1));
        assert_eq!(map.remove(&"a"), None);

        map.insert("c", 3);
        map.insert("d", 4);
        assert_eq!(map.len(), 3);
        assert_eq!(map.pop_lru(), Some(("b", 2)));
        assert_eq!(map.pop_lru(), Some(("c", 3)));
        assert_eq!(map.pop_lru(), Some(("d", 4)));
        assert_eq!(map.pop_lru(), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_borrowed_lookup() {
        let mut map: LruMap<String, u8> = LruMap::new(4);
        map.insert("http://example.com/".to_string(), 7);

        assert!(map.contains("http://example.com/"));
        assert_eq!(map.get_mut("http://example.com/"), Some(&mut 7));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut map = LruMap::new(0);
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.capacity(), 1);
        assert_eq!(map.len(), 1);
        assert!(map.contains(&"b"));
    }
}
