//! Generic `lastAccess`-stamped LRU cache, grounded on the donor's
//! map-plus-access-stamps caching pattern: a `HashMap` keyed by id with
//! access timestamps, evicted on both size and age rather than a strict
//! linked-list recency order.

use std::collections::HashMap;
use std::hash::Hash;

struct Entry<V> {
    value: V,
    last_access_ms: u64,
}

pub struct LruCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        LruCache {
            entries: HashMap::new(),
            capacity,
        }
    }

    pub fn get(&mut self, key: &K, now_ms: u64) -> Option<&V> {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_access_ms = now_ms;
            Some(&self.entries[key].value)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, key: &K, now_ms: u64) -> Option<&mut V> {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_access_ms = now_ms;
            Some(&mut entry.value)
        } else {
            None
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: K, value: V, now_ms: u64) {
        self.entries.insert(
            key,
            Entry {
                value,
                last_access_ms: now_ms,
            },
        );
        self.evict_oldest_if_over_capacity();
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    fn evict_oldest_if_over_capacity(&mut self) {
        if self.entries.len() <= self.capacity {
            return;
        }
        if let Some(oldest_key) = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_access_ms)
            .map(|(k, _)| k.clone())
        {
            self.entries.remove(&oldest_key);
        }
    }

    /// Drops every entry not accessed within `max_age_ms` of `now_ms`.
    /// Called from the periodic cache-cleanup sweep.
    pub fn evict_stale(&mut self, now_ms: u64, max_age_ms: u64) -> Vec<K> {
        let stale: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, e)| now_ms.saturating_sub(e.last_access_ms) > max_age_ms)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            self.entries.remove(key);
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_over_capacity() {
        let mut cache: LruCache<String, i32> = LruCache::new(2);
        cache.insert("a".to_string(), 1, 0);
        cache.insert("b".to_string(), 2, 10);
        cache.insert("c".to_string(), 3, 20);
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&"a".to_string()));
    }

    #[test]
    fn accessing_refreshes_last_access() {
        let mut cache: LruCache<String, i32> = LruCache::new(2);
        cache.insert("a".to_string(), 1, 0);
        cache.insert("b".to_string(), 2, 10);
        cache.get(&"a".to_string(), 20);
        cache.insert("c".to_string(), 3, 30);
        assert!(cache.contains(&"a".to_string()));
        assert!(!cache.contains(&"b".to_string()));
    }

    #[test]
    fn evict_stale_drops_old_entries() {
        let mut cache: LruCache<String, i32> = LruCache::new(10);
        cache.insert("a".to_string(), 1, 0);
        cache.insert("b".to_string(), 2, 100);
        let dropped = cache.evict_stale(1000, 300);
        assert_eq!(dropped, vec!["a".to_string()]);
        assert!(cache.contains(&"b".to_string()));
    }
}
