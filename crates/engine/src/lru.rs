use std::collections::HashMap;
use std::hash::Hash;

struct LruEntry<V> {
    value: V,
    access: u64,
}

/// Bounded map that evicts the least recently used entry.
///
/// Every `get` hit and every `set` stamps the entry with a monotonic access
/// counter; eviction removes the entry with the smallest stamp. Eviction is
/// a linear scan, which is fine for the hundreds-to-thousands of entries a
/// vault produces.
pub struct LruCache<K, V> {
    capacity: usize,
    entries: HashMap<K, LruEntry<V>>,
    counter: u64,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            counter: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        let stamp = self.tick();
        let entry = self.entries.get_mut(key)?;
        entry.access = stamp;
        Some(&entry.value)
    }

    pub fn set(&mut self, key: K, value: V) {
        let stamp = self.tick();
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            entry.access = stamp;
            return;
        }
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            LruEntry {
                value,
                access: stamp,
            },
        );
    }

    /// Membership test; does not count as an access.
    #[must_use]
    pub fn has(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.counter = 0;
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.access)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LruCache;

    #[test]
    fn evicts_least_recently_used_not_oldest_inserted() {
        let mut cache = LruCache::new(3);
        cache.set("A", 1);
        cache.set("B", 2);
        cache.set("C", 3);
        assert_eq!(cache.get(&"A"), Some(&1));
        cache.set("D", 4);

        assert!(cache.has(&"A"));
        assert!(!cache.has(&"B"));
        assert!(cache.has(&"C"));
        assert!(cache.has(&"D"));
        assert_eq!(cache.size(), 3);
    }

    #[test]
    fn set_on_existing_key_updates_and_bumps() {
        let mut cache = LruCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);
        cache.set("c", 3);

        assert_eq!(cache.get(&"a"), Some(&10));
        assert!(!cache.has(&"b"));
    }

    #[test]
    fn has_does_not_refresh_entry() {
        let mut cache = LruCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        assert!(cache.has(&"a"));
        cache.set("c", 3);
        assert!(!cache.has(&"a"));
    }

    #[test]
    fn delete_and_clear() {
        let mut cache = LruCache::new(4);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.delete(&"a"), Some(1));
        assert_eq!(cache.delete(&"a"), None);
        assert_eq!(cache.size(), 1);

        cache.clear();
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.counter, 0);
        assert_eq!(cache.get(&"b"), None);
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let mut cache = LruCache::new(0);
        cache.set(1, "x");
        cache.set(2, "y");
        assert_eq!(cache.size(), 1);
        assert!(cache.has(&2));
    }

    #[test]
    fn stays_bounded_and_correct_past_a_thousand_entries() {
        let mut cache = LruCache::new(1000);
        for i in 0..1000u32 {
            cache.set(i, i * 2);
        }
        // Touch the first half so the second half becomes the eviction pool.
        for i in 0..500u32 {
            assert_eq!(cache.get(&i), Some(&(i * 2)));
        }
        for i in 1000..1500u32 {
            cache.set(i, i * 2);
        }

        assert_eq!(cache.size(), 1000);
        for i in 0..500u32 {
            assert!(cache.has(&i), "recently used key {i} was evicted");
        }
        for i in 500..1000u32 {
            assert!(!cache.has(&i), "stale key {i} survived");
        }
        for i in 1000..1500u32 {
            assert!(cache.has(&i));
        }
    }
}
