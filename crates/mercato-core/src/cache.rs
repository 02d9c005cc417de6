//! Bounded least-recently-used cache.
//!
//! The transition model memoizes its three pure sub-computations keyed by
//! exact argument tuples, since the same `(price, slope, opinion_index)`
//! triple recurs across many traders within a step. This is an explicit
//! map-plus-recency structure with a fixed capacity: an ordered map holds
//! the values, a second ordered map from recency stamp to key provides
//! O(log n) eviction of the least-recently-used entry.

use std::collections::BTreeMap;

/// A bounded cache evicting the least-recently-used entry on overflow.
///
/// Both lookups and insertions refresh an entry's recency. Floating-point
/// cache keys are expected to be converted to their bit patterns by the
/// caller so that keys are totally ordered and hashable-by-equality.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    capacity: usize,
    entries: BTreeMap<K, Slot<V>>,
    recency: BTreeMap<u64, K>,
    clock: u64,
}

/// A stored value together with its current recency stamp.
#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    stamp: u64,
}

impl<K: Ord + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: BTreeMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
        }
    }

    /// Number of entries currently cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value, refreshing its recency on a hit.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let stamp = self.next_stamp();
        let slot = self.entries.get_mut(key)?;
        let old_stamp = slot.stamp;
        slot.stamp = stamp;
        let value = slot.value.clone();
        self.recency.remove(&old_stamp);
        self.recency.insert(stamp, key.clone());
        Some(value)
    }

    /// Insert a value, evicting the least-recently-used entry when full.
    pub fn insert(&mut self, key: K, value: V) {
        let stamp = self.next_stamp();

        if let Some(slot) = self.entries.get_mut(&key) {
            let old_stamp = slot.stamp;
            slot.value = value;
            slot.stamp = stamp;
            self.recency.remove(&old_stamp);
            self.recency.insert(stamp, key);
            return;
        }

        if self.entries.len() >= self.capacity {
            if let Some((_, oldest_key)) = self.recency.pop_first() {
                self.entries.remove(&oldest_key);
            }
        }

        self.entries.insert(key.clone(), Slot { value, stamp });
        self.recency.insert(stamp, key);
    }

    /// Advance the recency clock. A u64 counter cannot realistically wrap
    /// within a run, so wrapping arithmetic is sufficient here.
    fn next_stamp(&mut self) -> u64 {
        self.clock = self.clock.wrapping_add(1);
        self.clock
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_retrieves() {
        let mut cache: LruCache<u64, f64> = LruCache::new(4);
        cache.insert(1, 0.5);
        assert_eq!(cache.get(&1), Some(0.5));
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache: LruCache<u64, u64> = LruCache::new(2);
        cache.insert(1, 10);
        cache.insert(2, 20);
        // Touch 1 so that 2 becomes the eviction candidate.
        assert_eq!(cache.get(&1), Some(10));
        cache.insert(3, 30);

        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(10));
        assert_eq!(cache.get(&3), Some(30));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinserting_updates_value_without_growth() {
        let mut cache: LruCache<u64, u64> = LruCache::new(2);
        cache.insert(1, 10);
        cache.insert(1, 11);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), Some(11));
    }

    #[test]
    fn capacity_floor_is_one() {
        let mut cache: LruCache<u64, u64> = LruCache::new(0);
        cache.insert(1, 10);
        cache.insert(2, 20);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(20));
    }

    #[test]
    fn float_bit_keys_distinguish_close_values() {
        let mut cache: LruCache<(u64, u64), f64> = LruCache::new(8);
        let key_a = (10.0_f64.to_bits(), 0.1_f64.to_bits());
        let key_b = (10.0_f64.to_bits(), 0.2_f64.to_bits());
        cache.insert(key_a, 1.0);
        cache.insert(key_b, 2.0);
        assert_eq!(cache.get(&key_a), Some(1.0));
        assert_eq!(cache.get(&key_b), Some(2.0));
    }
}
