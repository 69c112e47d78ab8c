use indexmap::IndexMap;
use parking_lot::RwLock;
use rand::Rng;
use std::{collections::hash_map::RandomState, hash::BuildHasher, sync::Arc};

struct Inner<TKey, TData, S = RandomState>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    // We use IndexMap and not HashMap because it makes it cheaper to remove a random element when the cache is full.
    map: IndexMap<TKey, TData, S>,
}

impl<TKey, TData, S> Inner<TKey, TData, S>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
    S: BuildHasher + Default,
{
    pub fn new(max_size: u64) -> Self {
        // Use `size + 1` for not triggering a realloc if new element exactly overflows capacity
        Self { map: IndexMap::with_capacity_and_hasher(max_size as usize + 1, S::default()) }
    }
}

/// Bounded map with arbitrary-order eviction. An entry, once published, is
/// immutable; a miss is always safely recomputable, so eviction can never be
/// a correctness issue, only a performance one.
#[derive(Clone)]
pub struct Cache<TKey, TData, S = RandomState>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    inner: Arc<RwLock<Inner<TKey, TData, S>>>,
    max_size: usize,
}

impl<TKey, TData, S> Cache<TKey, TData, S>
where
    TKey: Clone + std::hash::Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
    S: BuildHasher + Default,
{
    pub fn new(size: u64) -> Self {
        Self { inner: Arc::new(RwLock::new(Inner::new(size))), max_size: size as usize }
    }

    pub fn get(&self, key: &TKey) -> Option<TData> {
        self.inner.read().map.get(key).cloned()
    }

    pub fn contains_key(&self, key: &TKey) -> bool {
        self.inner.read().map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts an entry, evicting a random victim when the cache is full.
    pub fn insert(&self, key: TKey, data: TData) {
        if self.max_size == 0 {
            return;
        }

        let mut write_guard = self.inner.write();
        if write_guard.map.len() == self.max_size {
            write_guard.map.swap_remove_index(rand::thread_rng().gen_range(0..self.max_size));
        }
        write_guard.map.insert(key, data);
    }

    /// Evicts random entries until at most `target` remain.
    pub fn trim_to(&self, target: usize) {
        let mut write_guard = self.inner.write();
        let mut rng = rand::thread_rng();
        while write_guard.map.len() > target {
            let len = write_guard.map.len();
            write_guard.map.swap_remove_index(rng.gen_range(0..len));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_round_trip() {
        let cache: Cache<u64, u64> = Cache::new(16);
        cache.insert(1, 10);
        cache.insert(2, 20);
        assert_eq!(cache.get(&1), Some(10));
        assert_eq!(cache.get(&2), Some(20));
        assert_eq!(cache.get(&3), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn insert_at_capacity_evicts_a_single_entry() {
        let cache: Cache<u64, u64> = Cache::new(4);
        for key in 0..10 {
            cache.insert(key, key);
        }
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn trim_to_halves_the_cache() {
        let cache: Cache<u64, u64> = Cache::new(8);
        for key in 0..8 {
            cache.insert(key, key);
        }
        cache.trim_to(4);
        assert_eq!(cache.len(), 4);
        // survivors keep their data intact
        let survivors = (0..8).filter(|key| cache.get(key) == Some(*key)).count();
        assert_eq!(survivors, 4);
    }

    #[test]
    fn zero_sized_cache_stays_empty() {
        let cache: Cache<u64, u64> = Cache::new(0);
        cache.insert(1, 1);
        assert!(cache.is_empty());
        assert!(!cache.contains_key(&1));
    }
}
