//! Deterministic separate-chaining hash map.
//!
//! Backs the trie's per-level prefix lookups. Deliberately ordinary: fixed
//! hasher seed, power-of-two bucket count, one `Vec` chain per bucket, grown
//! when the load factor reaches 1. No perfect hashing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const INITIAL_BUCKETS: usize = 16;

#[derive(Clone, Debug)]
pub struct ChainMap<K, V> {
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
}

impl<K: Hash + Eq, V> ChainMap<K, V> {
    pub fn new() -> Self {
        Self {
            buckets: (0..INITIAL_BUCKETS).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `DefaultHasher::new()` uses fixed keys, so bucket placement is
    /// deterministic across runs.
    #[inline]
    fn bucket_of(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) & (self.buckets.len() - 1)
    }

    /// Insert or overwrite, returning the displaced value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.len >= self.buckets.len() {
            self.grow();
        }
        let b = self.bucket_of(&key);
        for (k, v) in &mut self.buckets[b] {
            if *k == key {
                return Some(std::mem::replace(v, value));
            }
        }
        self.buckets[b].push((key, value));
        self.len += 1;
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let b = self.bucket_of(key);
        self.buckets[b]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let b = self.bucket_of(key);
        let chain = &mut self.buckets[b];
        let pos = chain.iter().position(|(k, _)| k == key)?;
        self.len -= 1;
        Some(chain.swap_remove(pos).1)
    }

    /// All entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets
            .iter()
            .flat_map(|chain| chain.iter().map(|(k, v)| (k, v)))
    }

    fn grow(&mut self) {
        let doubled = self.buckets.len() * 2;
        let old = std::mem::replace(
            &mut self.buckets,
            (0..doubled).map(|_| Vec::new()).collect(),
        );
        for (k, v) in old.into_iter().flatten() {
            let b = self.bucket_of(&k);
            self.buckets[b].push((k, v));
        }
    }
}

impl<K: Hash + Eq, V> Default for ChainMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
