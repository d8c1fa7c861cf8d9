//! Two-tier ordered index: clusters of keys, each an [`AvlTree`], indexed
//! by an [`XFastTrie`] over the cluster representatives.
//!
//! Every cluster's representative is its minimum key, so the trie's floor
//! query routes a key straight to the one cluster that can hold it: cluster
//! ranges tile the key space as `[rep_i, rep_{i+1})`. Inserting below every
//! representative opens a fresh cluster rather than rewriting an existing
//! one, and removing a cluster's minimum re-registers the cluster under its
//! new minimum. The trie stores arena slot ids, never the trees themselves,
//! so re-registering a representative moves one `u32`.

use tracing::{debug, trace};

use crate::avl::AvlTree;
use crate::error::{Error, Result};
use crate::xfast::XFastTrie;

pub struct ClusterIndex<V> {
    reps: XFastTrie<u32>,
    /// Cluster arena; the trie's values index into it.
    clusters: Vec<Option<AvlTree<V>>>,
    free: Vec<u32>,
    len: usize,
}

impl<V> ClusterIndex<V> {
    /// Full 64-bit key width.
    pub fn new() -> Self {
        Self::build(64)
    }

    /// Configure the key width up front; keys are validated against it on
    /// every call.
    pub fn with_key_bits(bits: u32) -> Result<Self> {
        if bits == 0 || bits > 64 {
            return Err(Error::InvalidKeyBits { bits });
        }
        Ok(Self::build(bits))
    }

    fn build(bits: u32) -> Self {
        Self {
            reps: XFastTrie::build(bits),
            clusters: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn key_bits(&self) -> u32 {
        self.reps.key_bits()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn cluster(&self, slot: u32) -> &AvlTree<V> {
        self.clusters[slot as usize]
            .as_ref()
            .expect("live cluster slot")
    }

    #[inline]
    fn cluster_mut(&mut self, slot: u32) -> &mut AvlTree<V> {
        self.clusters[slot as usize]
            .as_mut()
            .expect("live cluster slot")
    }

    fn alloc_cluster(&mut self, tree: AvlTree<V>) -> u32 {
        match self.free.pop() {
            Some(slot) => {
                self.clusters[slot as usize] = Some(tree);
                slot
            }
            None => {
                self.clusters.push(Some(tree));
                (self.clusters.len() - 1) as u32
            }
        }
    }

    /// The cluster whose range covers `key`: greatest representative at or
    /// below it.
    fn resolve(&self, key: u64) -> Option<(u64, u32)> {
        self.reps
            .floor_unchecked(key)
            .map(|(rep, &slot)| (rep, slot))
    }

    /// Insert or overwrite, returning the displaced value. A key below every
    /// representative opens a new single-key cluster.
    pub fn insert(&mut self, key: u64, value: V) -> Result<Option<V>> {
        self.reps.check_key(key)?;
        match self.resolve(key) {
            None => {
                let mut tree = AvlTree::new();
                tree.insert(key, value);
                let slot = self.alloc_cluster(tree);
                self.reps.insert_unchecked(key, slot);
                self.len += 1;
                debug!(key, slot, "cluster opened");
                Ok(None)
            }
            Some((rep, slot)) => {
                debug_assert!(rep <= key);
                let displaced = self.cluster_mut(slot).insert(key, value);
                if displaced.is_none() {
                    self.len += 1;
                }
                Ok(displaced)
            }
        }
    }

    /// Remove `key`, returning its value. Dropping a cluster's last key
    /// withdraws its representative; dropping its minimum re-registers the
    /// cluster under the new minimum.
    pub fn remove(&mut self, key: u64) -> Result<Option<V>> {
        self.reps.check_key(key)?;
        let Some((rep, slot)) = self.resolve(key) else {
            return Ok(None);
        };
        let Some(value) = self.cluster_mut(slot).remove(key) else {
            return Ok(None);
        };
        self.len -= 1;
        if self.cluster(slot).is_empty() {
            self.reps.remove_unchecked(rep);
            self.clusters[slot as usize] = None;
            self.free.push(slot);
            debug!(key, slot, "cluster dropped");
        } else if key == rep {
            let new_rep = self
                .cluster(slot)
                .min()
                .map(|(k, _)| k)
                .expect("cluster is non-empty");
            self.reps.remove_unchecked(rep);
            self.reps.insert_unchecked(new_rep, slot);
            trace!(old = rep, new = new_rep, slot, "representative reassigned");
        }
        Ok(Some(value))
    }

    pub fn search(&self, key: u64) -> Result<Option<&V>> {
        self.reps.check_key(key)?;
        let Some((_rep, slot)) = self.resolve(key) else {
            return Ok(None);
        };
        Ok(self.cluster(slot).get(key))
    }

    pub fn contains(&self, key: u64) -> Result<bool> {
        Ok(self.search(key)?.is_some())
    }

    /// Largest entry strictly below `key`.
    pub fn predecessor(&self, key: u64) -> Result<Option<(u64, &V)>> {
        self.reps.check_key(key)?;
        let Some((rep, slot)) = self.resolve(key) else {
            return Ok(None);
        };
        if let Some(hit) = self.cluster(slot).predecessor(key) {
            return Ok(Some(hit));
        }
        // Nothing below the key in its own cluster; take the previous
        // cluster's maximum.
        let Some((_prev, &prev_slot)) = self.reps.predecessor_unchecked(rep) else {
            return Ok(None);
        };
        Ok(self.cluster(prev_slot).max())
    }

    /// Smallest entry strictly above `key`.
    pub fn successor(&self, key: u64) -> Result<Option<(u64, &V)>> {
        self.reps.check_key(key)?;
        if let Some((_rep, slot)) = self.resolve(key) {
            if let Some(hit) = self.cluster(slot).successor(key) {
                return Ok(Some(hit));
            }
        }
        let Some((_next, &next_slot)) = self.reps.successor_unchecked(key) else {
            return Ok(None);
        };
        Ok(self.cluster(next_slot).min())
    }

    pub fn min(&self) -> Option<(u64, &V)> {
        let (_rep, &slot) = self.reps.min()?;
        self.cluster(slot).min()
    }

    pub fn max(&self) -> Option<(u64, &V)> {
        let (_rep, &slot) = self.reps.max()?;
        self.cluster(slot).max()
    }

    /// All entries in ascending key order, walking clusters in
    /// representative order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &V)> + '_ {
        self.reps
            .iter()
            .flat_map(move |(_rep, &slot)| self.cluster(slot).iter())
    }

    #[cfg(test)]
    pub(crate) fn cluster_count(&self) -> usize {
        self.reps.len()
    }

    #[cfg(test)]
    pub(crate) fn validate(&self) {
        self.reps.validate();
        let mut total = 0;
        let mut last_max: Option<u64> = None;
        for (rep, &slot) in self.reps.iter() {
            let tree = self.cluster(slot);
            assert!(!tree.is_empty(), "empty cluster behind rep {}", rep);
            tree.validate();
            let min = tree.min().map(|(k, _)| k).expect("cluster is non-empty");
            assert_eq!(min, rep, "representative is not its cluster's minimum");
            if let Some(prev) = last_max {
                assert!(prev < rep, "cluster ranges overlap at rep {}", rep);
            }
            last_max = tree.max().map(|(k, _)| k);
            total += tree.len();
        }
        assert_eq!(total, self.len, "len out of sync with cluster contents");
        let live = self.clusters.iter().filter(|c| c.is_some()).count();
        assert_eq!(live, self.reps.len(), "orphaned cluster slots");
    }
}

impl<V> Default for ClusterIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}
