//! Bitwise trie over fixed-width keys with hashed per-level indirection.
//!
//! Every key occupies one root-to-leaf path of `bits` levels, most
//! significant bit first. Each level keeps a [`ChainMap`] from prefix to
//! trie node, so any prefix of the search key resolves in one lookup and
//! predecessor/successor queries binary-search the levels instead of
//! descending bit by bit. Leaves are threaded through a sorted
//! [`OrderedList`], which makes the final step of every ordered query a
//! single link hop.
//!
//! Interior nodes carry handles to the smallest and largest live leaf in
//! their subtree. Removal clears the leaf but keeps the node and its level
//! entries; the descendant handles along the removed key's path are repaired
//! in the same pass, so a node with `min_leaf == None` reads as an empty
//! subtree.

use crate::chain::ChainMap;
use crate::error::{Error, Result};
use crate::list::{Handle, OrderedList};

const NIL: u32 = u32::MAX;

struct TrieNode {
    children: [u32; 2],
    /// Present only on a terminal node whose key is currently stored.
    leaf: Option<Handle>,
    /// Smallest live leaf anywhere in this subtree.
    min_leaf: Option<Handle>,
    /// Largest live leaf anywhere in this subtree.
    max_leaf: Option<Handle>,
}

struct Leaf<V> {
    key: u64,
    value: V,
}

pub struct XFastTrie<V> {
    bits: u32,
    /// Node arena; slot 0 is the root. Nodes are never freed.
    nodes: Vec<TrieNode>,
    /// `levels[d]` maps a prefix of length `d + 1` to its node.
    levels: Vec<ChainMap<u64, u32>>,
    leaves: OrderedList<Leaf<V>>,
}

impl<V> XFastTrie<V> {
    /// Full 64-bit key width.
    pub fn new() -> Self {
        Self::build(64)
    }

    /// Configure the key width up front; keys are validated against it on
    /// every public call.
    pub fn with_key_bits(bits: u32) -> Result<Self> {
        if bits == 0 || bits > 64 {
            return Err(Error::InvalidKeyBits { bits });
        }
        Ok(Self::build(bits))
    }

    pub(crate) fn build(bits: u32) -> Self {
        Self {
            bits,
            nodes: vec![TrieNode {
                children: [NIL; 2],
                leaf: None,
                min_leaf: None,
                max_leaf: None,
            }],
            levels: (0..bits).map(|_| ChainMap::new()).collect(),
            leaves: OrderedList::new(),
        }
    }

    #[inline]
    pub fn key_bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub(crate) fn check_key(&self, key: u64) -> Result<()> {
        if self.bits < 64 && (key >> self.bits) != 0 {
            return Err(Error::KeyOutOfRange {
                key,
                bits: self.bits,
            });
        }
        Ok(())
    }

    /// Branch bit taken when leaving the node at `depth` (0 = root).
    #[inline]
    fn bit(&self, key: u64, depth: u32) -> usize {
        ((key >> (self.bits - 1 - depth)) & 1) as usize
    }

    /// The key's prefix of length `depth`, for `depth >= 1`.
    #[inline]
    fn prefix(&self, key: u64, depth: u32) -> u64 {
        key >> (self.bits - depth)
    }

    #[inline]
    fn leaf_key(&self, h: Handle) -> u64 {
        self.leaves.get(h).expect("leaf handle is live").key
    }

    fn alloc_node(&mut self) -> u32 {
        self.nodes.push(TrieNode {
            children: [NIL; 2],
            leaf: None,
            min_leaf: None,
            max_leaf: None,
        });
        (self.nodes.len() - 1) as u32
    }

    // =========================================================================
    // Checked public surface
    // =========================================================================

    pub fn insert(&mut self, key: u64, value: V) -> Result<Option<V>> {
        self.check_key(key)?;
        Ok(self.insert_unchecked(key, value))
    }

    pub fn remove(&mut self, key: u64) -> Result<Option<V>> {
        self.check_key(key)?;
        Ok(self.remove_unchecked(key))
    }

    pub fn get(&self, key: u64) -> Result<Option<&V>> {
        self.check_key(key)?;
        Ok(self.get_unchecked(key))
    }

    pub fn contains(&self, key: u64) -> Result<bool> {
        self.check_key(key)?;
        Ok(self.exact_leaf(key).is_some())
    }

    /// Largest entry strictly below `key`.
    pub fn predecessor(&self, key: u64) -> Result<Option<(u64, &V)>> {
        self.check_key(key)?;
        Ok(self.predecessor_unchecked(key))
    }

    /// Smallest entry strictly above `key`.
    pub fn successor(&self, key: u64) -> Result<Option<(u64, &V)>> {
        self.check_key(key)?;
        Ok(self.successor_unchecked(key))
    }

    /// Largest entry at or below `key`.
    pub fn floor(&self, key: u64) -> Result<Option<(u64, &V)>> {
        self.check_key(key)?;
        Ok(self.floor_unchecked(key))
    }

    pub fn min(&self) -> Option<(u64, &V)> {
        self.entry(self.leaves.first()?)
    }

    pub fn max(&self) -> Option<(u64, &V)> {
        self.entry(self.leaves.last()?)
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &V)> + '_ {
        self.leaves.iter().map(|leaf| (leaf.key, &leaf.value))
    }

    /// Render every level's prefix set plus the leaf list, one line per
    /// level, for diagnostics.
    pub fn dump_levels(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.bits as usize + 1);
        for (i, level) in self.levels.iter().enumerate() {
            let mut prefixes: Vec<u64> = level.entries().map(|(&p, _)| p).collect();
            prefixes.sort_unstable();
            let rendered: Vec<String> = prefixes
                .iter()
                .map(|p| format!("{:0width$b}", p, width = i + 1))
                .collect();
            lines.push(format!("level {:>2}: {}", i + 1, rendered.join(" ")));
        }
        let keys: Vec<String> = self.iter().map(|(k, _)| k.to_string()).collect();
        lines.push(format!("leaves : {}", keys.join(" ")));
        lines
    }

    // =========================================================================
    // Core operations (width already validated)
    // =========================================================================

    pub(crate) fn insert_unchecked(&mut self, key: u64, value: V) -> Option<V> {
        if let Some(h) = self.exact_leaf(key) {
            let leaf = self.leaves.get_mut(h).expect("leaf handle is live");
            return Some(std::mem::replace(&mut leaf.value, value));
        }
        // Splice position is fixed before the trie mutates.
        let h = match self.floor_handle(key) {
            Some(after) => self
                .leaves
                .insert_after(after, Leaf { key, value })
                .expect("leaf handle is live"),
            None => self.leaves.push_front(Leaf { key, value }),
        };
        self.bump_descendants(0, h, key);
        let mut cur = 0u32;
        for depth in 0..self.bits {
            let b = self.bit(key, depth);
            let mut child = self.nodes[cur as usize].children[b];
            if child == NIL {
                child = self.alloc_node();
                self.nodes[cur as usize].children[b] = child;
                let prefix = self.prefix(key, depth + 1);
                self.levels[depth as usize].insert(prefix, child);
            }
            cur = child;
            self.bump_descendants(cur, h, key);
        }
        self.nodes[cur as usize].leaf = Some(h);
        None
    }

    pub(crate) fn remove_unchecked(&mut self, key: u64) -> Option<V> {
        let mut path = Vec::with_capacity(self.bits as usize + 1);
        let mut cur = 0u32;
        path.push(cur);
        for depth in 0..self.bits {
            let b = self.bit(key, depth);
            let child = self.nodes[cur as usize].children[b];
            if child == NIL {
                return None;
            }
            cur = child;
            path.push(cur);
        }
        let h = self.nodes[cur as usize].leaf.take()?;
        let prev = self.leaves.prev(h);
        let next = self.leaves.next(h);
        let prev_key = prev.map(|p| self.leaf_key(p));
        let next_key = next.map(|n| self.leaf_key(n));
        // A list neighbor substitutes for the removed leaf only while it
        // still shares the node's prefix; otherwise the subtree is empty.
        let bits = self.bits;
        for (depth, &idx) in path.iter().enumerate() {
            let depth = depth as u32;
            let shares =
                |other: u64| depth == 0 || (other >> (bits - depth)) == (key >> (bits - depth));
            let node = &mut self.nodes[idx as usize];
            if node.min_leaf == Some(h) {
                node.min_leaf = match (next, next_key) {
                    (Some(n), Some(nk)) if shares(nk) => Some(n),
                    _ => None,
                };
            }
            if node.max_leaf == Some(h) {
                node.max_leaf = match (prev, prev_key) {
                    (Some(p), Some(pk)) if shares(pk) => Some(p),
                    _ => None,
                };
            }
        }
        let leaf = self.leaves.remove(h).expect("leaf handle is live");
        Some(leaf.value)
    }

    pub(crate) fn get_unchecked(&self, key: u64) -> Option<&V> {
        let h = self.exact_leaf(key)?;
        let leaf = self.leaves.get(h).expect("leaf handle is live");
        Some(&leaf.value)
    }

    pub(crate) fn predecessor_unchecked(&self, key: u64) -> Option<(u64, &V)> {
        let h = match self.exact_leaf(key) {
            Some(h) => self.leaves.prev(h),
            None => self.absent_pred_handle(key),
        }?;
        self.entry(h)
    }

    pub(crate) fn successor_unchecked(&self, key: u64) -> Option<(u64, &V)> {
        let h = match self.exact_leaf(key) {
            Some(h) => self.leaves.next(h),
            None => self.absent_succ_handle(key),
        }?;
        self.entry(h)
    }

    pub(crate) fn floor_unchecked(&self, key: u64) -> Option<(u64, &V)> {
        self.entry(self.floor_handle(key)?)
    }

    // =========================================================================
    // Navigation internals
    // =========================================================================

    fn entry(&self, h: Handle) -> Option<(u64, &V)> {
        let leaf = self.leaves.get(h).expect("leaf handle is live");
        Some((leaf.key, &leaf.value))
    }

    /// Handle of the stored leaf for `key`, if any. One bottom-level lookup.
    fn exact_leaf(&self, key: u64) -> Option<Handle> {
        let idx = *self.levels[(self.bits - 1) as usize].get(&key)?;
        self.nodes[idx as usize].leaf
    }

    fn node_on_path(&self, key: u64, depth: u32) -> Option<u32> {
        if depth == 0 {
            return Some(0);
        }
        self.levels[(depth - 1) as usize]
            .get(&self.prefix(key, depth))
            .copied()
    }

    /// Deepest node on the key's path whose subtree still holds a live
    /// leaf. Binary search over the levels: liveness at a depth implies
    /// liveness at every shallower depth, so the predicate is monotone.
    fn deepest_live_ancestor(&self, key: u64) -> Option<(u32, u32)> {
        if self.nodes[0].min_leaf.is_none() {
            return None;
        }
        let mut lo = 0u32;
        let mut hi = self.bits;
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            let live = self
                .node_on_path(key, mid)
                .map_or(false, |idx| self.nodes[idx as usize].min_leaf.is_some());
            if live {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        Some((lo, self.node_on_path(key, lo)?))
    }

    /// Handle of the largest leaf `<= key`, equal keys included.
    fn floor_handle(&self, key: u64) -> Option<Handle> {
        match self.exact_leaf(key) {
            Some(h) => Some(h),
            None => self.absent_pred_handle(key),
        }
    }

    /// Predecessor handle for a key known to be absent. The deepest live
    /// ancestor diverges from the key's path right below itself, so its
    /// live leaves sit entirely on one side of `key`.
    fn absent_pred_handle(&self, key: u64) -> Option<Handle> {
        let (depth, idx) = self.deepest_live_ancestor(key)?;
        let node = &self.nodes[idx as usize];
        if self.bit(key, depth) == 1 {
            // Live leaves hang off the 0-child, all below the key.
            node.max_leaf
        } else {
            // Live leaves hang off the 1-child, all above the key.
            self.leaves.prev(node.min_leaf?)
        }
    }

    fn absent_succ_handle(&self, key: u64) -> Option<Handle> {
        let (depth, idx) = self.deepest_live_ancestor(key)?;
        let node = &self.nodes[idx as usize];
        if self.bit(key, depth) == 0 {
            node.min_leaf
        } else {
            self.leaves.next(node.max_leaf?)
        }
    }

    /// Widen a node's min/max descendant handles to cover a new leaf.
    fn bump_descendants(&mut self, idx: u32, h: Handle, key: u64) {
        let min = self.nodes[idx as usize].min_leaf;
        match min {
            Some(m) if self.leaf_key(m) <= key => {}
            _ => self.nodes[idx as usize].min_leaf = Some(h),
        }
        let max = self.nodes[idx as usize].max_leaf;
        match max {
            Some(m) if self.leaf_key(m) >= key => {}
            _ => self.nodes[idx as usize].max_leaf = Some(h),
        }
    }

    #[cfg(test)]
    pub(crate) fn validate(&self) {
        let keys: Vec<u64> = self.iter().map(|(k, _)| k).collect();
        for w in keys.windows(2) {
            assert!(w[0] < w[1], "leaf list out of order: {} then {}", w[0], w[1]);
        }
        for &k in &keys {
            assert!(self.exact_leaf(k).is_some(), "leaf {} unreachable", k);
        }
        self.check_node(0, 0, 0);
        for (i, level) in self.levels.iter().enumerate() {
            for (&p, &idx) in level.entries() {
                assert!(
                    (idx as usize) < self.nodes.len(),
                    "level {} prefix {:b} points at a dangling node",
                    i + 1,
                    p
                );
            }
        }
    }

    #[cfg(test)]
    fn check_node(&self, idx: u32, depth: u32, prefix: u64) -> (Option<u64>, Option<u64>) {
        let node = &self.nodes[idx as usize];
        if let Some(h) = node.leaf {
            assert_eq!(depth, self.bits, "leaf stored on an interior node");
            assert_eq!(self.leaf_key(h), prefix, "terminal node holds a foreign leaf");
        }
        let mut min = node.leaf.map(|h| self.leaf_key(h));
        let mut max = min;
        for b in 0..2u64 {
            let child = node.children[b as usize];
            if child == NIL {
                continue;
            }
            let (cmin, cmax) = self.check_node(child, depth + 1, (prefix << 1) | b);
            min = match (min, cmin) {
                (Some(a), Some(c)) => Some(a.min(c)),
                (a, c) => a.or(c),
            };
            max = match (max, cmax) {
                (Some(a), Some(c)) => Some(a.max(c)),
                (a, c) => a.or(c),
            };
        }
        assert_eq!(
            node.min_leaf.map(|h| self.leaf_key(h)),
            min,
            "min descendant mismatch at depth {}",
            depth
        );
        assert_eq!(
            node.max_leaf.map(|h| self.leaf_key(h)),
            max,
            "max descendant mismatch at depth {}",
            depth
        );
        (min, max)
    }
}

impl<V> Default for XFastTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}
