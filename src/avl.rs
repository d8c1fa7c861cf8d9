//! Self-balancing binary search tree over `u64` keys.
//!
//! Classic AVL: heights on every node, single or double rotations picked by
//! the heavier child's lean. Nodes live in an arena (`Vec` of `Option` slots
//! plus a free list) and link by `u32` index, with `u32::MAX` as nil. All
//! walks are iterative with an explicit path stack; nothing here recurses at
//! runtime, and dropping the tree drops a flat `Vec`.

const NIL: u32 = u32::MAX;

struct AvlNode<V> {
    key: u64,
    value: V,
    height: u8,
    left: u32,
    right: u32,
}

pub struct AvlTree<V> {
    nodes: Vec<Option<AvlNode<V>>>,
    free: Vec<u32>,
    root: u32,
    len: usize,
}

impl<V> AvlTree<V> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NIL,
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

    #[inline]
    fn node(&self, idx: u32) -> &AvlNode<V> {
        self.nodes[idx as usize].as_ref().expect("live node")
    }

    #[inline]
    fn node_mut(&mut self, idx: u32) -> &mut AvlNode<V> {
        self.nodes[idx as usize].as_mut().expect("live node")
    }

    #[inline]
    fn height(&self, idx: u32) -> u8 {
        if idx == NIL {
            0
        } else {
            self.node(idx).height
        }
    }

    fn update_height(&mut self, idx: u32) {
        let (l, r) = {
            let n = self.node(idx);
            (n.left, n.right)
        };
        let h = 1 + self.height(l).max(self.height(r));
        self.node_mut(idx).height = h;
    }

    #[inline]
    fn balance_factor(&self, idx: u32) -> i16 {
        let n = self.node(idx);
        self.height(n.left) as i16 - self.height(n.right) as i16
    }

    fn rotate_right(&mut self, idx: u32) -> u32 {
        let l = self.node(idx).left;
        let lr = self.node(l).right;
        self.node_mut(idx).left = lr;
        self.node_mut(l).right = idx;
        self.update_height(idx);
        self.update_height(l);
        l
    }

    fn rotate_left(&mut self, idx: u32) -> u32 {
        let r = self.node(idx).right;
        let rl = self.node(r).left;
        self.node_mut(idx).right = rl;
        self.node_mut(r).left = idx;
        self.update_height(idx);
        self.update_height(r);
        r
    }

    /// Restore the AVL invariant at `idx`, returning the subtree's new root.
    fn rebalance(&mut self, idx: u32) -> u32 {
        self.update_height(idx);
        let bf = self.balance_factor(idx);
        if bf > 1 {
            let l = self.node(idx).left;
            if self.balance_factor(l) < 0 {
                let new_l = self.rotate_left(l);
                self.node_mut(idx).left = new_l;
            }
            self.rotate_right(idx)
        } else if bf < -1 {
            let r = self.node(idx).right;
            if self.balance_factor(r) > 0 {
                let new_r = self.rotate_right(r);
                self.node_mut(idx).right = new_r;
            }
            self.rotate_left(idx)
        } else {
            idx
        }
    }

    /// Walk the recorded root path bottom-up, rebalancing each node and
    /// re-linking any rotated subtree to its parent.
    fn reconnect(&mut self, path: &[u32]) {
        for i in (0..path.len()).rev() {
            let new_root = self.rebalance(path[i]);
            if i == 0 {
                self.root = new_root;
            } else {
                let parent = path[i - 1];
                if self.node(new_root).key < self.node(parent).key {
                    self.node_mut(parent).left = new_root;
                } else {
                    self.node_mut(parent).right = new_root;
                }
            }
        }
    }

    fn alloc(&mut self, node: AvlNode<V>) -> u32 {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx as usize] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                (self.nodes.len() - 1) as u32
            }
        }
    }

    /// Insert or overwrite, returning the displaced value.
    pub fn insert(&mut self, key: u64, value: V) -> Option<V> {
        let fresh = AvlNode {
            key,
            value,
            height: 1,
            left: NIL,
            right: NIL,
        };
        if self.root == NIL {
            self.root = self.alloc(fresh);
            self.len += 1;
            return None;
        }
        let mut path = Vec::new();
        let mut cur = self.root;
        loop {
            path.push(cur);
            let (nkey, left, right) = {
                let n = self.node(cur);
                (n.key, n.left, n.right)
            };
            if key == nkey {
                return Some(std::mem::replace(&mut self.node_mut(cur).value, fresh.value));
            }
            if key < nkey {
                if left == NIL {
                    let idx = self.alloc(fresh);
                    self.node_mut(cur).left = idx;
                    break;
                }
                cur = left;
            } else {
                if right == NIL {
                    let idx = self.alloc(fresh);
                    self.node_mut(cur).right = idx;
                    break;
                }
                cur = right;
            }
        }
        self.len += 1;
        self.reconnect(&path);
        None
    }

    /// Remove `key`, returning its value. Absent keys are a no-op.
    pub fn remove(&mut self, key: u64) -> Option<V> {
        let mut path = Vec::new();
        let mut cur = self.root;
        loop {
            if cur == NIL {
                return None;
            }
            let nkey = self.node(cur).key;
            if key == nkey {
                break;
            }
            path.push(cur);
            cur = if key < nkey {
                self.node(cur).left
            } else {
                self.node(cur).right
            };
        }
        let (left, right) = {
            let n = self.node(cur);
            (n.left, n.right)
        };
        let removed;
        if left != NIL && right != NIL {
            // Two children: splice in the right subtree's minimum.
            path.push(cur);
            let mut sp = cur;
            let mut s = right;
            while self.node(s).left != NIL {
                path.push(s);
                sp = s;
                s = self.node(s).left;
            }
            let s_right = self.node(s).right;
            if sp == cur {
                self.node_mut(cur).right = s_right;
            } else {
                self.node_mut(sp).left = s_right;
            }
            let snode = self.nodes[s as usize].take().expect("live node");
            self.free.push(s);
            let n = self.node_mut(cur);
            n.key = snode.key;
            removed = std::mem::replace(&mut n.value, snode.value);
        } else {
            let child = if left != NIL { left } else { right };
            if let Some(&parent) = path.last() {
                if self.node(parent).left == cur {
                    self.node_mut(parent).left = child;
                } else {
                    self.node_mut(parent).right = child;
                }
            } else {
                self.root = child;
            }
            let n = self.nodes[cur as usize].take().expect("live node");
            self.free.push(cur);
            removed = n.value;
        }
        self.len -= 1;
        self.reconnect(&path);
        Some(removed)
    }

    pub fn get(&self, key: u64) -> Option<&V> {
        let mut cur = self.root;
        while cur != NIL {
            let n = self.node(cur);
            if key == n.key {
                return Some(&n.value);
            }
            cur = if key < n.key { n.left } else { n.right };
        }
        None
    }

    pub fn contains(&self, key: u64) -> bool {
        self.get(key).is_some()
    }

    pub fn min(&self) -> Option<(u64, &V)> {
        let mut cur = self.root;
        if cur == NIL {
            return None;
        }
        while self.node(cur).left != NIL {
            cur = self.node(cur).left;
        }
        let n = self.node(cur);
        Some((n.key, &n.value))
    }

    pub fn max(&self) -> Option<(u64, &V)> {
        let mut cur = self.root;
        if cur == NIL {
            return None;
        }
        while self.node(cur).right != NIL {
            cur = self.node(cur).right;
        }
        let n = self.node(cur);
        Some((n.key, &n.value))
    }

    /// Largest entry with key strictly below `key`.
    pub fn predecessor(&self, key: u64) -> Option<(u64, &V)> {
        let mut cur = self.root;
        let mut best = NIL;
        while cur != NIL {
            let n = self.node(cur);
            if n.key < key {
                best = cur;
                cur = n.right;
            } else {
                cur = n.left;
            }
        }
        if best == NIL {
            return None;
        }
        let n = self.node(best);
        Some((n.key, &n.value))
    }

    /// Smallest entry with key strictly above `key`.
    pub fn successor(&self, key: u64) -> Option<(u64, &V)> {
        let mut cur = self.root;
        let mut best = NIL;
        while cur != NIL {
            let n = self.node(cur);
            if n.key > key {
                best = cur;
                cur = n.left;
            } else {
                cur = n.right;
            }
        }
        if best == NIL {
            return None;
        }
        let n = self.node(best);
        Some((n.key, &n.value))
    }

    /// In-order traversal, strictly increasing by key.
    pub fn iter(&self) -> AvlIter<'_, V> {
        let mut it = AvlIter {
            tree: self,
            stack: Vec::new(),
        };
        it.push_left_spine(self.root);
        it
    }

    #[cfg(test)]
    pub(crate) fn validate(&self) {
        fn check<V>(tree: &AvlTree<V>, idx: u32, lo: Option<u64>, hi: Option<u64>) -> (u8, usize) {
            if idx == NIL {
                return (0, 0);
            }
            let n = tree.node(idx);
            if let Some(lo) = lo {
                assert!(n.key > lo, "key {} violates lower bound {}", n.key, lo);
            }
            if let Some(hi) = hi {
                assert!(n.key < hi, "key {} violates upper bound {}", n.key, hi);
            }
            let (lh, lc) = check(tree, n.left, lo, Some(n.key));
            let (rh, rc) = check(tree, n.right, Some(n.key), hi);
            let bf = lh as i16 - rh as i16;
            assert!(bf.abs() <= 1, "balance factor {} at key {}", bf, n.key);
            let h = 1 + lh.max(rh);
            assert_eq!(n.height, h, "stale height at key {}", n.key);
            (h, 1 + lc + rc)
        }
        let (_, count) = check(self, self.root, None, None);
        assert_eq!(count, self.len, "len out of sync with node count");
    }
}

impl<V> Default for AvlTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AvlIter<'a, V> {
    tree: &'a AvlTree<V>,
    stack: Vec<u32>,
}

impl<'a, V> AvlIter<'a, V> {
    fn push_left_spine(&mut self, mut idx: u32) {
        while idx != NIL {
            self.stack.push(idx);
            idx = self.tree.node(idx).left;
        }
    }
}

impl<'a, V> Iterator for AvlIter<'a, V> {
    type Item = (u64, &'a V);

    fn next(&mut self) -> Option<(u64, &'a V)> {
        let idx = self.stack.pop()?;
        let n = self.tree.node(idx);
        self.push_left_spine(n.right);
        Some((n.key, &n.value))
    }
}
