//! Randomized model tests: every structure is driven through the same
//! operation sequences as a `BTreeMap` and must agree at every step, then
//! pass a structural validation at the end.

use std::collections::BTreeMap;
use std::ops::Bound;

use proptest::prelude::*;

use crate::{AvlTree, ClusterIndex, XFastTrie};

const KEY_BITS: u32 = 16;

#[derive(Debug, Clone)]
enum Op {
    Insert(u64, u64),
    Remove(u64),
    Search(u64),
    Pred(u64),
    Succ(u64),
}

/// Mostly full-range keys, with a bias toward a small dense band so that
/// sequences actually collide, overwrite, and remove what they inserted.
fn key_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![
        3 => 0u64..(1u64 << KEY_BITS),
        1 => 0u64..64,
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        45 => (key_strategy(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        25 => key_strategy().prop_map(Op::Remove),
        10 => key_strategy().prop_map(Op::Search),
        10 => key_strategy().prop_map(Op::Pred),
        10 => key_strategy().prop_map(Op::Succ),
    ];
    proptest::collection::vec(op, 0..=600)
}

fn model_pred(model: &BTreeMap<u64, u64>, key: u64) -> Option<(u64, u64)> {
    model.range(..key).next_back().map(|(&k, &v)| (k, v))
}

fn model_succ(model: &BTreeMap<u64, u64>, key: u64) -> Option<(u64, u64)> {
    model
        .range((Bound::Excluded(key), Bound::Unbounded))
        .next()
        .map(|(&k, &v)| (k, v))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_avl_matches_btreemap(ops in ops_strategy()) {
        let mut tree: AvlTree<u64> = AvlTree::new();
        let mut model: BTreeMap<u64, u64> = BTreeMap::new();
        for op in ops {
            match op {
                Op::Insert(k, v) => prop_assert_eq!(tree.insert(k, v), model.insert(k, v)),
                Op::Remove(k) => prop_assert_eq!(tree.remove(k), model.remove(&k)),
                Op::Search(k) => prop_assert_eq!(tree.get(k), model.get(&k)),
                Op::Pred(k) => prop_assert_eq!(
                    tree.predecessor(k).map(|(k, &v)| (k, v)),
                    model_pred(&model, k)
                ),
                Op::Succ(k) => prop_assert_eq!(
                    tree.successor(k).map(|(k, &v)| (k, v)),
                    model_succ(&model, k)
                ),
            }
        }
        tree.validate();
        prop_assert_eq!(tree.len(), model.len());
        let got: Vec<(u64, u64)> = tree.iter().map(|(k, &v)| (k, v)).collect();
        let want: Vec<(u64, u64)> = model.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn prop_xfast_matches_btreemap(ops in ops_strategy()) {
        let mut trie: XFastTrie<u64> = XFastTrie::with_key_bits(KEY_BITS).unwrap();
        let mut model: BTreeMap<u64, u64> = BTreeMap::new();
        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    prop_assert_eq!(trie.insert(k, v).unwrap(), model.insert(k, v))
                }
                Op::Remove(k) => prop_assert_eq!(trie.remove(k).unwrap(), model.remove(&k)),
                Op::Search(k) => prop_assert_eq!(trie.get(k).unwrap(), model.get(&k)),
                Op::Pred(k) => prop_assert_eq!(
                    trie.predecessor(k).unwrap().map(|(k, &v)| (k, v)),
                    model_pred(&model, k)
                ),
                Op::Succ(k) => prop_assert_eq!(
                    trie.successor(k).unwrap().map(|(k, &v)| (k, v)),
                    model_succ(&model, k)
                ),
            }
        }
        trie.validate();
        prop_assert_eq!(trie.len(), model.len());
        prop_assert_eq!(
            trie.min().map(|(k, &v)| (k, v)),
            model.iter().next().map(|(&k, &v)| (k, v))
        );
        prop_assert_eq!(
            trie.max().map(|(k, &v)| (k, v)),
            model.iter().next_back().map(|(&k, &v)| (k, v))
        );
        let got: Vec<(u64, u64)> = trie.iter().map(|(k, &v)| (k, v)).collect();
        let want: Vec<(u64, u64)> = model.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn prop_cluster_index_matches_btreemap(ops in ops_strategy()) {
        let mut index: ClusterIndex<u64> = ClusterIndex::with_key_bits(KEY_BITS).unwrap();
        let mut model: BTreeMap<u64, u64> = BTreeMap::new();
        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    prop_assert_eq!(index.insert(k, v).unwrap(), model.insert(k, v))
                }
                Op::Remove(k) => prop_assert_eq!(index.remove(k).unwrap(), model.remove(&k)),
                Op::Search(k) => prop_assert_eq!(index.search(k).unwrap(), model.get(&k)),
                Op::Pred(k) => prop_assert_eq!(
                    index.predecessor(k).unwrap().map(|(k, &v)| (k, v)),
                    model_pred(&model, k)
                ),
                Op::Succ(k) => prop_assert_eq!(
                    index.successor(k).unwrap().map(|(k, &v)| (k, v)),
                    model_succ(&model, k)
                ),
            }
        }
        index.validate();
        prop_assert_eq!(index.len(), model.len());
        prop_assert_eq!(
            index.min().map(|(k, &v)| (k, v)),
            model.iter().next().map(|(&k, &v)| (k, v))
        );
        prop_assert_eq!(
            index.max().map(|(k, &v)| (k, v)),
            model.iter().next_back().map(|(&k, &v)| (k, v))
        );
        let got: Vec<(u64, u64)> = index.iter().map(|(k, &v)| (k, v)).collect();
        let want: Vec<(u64, u64)> = model.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn prop_out_of_range_keys_rejected(
        wide in (1u64 << KEY_BITS)..u64::MAX,
        ops in ops_strategy(),
    ) {
        let mut index: ClusterIndex<u64> = ClusterIndex::with_key_bits(KEY_BITS).unwrap();
        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    index.insert(k, v).unwrap();
                }
                Op::Remove(k) => {
                    index.remove(k).unwrap();
                }
                _ => {}
            }
        }
        let before: Vec<(u64, u64)> = index.iter().map(|(k, &v)| (k, v)).collect();
        prop_assert!(index.insert(wide, 0).is_err());
        prop_assert!(index.remove(wide).is_err());
        prop_assert!(index.search(wide).is_err());
        prop_assert!(index.predecessor(wide).is_err());
        prop_assert!(index.successor(wide).is_err());
        let after: Vec<(u64, u64)> = index.iter().map(|(k, &v)| (k, v)).collect();
        prop_assert_eq!(before, after);
        index.validate();
    }
}
