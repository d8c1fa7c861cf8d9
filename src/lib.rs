//! # xyfast
//!
//! Layered ordered index over fixed-width unsigned integer keys, supporting
//! point lookup, insertion, deletion, and predecessor/successor queries.
//!
//! Three structures, each usable on its own:
//!
//! - [`AvlTree`]: a self-balancing binary search tree, the workhorse
//!   ordered map.
//! - [`XFastTrie`]: a bitwise trie with hashed per-level prefix lookup and a
//!   threaded sorted leaf list, for `O(log W)` ordered queries over
//!   `W`-bit keys.
//! - [`ClusterIndex`]: the two-tier composition, clusters of keys held in
//!   AVL trees and indexed by an [`XFastTrie`] over each cluster's minimum.
//!
//! Key width is fixed at construction (`new()` for the full 64 bits,
//! `with_key_bits(w)` for narrower keys); out-of-width keys are rejected
//! with [`Error::KeyOutOfRange`] rather than truncated. Missing keys and
//! empty structures are plain `None` results, never errors.
//!
//! ```
//! use xyfast::ClusterIndex;
//!
//! let mut index = ClusterIndex::new();
//! index.insert(10, "ten")?;
//! index.insert(5, "five")?;
//! assert_eq!(index.search(10)?, Some(&"ten"));
//! assert_eq!(index.predecessor(10)?, Some((5, &"five")));
//! assert_eq!(index.min(), Some((5, &"five")));
//! # Ok::<(), xyfast::Error>(())
//! ```

mod avl;
mod chain;
mod error;
mod list;
mod xfast;
mod yfast;

pub use avl::{AvlIter, AvlTree};
pub use chain::ChainMap;
pub use error::{Error, Result};
pub use list::{Handle, OrderedList};
pub use xfast::XFastTrie;
pub use yfast::ClusterIndex;

#[cfg(test)]
mod proptests;
