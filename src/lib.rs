//! An ordered multiset of keys implemented with an AVL tree.
//!
//! Every insert and remove rebalances the tree on the way back up from the
//! modified leaf, so lookups, inserts and removals take `O(log n)` time.
//! Equal keys are kept as separate occurrences.
//!
//! ```
//! use avltree::AvlTree;
//! let tree: AvlTree<_> = [5, 3, 8, 1, 4, 7, 9].into_iter().collect();
//! assert!(tree.assert_avl_property());
//! assert_eq!(tree.height(), 2);
//! assert_eq!(tree.first(), Some(&1));
//! ```

mod error;
mod node;
pub mod tree;

pub use error::InvariantViolation;
pub use tree::AvlTree;
