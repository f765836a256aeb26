use thiserror::Error;

/// A broken structural invariant found by [`AvlTree::check_invariants`].
///
/// Nodes are identified by their zero based position in in-order traversal.
///
/// [`AvlTree::check_invariants`]: crate::AvlTree::check_invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("node {position}: cached height {cached} differs from actual height {actual}")]
    HeightMismatch {
        position: usize,
        cached: usize,
        actual: usize,
    },

    #[error("node {position}: balance factor {balance} is out of range")]
    Unbalanced { position: usize, balance: isize },

    #[error("node {position}: key is out of order with respect to its ancestors")]
    OutOfOrder { position: usize },

    #[error("tree reports {expected} keys but holds {actual} nodes")]
    LengthMismatch { expected: usize, actual: usize },
}
