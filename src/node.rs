use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::fmt;
use std::mem;

use log::trace;

use crate::error::InvariantViolation;

pub(crate) type Link<K> = Option<Box<Node<K>>>;

/// Tree node owning its children.
/// `height` caches the length of the longest path down to a leaf, so a leaf has height 0.
#[derive(Clone)]
pub(crate) struct Node<K> {
    pub(crate) key: K,
    pub(crate) left: Link<K>,
    pub(crate) right: Link<K>,
    pub(crate) height: usize,
}

impl<K> Node<K> {
    pub(crate) fn new(key: K) -> Box<Self> {
        Box::new(Node {
            key,
            left: None,
            right: None,
            height: 0,
        })
    }

    /// Height of the left subtree plus one, or 0 if there is no left child.
    fn left_height(&self) -> usize {
        match self.left {
            None => 0,
            Some(ref left) => left.height + 1,
        }
    }

    /// Height of the right subtree plus one, or 0 if there is no right child.
    fn right_height(&self) -> usize {
        match self.right {
            None => 0,
            Some(ref right) => right.height + 1,
        }
    }

    /// Refreshes the cached height from the cached heights of the children.
    pub(crate) fn adjust_height(&mut self) {
        self.height = cmp::max(self.left_height(), self.right_height());
    }

    /// Computes the height by walking the whole subtree, ignoring cached values.
    pub(crate) fn dynamic_height(&self) -> usize {
        let left = self.left.as_ref().map_or(0, |left| left.dynamic_height() + 1);
        let right = self.right.as_ref().map_or(0, |right| right.dynamic_height() + 1);
        cmp::max(left, right)
    }

    /// Positive when left heavy, negative when right heavy.
    pub(crate) fn balance_factor(&self) -> isize {
        self.left_height() as isize - self.right_height() as isize
    }

    /// Same as `balance_factor` but based on `dynamic_height`.
    pub(crate) fn dynamic_balance_factor(&self) -> isize {
        let left = self.left.as_ref().map_or(0, |left| left.dynamic_height() + 1);
        let right = self.right.as_ref().map_or(0, |right| right.dynamic_height() + 1);
        left as isize - right as isize
    }

    /// Checks the AVL condition at every node of the subtree using recomputed heights.
    pub(crate) fn is_avl(&self) -> bool {
        self.dynamic_balance_factor().abs() <= 1
            && self.left.as_ref().map_or(true, |left| left.is_avl())
            && self.right.as_ref().map_or(true, |right| right.is_avl())
    }

    //     n          l
    //    / \        / \
    //   l   c  ->  a   n
    //  / \            / \
    // a   b          b   c
    //
    // Height of the returned root is left to the caller.
    pub(crate) fn rotate_right(mut self: Box<Self>) -> Box<Self> {
        match self.left.take() {
            None => self,
            Some(mut new_root) => {
                trace!("rotate right at height {}", self.height);
                self.left = new_root.right.take();
                self.adjust_height();
                new_root.right = Some(self);
                new_root
            }
        }
    }

    //   n              r
    //  / \            / \
    // a   r    ->    n   c
    //    / \        / \
    //   b   c      a   b
    pub(crate) fn rotate_left(mut self: Box<Self>) -> Box<Self> {
        match self.right.take() {
            None => self,
            Some(mut new_root) => {
                trace!("rotate left at height {}", self.height);
                self.right = new_root.left.take();
                self.adjust_height();
                new_root.left = Some(self);
                new_root
            }
        }
    }

    //     n                g
    //    / \             /   \
    //   c   d           c     n
    //  / \       ->    / \   / \
    // a   g           a   b e   d
    //    / \
    //   b   e
    pub(crate) fn rotate_left_right(mut self: Box<Self>) -> Box<Self> {
        let mut child = match self.left.take() {
            None => return self,
            Some(child) => child,
        };
        match child.right.take() {
            None => {
                // Left child is not right heavy, a single rotation does it.
                self.left = Some(child);
                self.rotate_right()
            }
            Some(mut new_root) => {
                trace!("rotate left-right at height {}", self.height);
                child.right = new_root.left.take();
                self.left = new_root.right.take();
                child.adjust_height();
                self.adjust_height();
                new_root.left = Some(child);
                new_root.right = Some(self);
                new_root
            }
        }
    }

    //   n                  g
    //  / \               /   \
    // d   c             n     c
    //    / \     ->    / \   / \
    //   g   a         d   b e   a
    //  / \
    // b   e
    pub(crate) fn rotate_right_left(mut self: Box<Self>) -> Box<Self> {
        let mut child = match self.right.take() {
            None => return self,
            Some(child) => child,
        };
        match child.left.take() {
            None => {
                self.right = Some(child);
                self.rotate_left()
            }
            Some(mut new_root) => {
                trace!("rotate right-left at height {}", self.height);
                child.left = new_root.right.take();
                self.right = new_root.left.take();
                child.adjust_height();
                self.adjust_height();
                new_root.left = Some(self);
                new_root.right = Some(child);
                new_root
            }
        }
    }

    /// Restores the AVL condition at this node after one of its subtrees lost height.
    /// Initial balance must not exceed +2 or -2, which always holds after a single update.
    fn rebalance(self: Box<Self>) -> Box<Self> {
        let balance = self.balance_factor();
        debug_assert!(balance.abs() <= 2);
        if balance == 2 {
            let left_balance = self.left.as_ref().map_or(0, |left| left.balance_factor());
            if left_balance >= 0 {
                self.rotate_right()
            } else {
                self.rotate_left_right()
            }
        } else if balance == -2 {
            let right_balance = self.right.as_ref().map_or(0, |right| right.balance_factor());
            if right_balance <= 0 {
                self.rotate_left()
            } else {
                self.rotate_right_left()
            }
        } else {
            self
        }
    }

    /// Detaches the rightmost node of the subtree.
    /// Returns the remaining subtree and the detached key.
    fn remove_max(mut self: Box<Self>) -> (Link<K>, K) {
        match self.right.take() {
            None => {
                let Node { key, left, .. } = *self;
                (left, key)
            }
            Some(right) => {
                let (right, max) = right.remove_max();
                self.right = right;
                let mut new_root = self.rebalance();
                new_root.adjust_height();
                (Some(new_root), max)
            }
        }
    }
}

impl<K: Ord> Node<K> {
    /// Inserts a key into the subtree at `link` and returns the new subtree root.
    /// Keys equal to a node's key go to its left.
    pub(crate) fn insert(link: Link<K>, key: K) -> Box<Self> {
        match link {
            None => Node::new(key),
            Some(node) => node.add(key),
        }
    }

    fn add(mut self: Box<Self>, key: K) -> Box<Self> {
        let mut new_root;
        if key <= self.key {
            // If this node ends up unbalanced, nothing below has been rotated
            // and the left child is still the one compared against here.
            let outer = self.left.as_ref().map_or(true, |left| key <= left.key);
            self.left = Some(Self::insert(self.left.take(), key));
            new_root = if self.balance_factor() == 2 {
                if outer {
                    self.rotate_right()
                } else {
                    self.rotate_left_right()
                }
            } else {
                self
            };
        } else {
            let outer = self.right.as_ref().map_or(true, |right| key > right.key);
            self.right = Some(Self::insert(self.right.take(), key));
            new_root = if self.balance_factor() == -2 {
                if outer {
                    self.rotate_left()
                } else {
                    self.rotate_right_left()
                }
            } else {
                self
            };
        }
        new_root.adjust_height();
        new_root
    }

    /// Removes one occurrence of `key` from the subtree at `link`.
    /// Returns the new subtree root and the removed key, if any.
    /// A missing key leaves the subtree untouched.
    pub(crate) fn remove<Q>(link: Link<K>, key: &Q) -> (Link<K>, Option<K>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = match link {
            None => return (None, None),
            Some(node) => node,
        };
        let removed = match key.cmp(node.key.borrow()) {
            Ordering::Equal => match node.left.take() {
                None => {
                    let Node { key, right, .. } = *node;
                    return (right, Some(key));
                }
                Some(left) => {
                    // Replace by in-order predecessor
                    let (left, predecessor) = left.remove_max();
                    node.left = left;
                    Some(mem::replace(&mut node.key, predecessor))
                }
            },
            Ordering::Less => {
                let (left, removed) = Self::remove(node.left.take(), key);
                node.left = left;
                removed
            }
            Ordering::Greater => {
                let (right, removed) = Self::remove(node.right.take(), key);
                node.right = right;
                removed
            }
        };
        let mut new_root = node.rebalance();
        new_root.adjust_height();
        (Some(new_root), removed)
    }

    /// Looks up a node holding a key equal to `key`.
    pub(crate) fn find<'a, Q>(mut current: Option<&'a Self>, key: &Q) -> Option<&'a Self>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        while let Some(node) = current {
            current = match key.cmp(node.key.borrow()) {
                Ordering::Equal => break,
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            };
        }
        current
    }

    /// Number of keys in the subtree equal to `key`.
    pub(crate) fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let left = || self.left.as_ref().map_or(0, |left| left.count(key));
        let right = || self.right.as_ref().map_or(0, |right| right.count(key));
        match key.cmp(self.key.borrow()) {
            Ordering::Equal => 1 + left() + right(),
            Ordering::Less => left(),
            Ordering::Greater => right(),
        }
    }

    /// Verifies cached heights, the AVL condition and key ordering of the subtree.
    /// `lower` and `upper` are inclusive bounds inherited from the ancestors.
    /// `position` counts visited nodes in in-order sequence.
    /// Returns the actual height of the subtree.
    pub(crate) fn check(
        &self,
        lower: Option<&K>,
        upper: Option<&K>,
        position: &mut usize,
    ) -> Result<usize, InvariantViolation> {
        let left_height = match self.left {
            None => 0,
            Some(ref left) => left.check(lower, Some(&self.key), position)? + 1,
        };

        let here = *position;
        *position += 1;
        let below_lower = lower.map_or(false, |lower| self.key < *lower);
        let above_upper = upper.map_or(false, |upper| self.key > *upper);
        if below_lower || above_upper {
            return Err(InvariantViolation::OutOfOrder { position: here });
        }

        let right_height = match self.right {
            None => 0,
            Some(ref right) => right.check(Some(&self.key), upper, position)? + 1,
        };

        let actual = cmp::max(left_height, right_height);
        if self.height != actual {
            return Err(InvariantViolation::HeightMismatch {
                position: here,
                cached: self.height,
                actual,
            });
        }

        let balance = left_height as isize - right_height as isize;
        if balance.abs() > 1 {
            return Err(InvariantViolation::Unbalanced {
                position: here,
                balance,
            });
        }

        Ok(actual)
    }
}

impl<K: fmt::Display> fmt::Display for Node<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(L:")?;
        if let Some(ref left) = self.left {
            write!(f, "{}", left)?;
        }
        write!(f, " {} R:", self.key)?;
        if let Some(ref right) = self.right {
            write!(f, "{}", right)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(key: i32) -> Box<Node<i32>> {
        Node::new(key)
    }

    fn branch(key: i32, left: Link<i32>, right: Link<i32>) -> Box<Node<i32>> {
        let mut node = Box::new(Node {
            key,
            left,
            right,
            height: 0,
        });
        node.adjust_height();
        node
    }

    fn keys(node: &Node<i32>, out: &mut Vec<i32>) {
        if let Some(ref left) = node.left {
            keys(left, out);
        }
        out.push(node.key);
        if let Some(ref right) = node.right {
            keys(right, out);
        }
    }

    fn check(node: &Node<i32>) -> Result<usize, InvariantViolation> {
        let mut position = 0;
        node.check(None, None, &mut position)
    }

    #[test]
    fn test_heights() {
        let node = leaf(1);
        assert_eq!(node.height, 0);
        assert_eq!(node.dynamic_height(), 0);
        assert_eq!(node.balance_factor(), 0);

        let node = branch(2, Some(leaf(1)), None);
        assert_eq!(node.height, 1);
        assert_eq!(node.balance_factor(), 1);

        let node = branch(3, Some(branch(2, Some(leaf(1)), None)), None);
        assert_eq!(node.height, 2);
        assert_eq!(node.dynamic_height(), 2);
        assert_eq!(node.balance_factor(), 2);
        assert_eq!(node.dynamic_balance_factor(), 2);
        assert!(!node.is_avl());
    }

    #[test]
    fn test_dynamic_height_ignores_cache() {
        let mut node = branch(2, Some(leaf(1)), Some(leaf(3)));
        node.height = 7;
        assert_eq!(node.dynamic_height(), 1);
        assert!(node.is_avl());
        assert_eq!(
            check(&node),
            Err(InvariantViolation::HeightMismatch {
                position: 1,
                cached: 7,
                actual: 1
            })
        );
    }

    #[test]
    fn test_rotate_right() {
        //     4        2
        //    / \      / \
        //   2   5 -> 1   4
        //  / \          / \
        // 1   3        3   5
        let node = branch(
            4,
            Some(branch(2, Some(leaf(1)), Some(leaf(3)))),
            Some(leaf(5)),
        );
        let mut root = node.rotate_right();
        root.adjust_height();
        assert_eq!(root.key, 2);
        assert_eq!(root.height, 2);
        let right = root.right.as_ref().unwrap();
        assert_eq!(right.key, 4);
        assert_eq!(right.height, 1);
        assert_eq!(right.left.as_ref().unwrap().key, 3);

        let mut out = Vec::new();
        keys(&root, &mut out);
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_rotate_left() {
        let node = branch(1, None, Some(branch(2, None, Some(leaf(3)))));
        let mut root = node.rotate_left();
        root.adjust_height();
        assert_eq!(root.key, 2);
        assert_eq!(root.height, 1);
        assert_eq!(check(&root), Ok(1));
    }

    #[test]
    fn test_rotate_left_right() {
        //     3        2
        //    /        / \
        //   1    ->  1   3
        //    \
        //     2
        let node = branch(3, Some(branch(1, None, Some(leaf(2)))), None);
        let mut root = node.rotate_left_right();
        root.adjust_height();
        assert_eq!(root.key, 2);
        assert_eq!(root.left.as_ref().unwrap().key, 1);
        assert_eq!(root.right.as_ref().unwrap().key, 3);
        assert_eq!(check(&root), Ok(1));
    }

    #[test]
    fn test_rotate_right_left() {
        let node = branch(
            1,
            Some(leaf(0)),
            Some(branch(
                4,
                Some(branch(2, None, Some(leaf(3)))),
                Some(leaf(5)),
            )),
        );
        let mut root = node.rotate_right_left();
        root.adjust_height();
        assert_eq!(root.key, 2);
        assert_eq!(check(&root), Ok(2));

        let mut out = Vec::new();
        keys(&root, &mut out);
        assert_eq!(out, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_insert_ties_go_left() {
        let mut root = Node::insert(None, 5);
        root = Node::insert(Some(root), 5);
        assert!(root.right.is_none());
        assert_eq!(root.left.as_ref().unwrap().key, 5);

        // Third insert rotates, moving an equal key to the right
        root = Node::insert(Some(root), 5);
        assert_eq!(root.height, 1);
        assert_eq!(root.count(&5), 3);
        assert_eq!(check(&root), Ok(1));
    }

    #[test]
    fn test_remove_missing() {
        let root = branch(2, Some(leaf(1)), Some(leaf(3)));
        let (root, removed) = Node::remove(Some(root), &42);
        assert!(removed.is_none());
        let root = root.unwrap();
        let mut out = Vec::new();
        keys(&root, &mut out);
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_uses_predecessor() {
        let root = branch(2, Some(leaf(1)), Some(leaf(3)));
        let (root, removed) = Node::remove(Some(root), &2);
        assert_eq!(removed, Some(2));
        let root = root.unwrap();
        assert_eq!(root.key, 1);
        assert!(root.left.is_none());
        assert_eq!(check(&root), Ok(1));
    }

    #[test]
    fn test_check_order() {
        let node = branch(2, Some(leaf(3)), None);
        assert_eq!(
            check(&node),
            Err(InvariantViolation::OutOfOrder { position: 0 })
        );
    }

    #[test]
    fn test_check_balance() {
        let node = branch(3, Some(branch(2, Some(leaf(1)), None)), None);
        assert_eq!(
            check(&node),
            Err(InvariantViolation::Unbalanced {
                position: 2,
                balance: 2
            })
        );
    }

    #[test]
    fn test_display() {
        let node = branch(2, Some(leaf(1)), Some(leaf(3)));
        assert_eq!(node.to_string(), "(L:(L: 1 R:) 2 R:(L: 3 R:))");
    }
}
