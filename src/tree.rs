//! An ordered multiset implemented with an AVL tree.

use std::borrow::Borrow;
use std::fmt;
use std::iter::{FromIterator, FusedIterator};

use log::debug;

use crate::error::InvariantViolation;
use crate::node::{Link, Node};

/// An ordered collection of keys implemented with an AVL tree.
/// Equal keys may be inserted more than once and are all kept.
///
/// ```
/// use avltree::AvlTree;
/// let mut tree = AvlTree::new();
/// tree.insert(3);
/// tree.insert(1);
/// tree.insert(3);
/// assert!(tree.contains(&3));
/// assert_eq!(tree.count(&3), 2);
/// tree.remove(&3);
/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
/// ```
#[derive(Clone)]
pub struct AvlTree<K> {
    root: Link<K>,
    num_nodes: usize,
}

/// An iterator over the keys of a tree in ascending order.
pub struct Iter<'a, K> {
    front: Vec<&'a Node<K>>,
    back: Vec<&'a Node<K>>,
    remaining: usize,
}

/// An owning iterator over the keys of a tree in ascending order.
pub struct IntoIter<K> {
    stack: Vec<Box<Node<K>>>,
    remaining: usize,
}

impl<K: Ord> AvlTree<K> {
    /// Creates an empty tree.
    /// No memory is allocated until the first key is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
        }
    }

    /// Inserts a key into the tree.
    /// A key equal to one already present is added as another occurrence.
    pub fn insert(&mut self, key: K) {
        self.root = Some(Node::insert(self.root.take(), key));
        self.num_nodes += 1;
    }

    /// Removes one occurrence of a key from the tree.
    /// Returns whether the key was present. Removing a missing key leaves the tree unchanged.
    ///
    /// The key may be any borrowed form of the tree's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes one occurrence of a key from the tree and returns it.
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // Missing keys leave the tree untouched.
        if !self.contains(key) {
            return None;
        }
        let (root, removed) = Node::remove(self.root.take(), key);
        self.root = root;
        if removed.is_some() {
            debug_assert!(self.num_nodes >= 1);
            self.num_nodes -= 1;
        }
        removed
    }

    /// Returns true if the tree contains a key equal to the given one.
    ///
    /// The key may be any borrowed form of the tree's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns a reference to a key in the tree that is equal to the given one.
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Node::find(self.root.as_deref(), key).map(|node| &node.key)
    }

    /// Returns the number of occurrences of a key in the tree.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.root.as_ref().map_or(0, |root| root.count(key))
    }

    /// Verifies cached heights, the AVL condition, key ordering and the key count.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut num_nodes = 0;
        if let Some(ref root) = self.root {
            root.check(None, None, &mut num_nodes)?;
        }
        if num_nodes != self.num_nodes {
            return Err(InvariantViolation::LengthMismatch {
                expected: self.num_nodes,
                actual: num_nodes,
            });
        }
        Ok(())
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        if let Err(violation) = self.check_invariants() {
            panic!("inconsistent AVL tree: {}", violation);
        }
    }
}

impl<K> AvlTree<K> {
    /// Returns true if the tree contains no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of keys in the tree, counting every occurrence.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the height of the tree.
    /// Both an empty tree and a tree with a single key have height 0.
    pub fn height(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.height)
    }

    /// Clears the tree, deallocating all memory.
    pub fn clear(&mut self) {
        debug!("clearing tree of {} keys", self.num_nodes);
        self.root = None;
        self.num_nodes = 0;
    }

    /// Returns the smallest key in the tree.
    pub fn first(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some(&node.key)
    }

    /// Returns the largest key in the tree.
    pub fn last(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some(&node.key)
    }

    /// Gets an iterator over the keys of the tree in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(self.root.as_deref(), self.num_nodes)
    }

    /// Checks that every node satisfies the AVL condition.
    /// Heights are recomputed from scratch rather than taken from the cache,
    /// so this is meant for tests and diagnostics only.
    pub fn assert_avl_property(&self) -> bool {
        self.root.as_ref().map_or(true, |root| root.is_avl())
    }
}

impl<K: Ord> Default for AvlTree<K> {
    /// Creates an empty tree.
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> FromIterator<K> for AvlTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        for key in iter {
            tree.insert(key);
        }
        tree
    }
}

impl<K: Ord> Extend<K> for AvlTree<K> {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = K>,
    {
        iter.into_iter().for_each(move |key| self.insert(key));
    }
}

impl<'a, K> Extend<&'a K> for AvlTree<K>
where
    K: Ord + Copy,
    K: 'a,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = &'a K>,
    {
        self.extend(iter.into_iter().copied());
    }
}

impl<K: PartialEq> PartialEq for AvlTree<K> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq> Eq for AvlTree<K> {}

impl<K: fmt::Debug> fmt::Debug for AvlTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Linear representation of the tree shape, e.g. `avl:(L:(L: 1 R:) 2 R:(L: 3 R:))`.
impl<K: fmt::Display> fmt::Display for AvlTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.root {
            None => write!(f, "avl:()"),
            Some(ref root) => write!(f, "avl:{}", root),
        }
    }
}

impl<'a, K> IntoIterator for &'a AvlTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K> IntoIterator for AvlTree<K> {
    type Item = K;
    type IntoIter = IntoIter<K>;
    fn into_iter(mut self) -> Self::IntoIter {
        let mut into_iter = IntoIter {
            stack: Vec::with_capacity(self.height() + 1),
            remaining: self.num_nodes,
        };
        into_iter.push_left(self.root.take());
        into_iter
    }
}

impl<'a, K> Iter<'a, K> {
    fn new(root: Option<&'a Node<K>>, len: usize) -> Self {
        let mut iter = Self {
            front: Vec::new(),
            back: Vec::new(),
            remaining: len,
        };
        iter.push_left(root);
        iter.push_right(root);
        iter
    }

    fn push_left(&mut self, mut current: Option<&'a Node<K>>) {
        while let Some(node) = current {
            self.front.push(node);
            current = node.left.as_deref();
        }
    }

    fn push_right(&mut self, mut current: Option<&'a Node<K>>) {
        while let Some(node) = current {
            self.back.push(node);
            current = node.right.as_deref();
        }
    }
}

// Auto derived clone seems to have an invalid type bound of K: Clone
impl<'a, K> Clone for Iter<'a, K> {
    fn clone(&self) -> Self {
        Self {
            front: self.front.clone(),
            back: self.back.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Iter<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front.pop()?;
        self.push_left(node.right.as_deref());
        self.remaining -= 1;
        Some(&node.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K> DoubleEndedIterator for Iter<'a, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back.pop()?;
        self.push_right(node.left.as_deref());
        self.remaining -= 1;
        Some(&node.key)
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

impl<K> IntoIter<K> {
    fn push_left(&mut self, mut link: Link<K>) {
        while let Some(mut node) = link {
            link = node.left.take();
            self.stack.push(node);
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for IntoIter<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        let mut node = self.stack.pop()?;
        self.push_left(node.right.take());
        self.remaining -= 1;
        let Node { key, .. } = *node;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}

impl<K> FusedIterator for IntoIter<K> {}
