//! The [`AvlMap`] type: lookup, insertion, deletion and rebalancing.
//!
//! # Overview
//!
//! `AvlMap` is an ordered map backed by a binary search tree whose nodes
//! carry their subtree height and balance factor. Nodes are stored in an
//! arena and link to each other by id, including a back-reference to their
//! parent, which makes successor/predecessor walks possible without a stack.
//!
//! Two [`Balancing`] policies are available:
//!
//! - [`Balancing::Avl`] (default): rotations after every insertion and
//!   deletion keep `|balance| <= 1` on every node, so the height is O(log N).
//! - [`Balancing::Unbalanced`]: the tree is never rotated. Deletion detaches
//!   the children of the erased node and re-inserts each detached subtree by
//!   a placement search. Height and balance are still tracked, but the height
//!   can degrade to O(N).
//!
//! # Time Complexity
//!
//! | Operation               | `Avl`     | `Unbalanced` |
//! |-------------------------|-----------|--------------|
//! | `get` / `find`          | O(log N)  | O(N)         |
//! | `get_or_insert_default` | O(log N)  | O(N)         |
//! | `insert`                | O(log N)  | O(N)         |
//! | `erase` / `remove`      | O(log N)  | O(N)         |
//! | `len` / `is_empty`      | O(1)      | O(1)         |
//! | `clone`                 | O(N)      | O(N)         |
//! | `std::mem::take`        | O(1)      | O(1)         |

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use std::ops::Index;

use tracing::{debug, trace};

use super::node::{Node, NodeArena, NodeId};

// =============================================================================
// Balancing Policy
// =============================================================================

/// How an [`AvlMap`] keeps its shape after structural edits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Balancing {
    /// Rotate after insertion and deletion so that every node's subtree
    /// heights differ by at most one.
    #[default]
    Avl,
    /// Never rotate. Deletion re-attaches the orphaned subtrees of the erased
    /// node by searching for their place again.
    Unbalanced,
}

/// Outcome of a placement search for a key.
enum Placement {
    /// The key is stored in this node.
    Found(NodeId),
    /// The key is absent; a new node would hang below this parent, or become
    /// the root if there is none.
    Vacant(Option<NodeId>),
}

// =============================================================================
// AvlMap Definition
// =============================================================================

/// An ordered map backed by a height-tracking binary search tree.
///
/// Keys must implement `Ord`. Entries are always visited in ascending key
/// order.
///
/// # Examples
///
/// ```rust
/// use avlmap::AvlMap;
///
/// let mut map: AvlMap<i32, i32> = AvlMap::new();
/// for key in [5, 3, 8, 1, 4] {
///     *map.get_or_insert_default(key) += key * 10;
/// }
///
/// let keys: Vec<&i32> = map.keys().collect();
/// assert_eq!(keys, vec![&1, &3, &4, &5, &8]);
///
/// let position = map.find(&5);
/// map.erase(position);
/// assert_eq!(map.find(&5), map.end());
/// assert_eq!(map.len(), 4);
/// ```
pub struct AvlMap<K, V> {
    /// Storage for every node of the tree
    pub(crate) nodes: NodeArena<K, V>,
    /// Root node, absent when the map is empty
    pub(crate) root: Option<NodeId>,
    /// Number of entries
    pub(crate) length: usize,
    /// Shape maintenance policy
    pub(crate) balancing: Balancing,
}

impl<K, V> AvlMap<K, V> {
    /// Creates a new empty map using [`Balancing::Avl`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let map: AvlMap<i32, String> = AvlMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_balancing(Balancing::Avl)
    }

    /// Creates a new empty map using the given balancing policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::{AvlMap, Balancing};
    ///
    /// let mut map = AvlMap::with_balancing(Balancing::Unbalanced);
    /// for key in 0..8 {
    ///     map.insert(key, ());
    /// }
    /// // Ascending insertion without rotations degenerates into a list.
    /// assert_eq!(map.height(), 8);
    /// ```
    #[inline]
    #[must_use]
    pub const fn with_balancing(balancing: Balancing) -> Self {
        Self {
            nodes: NodeArena::new(),
            root: None,
            length: 0,
            balancing,
        }
    }

    /// Returns the balancing policy of this map.
    #[inline]
    #[must_use]
    pub const fn balancing(&self) -> Balancing {
        self.balancing
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the height of the tree: 0 when empty, 1 for a single entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let map: AvlMap<i32, ()> = (0..1023).map(|key| (key, ())).collect();
    /// assert_eq!(map.height(), 10);
    /// ```
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.nodes.height_of(self.root)
    }

    /// Removes every entry. The balancing policy is kept.
    pub fn clear(&mut self) {
        debug!(entries = self.length, "clearing map");
        self.nodes.clear();
        self.root = None;
        self.length = 0;
    }

    /// Returns the smallest key and its value.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root| {
            let node = &self.nodes[self.nodes.first(root)];
            (&node.key, &node.value)
        })
    }

    /// Returns the greatest key and its value.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root| {
            let node = &self.nodes[self.nodes.last(root)];
            (&node.key, &node.value)
        })
    }

    /// Points the link that currently holds `old` (a child slot of `parent`, or
    /// the root when `parent` is `None`) at `new`, and sets `new`'s parent.
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let node = &mut self.nodes[parent];
                if node.left == Some(old) {
                    node.left = new;
                } else {
                    debug_assert_eq!(node.right, Some(old), "{old:?} is not a child of {parent:?}");
                    node.right = new;
                }
            }
        }
        if let Some(new) = new {
            self.nodes[new].parent = parent;
        }
    }

    // =========================================================================
    // Rotations
    // =========================================================================

    /// Rotates the subtree rooted at `node` to the left and returns the new
    /// subtree root (the former right child).
    ///
    /// ```text
    ///     node                pivot
    ///    /    \              /     \
    ///   a    pivot   =>    node     c
    ///       /     \       /    \
    ///      b       c     a      b
    /// ```
    fn rotate_left(&mut self, node: NodeId) -> NodeId {
        debug_assert!(self.nodes[node].right.is_some(), "rotate_left without a right child");
        let Some(pivot) = self.nodes[node].right else {
            return node;
        };
        trace!(?node, ?pivot, "rotate left");

        let inner = self.nodes[pivot].left;
        self.nodes[node].right = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(node);
        }

        let parent = self.nodes[node].parent;
        self.replace_child(parent, node, Some(pivot));
        self.nodes[pivot].left = Some(node);
        self.nodes[node].parent = Some(pivot);

        self.nodes.refresh(node);
        self.nodes.refresh(pivot);
        pivot
    }

    /// Mirror image of [`rotate_left`](Self::rotate_left).
    fn rotate_right(&mut self, node: NodeId) -> NodeId {
        debug_assert!(self.nodes[node].left.is_some(), "rotate_right without a left child");
        let Some(pivot) = self.nodes[node].left else {
            return node;
        };
        trace!(?node, ?pivot, "rotate right");

        let inner = self.nodes[pivot].right;
        self.nodes[node].left = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(node);
        }

        let parent = self.nodes[node].parent;
        self.replace_child(parent, node, Some(pivot));
        self.nodes[pivot].right = Some(node);
        self.nodes[node].parent = Some(pivot);

        self.nodes.refresh(node);
        self.nodes.refresh(pivot);
        pivot
    }

    /// Restores `|balance| <= 1` at `node` with a single or double rotation.
    /// Returns the root of the rebalanced subtree.
    fn rebalance(&mut self, node: NodeId) -> NodeId {
        let balance = self.nodes[node].balance;
        if balance > 1 {
            if let Some(left) = self.nodes[node].left {
                if self.nodes[left].balance < 0 {
                    self.rotate_left(left);
                }
            }
            self.rotate_right(node)
        } else if balance < -1 {
            if let Some(right) = self.nodes[node].right {
                if self.nodes[right].balance > 0 {
                    self.rotate_right(right);
                }
            }
            self.rotate_left(node)
        } else {
            node
        }
    }

    /// Walks from `start` to the root refreshing height and balance. Under
    /// [`Balancing::Avl`] every node left out of balance is rotated on the way.
    fn retrace(&mut self, start: Option<NodeId>) {
        let Some(start) = start else {
            return;
        };

        match self.balancing {
            Balancing::Unbalanced => self.nodes.refresh_balance_and_height(start),
            Balancing::Avl => {
                let mut current = Some(start);
                while let Some(node) = current {
                    self.nodes.refresh(node);
                    let subtree_root = if self.nodes[node].balance.abs() > 1 {
                        trace!(?node, balance = self.nodes[node].balance, "rebalancing");
                        self.rebalance(node)
                    } else {
                        node
                    };
                    current = self.nodes[subtree_root].parent;
                }
            }
        }
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Unlinks `target` from the tree, frees it and returns its entry.
    pub(crate) fn remove_node(&mut self, target: NodeId) -> (K, V)
    where
        K: Ord,
    {
        self.length -= 1;
        match self.balancing {
            Balancing::Avl => self.splice_out(target),
            Balancing::Unbalanced => self.detach_and_reattach(target),
        }
        let node = self.nodes.release(target);
        (node.key, node.value)
    }

    /// Deletion used by [`Balancing::Avl`].
    ///
    /// A node with at most one child is replaced by that child. A node with
    /// two children is replaced by its in-order successor, which is relinked
    /// (not copied) so that every other node keeps its id.
    fn splice_out(&mut self, target: NodeId) {
        let parent = self.nodes[target].parent;
        let left = self.nodes[target].left;
        let right = self.nodes[target].right;

        let retrace_from = match (left, right) {
            (None, None) => {
                self.replace_child(parent, target, None);
                parent
            }
            (Some(child), None) | (None, Some(child)) => {
                self.replace_child(parent, target, Some(child));
                parent
            }
            (Some(left), Some(right)) => {
                let heir = self.nodes.first(right);
                let retrace_from = if heir == right {
                    Some(heir)
                } else {
                    // heir is the leftmost node below `right`, so it is a left
                    // child and has no left child of its own
                    let heir_parent = self.nodes[heir].parent;
                    let heir_right = self.nodes[heir].right;
                    if let Some(heir_parent) = heir_parent {
                        self.nodes[heir_parent].left = heir_right;
                    }
                    if let Some(heir_right) = heir_right {
                        self.nodes[heir_right].parent = heir_parent;
                    }
                    self.nodes[heir].right = Some(right);
                    self.nodes[right].parent = Some(heir);
                    heir_parent
                };
                self.nodes[heir].left = Some(left);
                self.nodes[left].parent = Some(heir);
                self.replace_child(parent, target, Some(heir));
                trace!(?target, ?heir, "spliced in successor");
                retrace_from
            }
        };

        self.retrace(retrace_from);
    }

    /// Deletion used by [`Balancing::Unbalanced`]: detach the children of
    /// `target`, unlink it, then put each detached subtree back by searching
    /// for its attachment point.
    fn detach_and_reattach(&mut self, target: NodeId)
    where
        K: Ord,
    {
        let parent = self.nodes[target].parent;
        let left = self.nodes[target].left.take();
        let right = self.nodes[target].right.take();

        let Some(parent) = parent else {
            let (promoted, other) = match left {
                Some(left) => (Some(left), right),
                None => (right, None),
            };
            self.root = promoted;
            let Some(new_root) = promoted else {
                trace!(?target, "erased the only node");
                return;
            };
            self.nodes[new_root].parent = None;
            trace!(?target, ?new_root, "promoted child to root");
            if let Some(other) = other {
                self.reattach(new_root, other);
            }
            return;
        };

        self.replace_child(Some(parent), target, None);

        if left.is_none() && right.is_none() {
            trace!(?target, ?parent, "erased leaf");
            self.retrace(Some(parent));
            return;
        }

        for child in [left, right].into_iter().flatten() {
            self.reattach(parent, child);
        }
    }

    /// Links the detached subtree rooted at `subtree` below the node found by
    /// a placement search from `start`.
    fn reattach(&mut self, start: NodeId, subtree: NodeId)
    where
        K: Ord,
    {
        let anchor = self.nodes.index(start, &self.nodes[subtree].key);
        let goes_left = self.nodes[anchor].key > self.nodes[subtree].key;
        trace!(?subtree, ?anchor, goes_left, "reattaching subtree");

        let node = &mut self.nodes[anchor];
        if goes_left {
            debug_assert!(node.left.is_none(), "attachment point already has a left child");
            node.left = Some(subtree);
        } else {
            debug_assert!(node.right.is_none(), "attachment point already has a right child");
            node.right = Some(subtree);
        }
        self.nodes[subtree].parent = Some(anchor);
        self.retrace(Some(subtree));
    }
}

impl<K: Ord, V> AvlMap<K, V> {
    /// Finds the node holding `key`.
    pub(crate) fn locate<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let root = self.root?;
        let found = self.nodes.index(root, key);
        (self.nodes[found].key.borrow().cmp(key) == Ordering::Equal).then_some(found)
    }

    /// Searches for `key` from the root.
    fn placement(&self, key: &K) -> Placement {
        let Some(root) = self.root else {
            return Placement::Vacant(None);
        };
        let found = self.nodes.index(root, key);
        if self.nodes[found].key == *key {
            Placement::Found(found)
        } else {
            Placement::Vacant(Some(found))
        }
    }

    /// Stores a new entry as the root (`parent` is `None`, only valid for an
    /// empty map) or as a child of `parent`. Returns the new node's id.
    fn attach(&mut self, parent: Option<NodeId>, key: K, value: V) -> NodeId {
        self.length += 1;
        match parent {
            None => {
                debug_assert!(self.root.is_none(), "attaching a second root");
                let id = self.nodes.allocate(Node::leaf(key, value, None));
                self.root = Some(id);
                id
            }
            Some(parent) => self.add_child(parent, key, value),
        }
    }

    /// Allocates a leaf under `parent` on the side its key falls on and
    /// retraces from it. Returns the new node's id.
    fn add_child(&mut self, parent: NodeId, key: K, value: V) -> NodeId {
        let goes_left = key < self.nodes[parent].key;
        let child = self.nodes.allocate(Node::leaf(key, value, Some(parent)));
        if goes_left {
            self.nodes[parent].left = Some(child);
        } else {
            self.nodes[parent].right = Some(child);
        }
        self.retrace(Some(child));
        child
    }

    /// Returns a mutable reference to the value of `key`, inserting
    /// `V::default()` first if the key is absent.
    ///
    /// # Complexity
    ///
    /// O(log N) under [`Balancing::Avl`]
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let mut counts: AvlMap<&str, u32> = AvlMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.get_or_insert_default(word) += 1;
    /// }
    /// assert_eq!(counts.get("a"), Some(&2));
    /// assert_eq!(counts.get("b"), Some(&1));
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Returns a mutable reference to the value of `key`, inserting the value
    /// returned by `make_value` first if the key is absent. `make_value` is
    /// not called when the key is present.
    pub fn get_or_insert_with<F>(&mut self, key: K, make_value: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let id = match self.placement(&key) {
            Placement::Found(id) => id,
            Placement::Vacant(parent) => self.attach(parent, key, make_value()),
        };
        &mut self.nodes[id].value
    }

    /// Inserts a key-value pair, returning the previous value of the key.
    ///
    /// The stored key is not replaced when the key is already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// assert_eq!(map.insert(1, "one"), None);
    /// assert_eq!(map.insert(1, "ONE"), Some("one"));
    /// assert_eq!(map.get(&1), Some(&"ONE"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.placement(&key) {
            Placement::Found(id) => Some(std::mem::replace(&mut self.nodes[id].value, value)),
            Placement::Vacant(parent) => {
                self.attach(parent, key, value);
                None
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the
    /// ordering on the borrowed form must match the ordering on the key type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert("hello".to_string(), 42);
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).map(|id| &self.nodes[id].value)
    }

    /// Returns the stored key and its value.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).map(|id| {
            let node = &self.nodes[id];
            (&node.key, &node.value)
        })
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).map(|id| &mut self.nodes[id].value)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).is_some()
    }

    /// Removes a key, returning its value if it was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let mut map: AvlMap<i32, &str> = [(1, "one"), (2, "two")].into_iter().collect();
    /// assert_eq!(map.remove(&1), Some("one"));
    /// assert_eq!(map.remove(&1), None);
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key, returning the stored key and its value if it was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).map(|id| self.remove_node(id))
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for AvlMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for AvlMap<K, V> {
    fn clone(&self) -> Self {
        debug!(entries = self.length, "cloning map");
        Self {
            nodes: self.nodes.clone(),
            root: self.root,
            length: self.length,
            balancing: self.balancing,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        debug!(entries = source.length, "cloning map into existing storage");
        self.nodes.clone_from(&source.nodes);
        self.root = source.root;
        self.length = source.length;
        self.balancing = source.balancing;
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, Q, V> Index<&Q> for AvlMap<K, V>
where
    K: Ord + Borrow<Q>,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Returns a reference to the value of `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

/// Two maps are equal when they hold the same entries, regardless of their
/// shape or balancing policy.
impl<K: PartialEq, V: PartialEq> PartialEq for AvlMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for AvlMap<K, V> {}

impl<K: Hash, V: Hash> Hash for AvlMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for AvlMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Tests
// =============================================================================
