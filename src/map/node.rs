//! Node storage and node-level tree mechanics.
//!
//! Every node of an [`AvlMap`](super::AvlMap) lives in a [`NodeArena`]: a
//! contiguous vector of slots with an intrusive free list. Links between nodes
//! are [`NodeId`] indices into that vector. A parent owns its children through
//! its `left`/`right` ids, while the `parent` id is a plain back-reference used
//! only for upward traversal.
//!
//! Because the arena is the single owner of the memory, dropping or cloning a
//! map is one linear pass over the slot vector, independent of tree shape.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Index, IndexMut};

// =============================================================================
// NodeId Definition
// =============================================================================

/// Index of a node inside the arena of one map, tagged with the generation
/// of its slot.
///
/// A slot's generation is bumped every time it is released, so an id kept
/// across the erasure of its node never matches the node that later reuses
/// the slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId {
    slot: usize,
    generation: u32,
}

impl NodeId {
    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.slot
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(formatter, "#{}", self.slot)
        } else {
            write!(formatter, "#{}v{}", self.slot, self.generation)
        }
    }
}

// =============================================================================
// Node Definition
// =============================================================================

/// A single tree node.
///
/// `height` counts the nodes on the longest downward path, so a leaf has
/// height 1 and an absent child counts as 0. `balance` is
/// `height(left) - height(right)`.
#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) parent: Option<NodeId>,
    pub(crate) height: u32,
    pub(crate) balance: i64,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl<K, V> Node<K, V> {
    /// Creates a node from its raw parts. No ordering check is performed;
    /// the caller guarantees the placement.
    pub(crate) const fn new(
        key: K,
        value: V,
        parent: Option<NodeId>,
        height: u32,
        balance: i64,
        left: Option<NodeId>,
        right: Option<NodeId>,
    ) -> Self {
        Self {
            key,
            value,
            parent,
            height,
            balance,
            left,
            right,
        }
    }

    /// Creates a detached leaf.
    pub(crate) const fn leaf(key: K, value: V, parent: Option<NodeId>) -> Self {
        Self::new(key, value, parent, 1, 0, None, None)
    }

    /// Returns `true` if `child` is the left child of this node.
    #[inline]
    pub(crate) fn is_left_child(&self, child: NodeId) -> bool {
        self.left == Some(child)
    }
}

// =============================================================================
// Slot Definition
// =============================================================================

#[derive(Clone)]
enum Slot<K, V> {
    Occupied {
        generation: u32,
        node: Node<K, V>,
    },
    Vacant {
        generation: u32,
        next_free: Option<usize>,
    },
}

// =============================================================================
// NodeArena Definition
// =============================================================================

/// Slot storage for the nodes of one map.
///
/// Released slots are chained into a free list through the `next_free` field
/// of vacant slots and reused by later allocations. The ids of live nodes
/// never change while they are in the tree.
pub(crate) struct NodeArena<K, V> {
    slots: Vec<Slot<K, V>>,
    free_head: Option<usize>,
    live: usize,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            live: 0,
        }
    }

    /// Number of occupied slots.
    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.live
    }

    /// Total number of slots, occupied or vacant.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Stores `node` and returns its id, reusing a released slot if one exists.
    pub(crate) fn allocate(&mut self, node: Node<K, V>) -> NodeId {
        self.live += 1;
        match self.free_head {
            Some(index) => {
                let slot = &mut self.slots[index];
                let Slot::Vacant {
                    generation,
                    next_free,
                } = *slot
                else {
                    unreachable!("free list points at an occupied slot");
                };
                self.free_head = next_free;
                *slot = Slot::Occupied { generation, node };
                NodeId {
                    slot: index,
                    generation,
                }
            }
            None => {
                self.slots.push(Slot::Occupied {
                    generation: 0,
                    node,
                });
                NodeId {
                    slot: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    /// Removes the node with the given id and returns it. Its slot goes onto
    /// the free list.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not name a live node.
    pub(crate) fn release(&mut self, id: NodeId) -> Node<K, V> {
        let slot = &mut self.slots[id.slot];
        match slot {
            Slot::Occupied { generation, .. } if *generation == id.generation => {}
            _ => panic!("released vacant node slot {id:?}"),
        }
        let vacant = Slot::Vacant {
            generation: id.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        let Slot::Occupied { node, .. } = std::mem::replace(slot, vacant) else {
            unreachable!("slot checked as occupied");
        };
        self.free_head = Some(id.slot);
        self.live -= 1;
        node
    }

    /// Drops every node.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.live = 0;
    }

    /// Returns the node with the given id, or `None` if the slot is vacant,
    /// unknown or was reused after the node was released.
    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        match self.slots.get(id.slot) {
            Some(Slot::Occupied { generation, node }) if *generation == id.generation => {
                Some(node)
            }
            _ => None,
        }
    }

    /// Mutable counterpart of [`get`](Self::get).
    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, V>> {
        match self.slots.get_mut(id.slot) {
            Some(Slot::Occupied { generation, node }) if *generation == id.generation => {
                Some(node)
            }
            _ => None,
        }
    }

    /// Iterates over the occupied slots in storage order, yielding each
    /// node's id and mutable access to it.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Node<K, V>)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, node } => Some((
                    NodeId {
                        slot: index,
                        generation: *generation,
                    },
                    node,
                )),
                Slot::Vacant { .. } => None,
            })
    }

    /// Consumes the arena, returning the nodes indexed by slot.
    pub(crate) fn into_slots(self) -> Vec<Option<Node<K, V>>> {
        self.slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Occupied { node, .. } => Some(node),
                Slot::Vacant { .. } => None,
            })
            .collect()
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Leftmost node of the subtree rooted at `id`.
    pub(crate) fn first(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(left) = self[current].left {
            current = left;
        }
        current
    }

    /// Rightmost node of the subtree rooted at `id`.
    pub(crate) fn last(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(right) = self[current].right {
            current = right;
        }
        current
    }

    /// In-order successor of `id`, or `None` if `id` holds the greatest key.
    pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self[id].right {
            return Some(self.first(right));
        }

        let mut current = id;
        let mut parent = self[current].parent;
        while let Some(ancestor) = parent {
            if self[ancestor].right != Some(current) {
                break;
            }
            current = ancestor;
            parent = self[ancestor].parent;
        }
        parent
    }

    /// In-order predecessor of `id`, or `None` if `id` holds the smallest key.
    pub(crate) fn predecessor(&self, id: NodeId) -> Option<NodeId>
    where
        K: Ord,
    {
        if let Some(left) = self[id].left {
            return Some(self.last(left));
        }

        let mut current = id;
        while let Some(ancestor) = self[current].parent {
            if !self[ancestor].is_left_child(current) {
                break;
            }
            current = ancestor;
        }

        self[current]
            .parent
            .filter(|&ancestor| self[ancestor].key != self[id].key)
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Placement search starting at `start`.
    ///
    /// Returns the node holding `key` if the subtree contains it; otherwise
    /// returns the node under which `key` would be attached (its missing child
    /// on the side `key` falls on is where the new node goes).
    pub(crate) fn index<Q>(&self, start: NodeId, key: &Q) -> NodeId
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = start;
        loop {
            let node = &self[current];
            let next = match key.cmp(node.key.borrow()) {
                Ordering::Equal => return current,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    // =========================================================================
    // Height and Balance
    // =========================================================================

    /// Cached height of an optional subtree.
    #[inline]
    pub(crate) fn height_of(&self, id: Option<NodeId>) -> u32 {
        id.map_or(0, |id| self[id].height)
    }

    /// Recomputes the height and balance of `id` from its children's cached
    /// heights. Returns `true` if either value changed.
    pub(crate) fn refresh(&mut self, id: NodeId) -> bool {
        let left_height = self.height_of(self[id].left);
        let right_height = self.height_of(self[id].right);
        let height = 1 + left_height.max(right_height);
        let balance = i64::from(left_height) - i64::from(right_height);

        let node = &mut self[id];
        let changed = node.height != height || node.balance != balance;
        node.height = height;
        node.balance = balance;
        changed
    }

    /// Refreshes `id` and then every ancestor up to the root.
    pub(crate) fn refresh_balance_and_height(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            self.refresh(node);
            current = self[node].parent;
        }
    }
}

impl<K, V> Index<NodeId> for NodeArena<K, V> {
    type Output = Node<K, V>;

    fn index(&self, id: NodeId) -> &Self::Output {
        self.get(id)
            .unwrap_or_else(|| panic!("node id {id:?} refers to a vacant slot"))
    }
}

impl<K, V> IndexMut<NodeId> for NodeArena<K, V> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("node id {id:?} refers to a vacant slot"))
    }
}

impl<K: Clone, V: Clone> Clone for NodeArena<K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            free_head: self.free_head,
            live: self.live,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.slots.clone_from(&source.slots);
        self.free_head = source.free_head;
        self.live = source.live;
    }
}

impl<K, V> Default for NodeArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    /// Builds this tree by hand, with parents and heights filled in:
    ///
    /// ```text
    ///         5
    ///       /   \
    ///      3     8
    ///     / \
    ///    1   4
    /// ```
    #[fixture]
    fn small_tree() -> (NodeArena<i32, &'static str>, NodeId) {
        let mut arena = NodeArena::new();
        let root = arena.allocate(Node::leaf(5, "five", None));
        let three = arena.allocate(Node::leaf(3, "three", Some(root)));
        let eight = arena.allocate(Node::leaf(8, "eight", Some(root)));
        let one = arena.allocate(Node::leaf(1, "one", Some(three)));
        let four = arena.allocate(Node::leaf(4, "four", Some(three)));
        arena[root].left = Some(three);
        arena[root].right = Some(eight);
        arena[three].left = Some(one);
        arena[three].right = Some(four);
        arena.refresh_balance_and_height(one);
        arena.refresh_balance_and_height(four);
        arena.refresh_balance_and_height(eight);
        (arena, root)
    }

    fn keys_forward(arena: &NodeArena<i32, &str>, root: NodeId) -> Vec<i32> {
        let mut keys = Vec::new();
        let mut current = Some(arena.first(root));
        while let Some(id) = current {
            keys.push(arena[id].key);
            current = arena.successor(id);
        }
        keys
    }

    #[rstest]
    fn test_allocate_reuses_released_slots() {
        let mut arena: NodeArena<i32, ()> = NodeArena::new();
        let first = arena.allocate(Node::leaf(1, (), None));
        let second = arena.allocate(Node::leaf(2, (), None));
        assert_eq!(arena.len(), 2);

        let released = arena.release(first);
        assert_eq!(released.key, 1);
        assert_eq!(arena.len(), 1);
        assert!(arena.get(first).is_none());

        let third = arena.allocate(Node::leaf(3, (), None));
        assert_eq!(third.slot(), first.slot());
        assert_ne!(third, first);
        assert_eq!(arena.capacity(), 2);
        assert_eq!(arena[second].key, 2);
        assert_eq!(arena[third].key, 3);
    }

    #[rstest]
    fn test_released_id_does_not_name_reused_slot() {
        let mut arena: NodeArena<i32, ()> = NodeArena::new();
        let stale = arena.allocate(Node::leaf(1, (), None));
        let _ = arena.release(stale);
        let fresh = arena.allocate(Node::leaf(2, (), None));

        assert!(arena.get(stale).is_none());
        assert!(arena.get_mut(stale).is_none());
        assert_eq!(arena.get(fresh).map(|node| node.key), Some(2));
        assert_eq!(format!("{fresh:?}"), "#0v1");
    }

    #[rstest]
    #[should_panic(expected = "vacant")]
    fn test_release_through_stale_id_panics() {
        let mut arena: NodeArena<i32, ()> = NodeArena::new();
        let stale = arena.allocate(Node::leaf(1, (), None));
        let _ = arena.release(stale);
        let _fresh = arena.allocate(Node::leaf(2, (), None));
        let _ = arena.release(stale);
    }

    #[rstest]
    #[should_panic(expected = "vacant")]
    fn test_index_on_vacant_slot_panics() {
        let mut arena: NodeArena<i32, ()> = NodeArena::new();
        let id = arena.allocate(Node::leaf(1, (), None));
        let _ = arena.release(id);
        let _ = &arena[id];
    }

    #[rstest]
    fn test_first_and_last(small_tree: (NodeArena<i32, &'static str>, NodeId)) {
        let (arena, root) = small_tree;
        assert_eq!(arena[arena.first(root)].key, 1);
        assert_eq!(arena[arena.last(root)].key, 8);
    }

    #[rstest]
    fn test_successor_walks_in_order(small_tree: (NodeArena<i32, &'static str>, NodeId)) {
        let (arena, root) = small_tree;
        assert_eq!(keys_forward(&arena, root), vec![1, 3, 4, 5, 8]);
    }

    #[rstest]
    fn test_predecessor_walks_in_reverse(small_tree: (NodeArena<i32, &'static str>, NodeId)) {
        let (arena, root) = small_tree;
        let mut keys = Vec::new();
        let mut current = Some(arena.last(root));
        while let Some(id) = current {
            keys.push(arena[id].key);
            current = arena.predecessor(id);
        }
        assert_eq!(keys, vec![8, 5, 4, 3, 1]);
    }

    #[rstest]
    #[case(5, 5)]
    #[case(4, 4)]
    #[case(2, 1)]
    #[case(7, 8)]
    #[case(9, 8)]
    #[case(0, 1)]
    fn test_index_finds_match_or_parent(
        small_tree: (NodeArena<i32, &'static str>, NodeId),
        #[case] key: i32,
        #[case] expected_key: i32,
    ) {
        let (arena, root) = small_tree;
        assert_eq!(arena[arena.index(root, &key)].key, expected_key);
    }

    #[rstest]
    fn test_heights_and_balances(small_tree: (NodeArena<i32, &'static str>, NodeId)) {
        let (arena, root) = small_tree;
        assert_eq!(arena[root].height, 3);
        assert_eq!(arena[root].balance, 1);
        let three = arena[root].left.unwrap();
        assert_eq!(arena[three].height, 2);
        assert_eq!(arena[three].balance, 0);
        assert_eq!(arena.height_of(None), 0);
    }

    #[rstest]
    fn test_refresh_reports_change(small_tree: (NodeArena<i32, &'static str>, NodeId)) {
        let (mut arena, root) = small_tree;
        assert!(!arena.refresh(root));

        let eight = arena[root].right.unwrap();
        arena[root].right = None;
        let _ = arena.release(eight);
        assert!(arena.refresh(root));
        assert_eq!(arena[root].balance, 2);
    }

    #[rstest]
    fn test_clone_is_independent(small_tree: (NodeArena<i32, &'static str>, NodeId)) {
        let (arena, root) = small_tree;
        let mut copy = arena.clone();
        copy[root].value = "changed";
        assert_eq!(arena[root].value, "five");
        assert_eq!(keys_forward(&copy, root), keys_forward(&arena, root));
    }

    #[rstest]
    fn test_into_slots_keeps_slot_indices() {
        let mut arena: NodeArena<i32, ()> = NodeArena::new();
        let first = arena.allocate(Node::leaf(1, (), None));
        let _second = arena.allocate(Node::leaf(2, (), None));
        let _ = arena.release(first);

        let slots = arena.into_slots();
        assert_eq!(slots.len(), 2);
        assert!(slots[0].is_none());
        assert_eq!(slots[1].as_ref().map(|node| node.key), Some(2));
    }
}
