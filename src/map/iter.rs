//! Iterators over the entries of an [`AvlMap`] in ascending key order.

use std::iter::FusedIterator;

use super::node::{NodeArena, NodeId};
use super::tree::AvlMap;

// =============================================================================
// Iter
// =============================================================================

/// An iterator over the entries of an [`AvlMap`], in key order.
///
/// Walks the tree through parent links, so it needs no auxiliary stack.
pub struct Iter<'a, K, V> {
    nodes: &'a NodeArena<K, V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.remaining -= 1;
        self.front = self.nodes.successor(id);
        let node = &self.nodes[id];
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Ord, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.remaining -= 1;
        self.back = self.nodes.predecessor(id);
        let node = &self.nodes[id];
        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

// =============================================================================
// IterMut
// =============================================================================

/// An iterator over the entries of an [`AvlMap`] with mutable values, in key
/// order.
pub struct IterMut<'a, K, V> {
    entries: std::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

// =============================================================================
// IntoIter
// =============================================================================

/// An owning iterator over the entries of an [`AvlMap`], in key order.
pub struct IntoIter<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K, V> FusedIterator for IntoIter<K, V> {}

// =============================================================================
// Keys / Values / ValuesMut
// =============================================================================

/// An iterator over the keys of an [`AvlMap`], in key order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Ord, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of an [`AvlMap`], in key order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Ord, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// An iterator over mutable references to the values of an [`AvlMap`], in
/// key order.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

// =============================================================================
// AvlMap Iteration Methods
// =============================================================================

impl<K, V> AvlMap<K, V> {
    /// Slot indices of the live nodes in key order.
    fn in_order_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.length);
        let mut current = self.root.map(|root| self.nodes.first(root));
        while let Some(id) = current {
            ids.push(id);
            current = self.nodes.successor(id);
        }
        ids
    }

    /// Returns an iterator over the entries in key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let map: AvlMap<i32, &str> = [(2, "two"), (1, "one")].into_iter().collect();
    /// let entries: Vec<(&i32, &&str)> = map.iter().collect();
    /// assert_eq!(entries, vec![(&1, &"one"), (&2, &"two")]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            front: self.root.map(|root| self.nodes.first(root)),
            back: self.root.map(|root| self.nodes.last(root)),
            remaining: self.length,
        }
    }

    /// Returns an iterator over the entries in key order, with mutable
    /// references to the values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let mut map: AvlMap<i32, i32> = [(1, 10), (2, 20)].into_iter().collect();
    /// for (_, value) in map.iter_mut() {
    ///     *value += 1;
    /// }
    /// assert_eq!(map.get(&2), Some(&21));
    /// ```
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let order = self.in_order_ids();
        let mut rank = vec![usize::MAX; self.nodes.capacity()];
        for (position, id) in order.iter().enumerate() {
            rank[id.slot()] = position;
        }

        let mut ordered: Vec<Option<(&K, &mut V)>> = (0..order.len()).map(|_| None).collect();
        for (id, node) in self.nodes.iter_mut() {
            ordered[rank[id.slot()]] = Some((&node.key, &mut node.value));
        }

        IterMut {
            entries: ordered.into_iter().flatten().collect::<Vec<_>>().into_iter(),
        }
    }

    /// Returns an iterator over the keys in ascending order.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values in key order.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values in key order.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

// =============================================================================
// IntoIterator Implementations
// =============================================================================

impl<K, V> IntoIterator for AvlMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let order = self.in_order_ids();
        let mut slots = self.nodes.into_slots();
        let entries: Vec<(K, V)> = order
            .into_iter()
            .filter_map(|id| slots[id.slot()].take())
            .map(|node| (node.key, node.value))
            .collect();
        IntoIter {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a AvlMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut AvlMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Balancing;
    use rstest::rstest;

    fn sample(balancing: Balancing) -> AvlMap<i32, String> {
        let mut map = AvlMap::with_balancing(balancing);
        for key in [50, 20, 80, 10, 30, 70, 90, 25] {
            map.insert(key, format!("v{key}"));
        }
        map.remove(&20);
        map.remove(&90);
        map
    }

    #[rstest]
    #[case(Balancing::Avl)]
    #[case(Balancing::Unbalanced)]
    fn test_iter_forward_and_backward(#[case] balancing: Balancing) {
        let map = sample(balancing);
        let forward: Vec<i32> = map.keys().copied().collect();
        let backward: Vec<i32> = map.keys().rev().copied().collect();
        assert_eq!(forward, vec![10, 25, 30, 50, 70, 80]);
        assert_eq!(backward, vec![80, 70, 50, 30, 25, 10]);
    }

    #[rstest]
    fn test_iter_meets_in_the_middle() {
        let map = sample(Balancing::Avl);
        let mut iter = map.iter();
        assert_eq!(iter.next().map(|(key, _)| *key), Some(10));
        assert_eq!(iter.next_back().map(|(key, _)| *key), Some(80));
        assert_eq!(iter.len(), 4);
        let rest: Vec<i32> = iter.map(|(key, _)| *key).collect();
        assert_eq!(rest, vec![25, 30, 50, 70]);
    }

    #[rstest]
    fn test_iter_on_empty_map() {
        let map: AvlMap<i32, i32> = AvlMap::new();
        assert_eq!(map.iter().next(), None);
        assert_eq!(map.iter().len(), 0);
    }

    #[rstest]
    fn test_iter_mut_visits_in_key_order_after_slot_reuse() {
        let mut map = sample(Balancing::Avl);
        // reuses the slots released by the removals in `sample`
        map.insert(5, "v5".to_string());
        map.insert(95, "v95".to_string());

        let mut seen = Vec::new();
        for (key, value) in &mut map {
            seen.push(*key);
            value.push('!');
        }
        assert_eq!(seen, vec![5, 10, 25, 30, 50, 70, 80, 95]);
        assert_eq!(map.get(&95).map(String::as_str), Some("v95!"));
    }

    #[rstest]
    fn test_values_mut() {
        let mut map: AvlMap<i32, i32> = (1..=4).map(|key| (key, key)).collect();
        for value in map.values_mut() {
            *value *= 100;
        }
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![100, 200, 300, 400]);
    }

    #[rstest]
    #[case(Balancing::Avl)]
    #[case(Balancing::Unbalanced)]
    fn test_into_iter_is_sorted(#[case] balancing: Balancing) {
        let map = sample(balancing);
        let entries: Vec<(i32, String)> = map.into_iter().collect();
        let keys: Vec<i32> = entries.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, vec![10, 25, 30, 50, 70, 80]);
        assert_eq!(entries[0].1, "v10");
    }
}
