//! Positions and cursors: handles to individual entries of an [`AvlMap`].
//!
//! A [`Position`] names one node of a map, or the end of the sequence. It is
//! a plain `Copy` value that does not borrow the map, so it can be obtained
//! with [`AvlMap::find`] and later passed to [`AvlMap::erase`].
//!
//! [`Cursor`] and [`CursorMut`] borrow the map and walk it forward from a
//! position, one successor at a time.
//!
//! # Examples
//!
//! ```rust
//! use avlmap::AvlMap;
//!
//! let mut map: AvlMap<i32, &str> = [(1, "one"), (2, "two"), (3, "three")]
//!     .into_iter()
//!     .collect();
//!
//! let position = map.find(&2);
//! assert_eq!(map.entry_at(position), Some((&2, &"two")));
//!
//! let next = map.next_position(position);
//! assert_eq!(map.entry_at(next), Some((&3, &"three")));
//! assert_eq!(map.next_position(next), map.end());
//!
//! map.erase(position);
//! assert_eq!(map.find(&2), map.end());
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::ptr;

use super::node::NodeId;
use super::tree::AvlMap;

// =============================================================================
// Position
// =============================================================================

/// A handle to one entry of an [`AvlMap`], or to the end of its sequence.
///
/// Positions compare by node identity. A position stays valid until the
/// entry it names is erased; positions naming other entries are unaffected by
/// insertions and erasures. After its entry is erased a position reads as
/// the absence of an entry: lookups through it return `None` and erasing it
/// does nothing, even once a later insertion has reused the node's storage.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position(Option<NodeId>);

impl Position {
    /// Returns the end position, which names no entry.
    #[inline]
    #[must_use]
    pub const fn end() -> Self {
        Self(None)
    }

    /// Returns `true` if this is the end position.
    #[inline]
    #[must_use]
    pub const fn is_end(self) -> bool {
        self.0.is_none()
    }

    #[inline]
    pub(crate) const fn at(id: Option<NodeId>) -> Self {
        Self(id)
    }

    #[inline]
    pub(crate) const fn node(self) -> Option<NodeId> {
        self.0
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::end()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(formatter, "Position({id:?})"),
            None => write!(formatter, "Position(end)"),
        }
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// A read-only cursor over an [`AvlMap`] that moves forward in key order.
///
/// Two cursors are equal when they belong to the same map and point at the
/// same entry.
pub struct Cursor<'a, K, V> {
    map: &'a AvlMap<K, V>,
    current: Option<NodeId>,
}

impl<'a, K, V> Cursor<'a, K, V> {
    /// Returns the key at the cursor, or `None` at the end.
    #[must_use]
    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(key, _)| key)
    }

    /// Returns the value at the cursor, or `None` at the end.
    #[must_use]
    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, value)| value)
    }

    /// Returns the entry at the cursor, or `None` at the end.
    #[must_use]
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        self.map.entry_at(self.position())
    }

    /// Advances to the next entry in key order. Does nothing at the end.
    pub fn move_next(&mut self) {
        self.current = self.current.and_then(|id| self.map.nodes.successor(id));
    }

    /// Returns the position the cursor points at.
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::at(self.current)
    }

    /// Returns `true` if the cursor is past the last entry.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.current.is_none()
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.map, other.map) && self.current == other.current
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("Cursor")
            .field(&self.key_value())
            .finish()
    }
}

// =============================================================================
// CursorMut
// =============================================================================

/// A cursor over an [`AvlMap`] that moves forward in key order and can modify
/// values or remove the entry it points at.
pub struct CursorMut<'a, K, V> {
    map: &'a mut AvlMap<K, V>,
    current: Option<NodeId>,
}

impl<K, V> CursorMut<'_, K, V> {
    /// Returns the key at the cursor, or `None` at the end.
    #[must_use]
    pub fn key(&self) -> Option<&K> {
        self.map.entry_at(self.position()).map(|(key, _)| key)
    }

    /// Returns the value at the cursor, or `None` at the end.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.map.entry_at(self.position()).map(|(_, value)| value)
    }

    /// Returns a mutable reference to the value at the cursor, or `None` at
    /// the end.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.map.value_at_mut(Position::at(self.current))
    }

    /// Advances to the next entry in key order. Does nothing at the end.
    pub fn move_next(&mut self) {
        self.current = self.current.and_then(|id| self.map.nodes.successor(id));
    }

    /// Returns the position the cursor points at.
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::at(self.current)
    }

    /// Returns `true` if the cursor is past the last entry.
    #[must_use]
    pub const fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns a read-only cursor at the same entry.
    #[must_use]
    pub fn as_cursor(&self) -> Cursor<'_, K, V> {
        Cursor {
            map: &*self.map,
            current: self.current,
        }
    }
}

impl<K: Ord, V> CursorMut<'_, K, V> {
    /// Removes the entry at the cursor and moves to the following entry.
    /// Returns `None` and does nothing at the end.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let mut map: AvlMap<i32, i32> = (1..=6).map(|key| (key, key)).collect();
    /// let mut cursor = map.cursor_front_mut();
    /// while !cursor.is_end() {
    ///     if cursor.key().is_some_and(|key| key % 2 == 0) {
    ///         cursor.remove_current();
    ///     } else {
    ///         cursor.move_next();
    ///     }
    /// }
    /// assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
    /// ```
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let id = self.current?;
        self.current = self.map.nodes.successor(id);
        Some(self.map.remove_node(id))
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CursorMut<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("CursorMut")
            .field(&self.map.entry_at(self.position()))
            .finish()
    }
}

// =============================================================================
// AvlMap Position Methods
// =============================================================================

impl<K, V> AvlMap<K, V> {
    /// Returns the position of the smallest entry, or the end position if the
    /// map is empty.
    #[must_use]
    pub fn begin(&self) -> Position {
        Position::at(self.root.map(|root| self.nodes.first(root)))
    }

    /// Returns the end position.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> Position {
        Position::end()
    }

    /// Returns the position following `position` in key order. The end
    /// position maps to itself.
    #[must_use]
    pub fn next_position(&self, position: Position) -> Position {
        let next = position
            .node()
            .filter(|&id| self.nodes.get(id).is_some())
            .and_then(|id| self.nodes.successor(id));
        Position::at(next)
    }

    /// Returns the entry at `position`, or `None` for the end position.
    #[must_use]
    pub fn entry_at(&self, position: Position) -> Option<(&K, &V)> {
        let node = self.nodes.get(position.node()?)?;
        Some((&node.key, &node.value))
    }

    /// Returns a mutable reference to the value at `position`, or `None` for
    /// the end position.
    pub fn value_at_mut(&mut self, position: Position) -> Option<&mut V> {
        let node = self.nodes.get_mut(position.node()?)?;
        Some(&mut node.value)
    }

    /// Returns a read-only cursor at `position`.
    #[must_use]
    pub fn cursor(&self, position: Position) -> Cursor<'_, K, V> {
        Cursor {
            map: self,
            current: position.node().filter(|&id| self.nodes.get(id).is_some()),
        }
    }

    /// Returns a read-only cursor at the smallest entry.
    #[must_use]
    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        self.cursor(self.begin())
    }

    /// Returns a mutable cursor at `position`.
    pub fn cursor_mut(&mut self, position: Position) -> CursorMut<'_, K, V> {
        let current = position.node().filter(|&id| self.nodes.get(id).is_some());
        CursorMut { map: self, current }
    }

    /// Returns a mutable cursor at the smallest entry.
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, K, V> {
        let begin = self.begin();
        self.cursor_mut(begin)
    }
}

impl<K: Ord, V> AvlMap<K, V> {
    /// Returns the position of `key`, or the end position if it is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let mut map: AvlMap<i32, u32> = AvlMap::new();
    /// *map.get_or_insert_default(7) += 1;
    ///
    /// let position = map.find(&7);
    /// assert_eq!(map.entry_at(position), Some((&7, &1)));
    /// assert!(map.find(&8).is_end());
    /// ```
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Position::at(self.locate(key))
    }

    /// Removes the entry at `position` and returns it.
    ///
    /// Erasing the end position (or a position whose entry was already
    /// erased) does nothing and returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let mut map: AvlMap<i32, i32> = [(1, 10), (2, 20)].into_iter().collect();
    /// assert_eq!(map.erase(map.end()), None);
    /// assert_eq!(map.len(), 2);
    ///
    /// assert_eq!(map.erase(map.find(&1)), Some((1, 10)));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn erase(&mut self, position: Position) -> Option<(K, V)> {
        let id = position.node()?;
        self.nodes.get(id)?;
        Some(self.remove_node(id))
    }
}

// =============================================================================
// Tests
// =============================================================================
