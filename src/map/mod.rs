//! An ordered map over a height-tracked binary search tree.
//!
//! This module provides:
//!
//! - [`AvlMap`]: the map itself, with `BTreeMap`-style accessors
//! - [`Balancing`]: the rebalancing policy chosen at construction
//! - [`Position`], [`Cursor`] and [`CursorMut`]: handles to single entries
//! - [`Iter`], [`IterMut`], [`IntoIter`], [`Keys`], [`Values`], [`ValuesMut`]:
//!   in-order iterators
//! - [`Diagram`] and [`ValueDiagram`]: sideways ASCII renderings of the tree
//!   shape
//! - [`InvariantViolation`]: the report returned by [`AvlMap::validate`]
//!
//! # Examples
//!
//! ```rust
//! use avlmap::map::AvlMap;
//!
//! let mut map: AvlMap<i32, i32> = AvlMap::new();
//! for key in [5, 3, 8, 1, 4] {
//!     *map.get_or_insert_default(key) += key * 10;
//! }
//!
//! let keys: Vec<i32> = map.keys().copied().collect();
//! assert_eq!(keys, vec![1, 3, 4, 5, 8]);
//!
//! map.erase(map.find(&5));
//! assert_eq!(map.len(), 4);
//! assert!(map.validate().is_ok());
//! ```
//!
//! ## Unbalanced trees
//!
//! ```rust
//! use avlmap::map::{AvlMap, Balancing};
//!
//! let mut map = AvlMap::with_balancing(Balancing::Unbalanced);
//! map.extend((1..=10).map(|key| (key, ())));
//! assert_eq!(map.height(), 10);
//! ```

mod cursor;
mod error;
mod iter;
mod node;
mod print;
mod tree;
mod validate;

pub use cursor::{Cursor, CursorMut, Position};
pub use error::InvariantViolation;
pub use iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use print::{Diagram, ValueDiagram};
pub use tree::{AvlMap, Balancing};

// The arena holds no shared pointers, so the map is as thread-safe as its
// contents.
static_assertions::assert_impl_all!(AvlMap<i32, String>: Send, Sync, Clone, Default);
static_assertions::assert_impl_all!(Position: Copy, Send, Sync, Eq, std::hash::Hash);
static_assertions::assert_impl_all!(InvariantViolation: std::error::Error, Send, Sync);
