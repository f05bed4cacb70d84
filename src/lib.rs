//! # avlmap
//!
//! An ordered key-value map built on a binary search tree with parent links,
//! cached subtree heights and balance factors.
//!
//! ## Overview
//!
//! - **Lookup and insertion**: `get`, `find`, `insert` and the
//!   default-constructing `get_or_insert_default`
//! - **Deletion**: `erase` by position or `remove` by key
//! - **Traversal**: in-order iterators and cursors that step through
//!   successors using parent links instead of a stack
//! - **Balancing**: AVL rotations by default, or a never-rotating tree that
//!   re-attaches orphaned subtrees on deletion
//! - **Diagnostics**: `validate` checks every structural invariant and
//!   `diagram` draws the tree shape
//!
//! ## Example
//!
//! ```rust
//! use avlmap::prelude::*;
//!
//! let mut map: AvlMap<&str, u32> = AvlMap::new();
//! for word in ["pear", "apple", "fig", "apple"] {
//!     *map.get_or_insert_default(word) += 1;
//! }
//!
//! assert_eq!(map.get("apple"), Some(&2));
//! assert_eq!(map.to_string(), "{apple: 2, fig: 1, pear: 1}");
//!
//! let position = map.find("fig");
//! assert_eq!(map.erase(position), Some(("fig", 1)));
//! assert_eq!(map.find("fig"), map.end());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use avlmap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::map::*;
}

pub mod map;

pub use map::{AvlMap, Balancing, InvariantViolation, Position};
