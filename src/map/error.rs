//! Error types reported by [`AvlMap::validate`](super::AvlMap::validate).

use super::cursor::Position;

/// A broken structural invariant found by
/// [`AvlMap::validate`](super::AvlMap::validate).
///
/// Variants that concern a single node carry its [`Position`], which can be
/// passed to [`AvlMap::entry_at`](super::AvlMap::entry_at) to inspect it.
///
/// # Examples
///
/// ```rust
/// use avlmap::InvariantViolation;
///
/// let error = InvariantViolation::CountMismatch { recorded: 3, reachable: 2 };
/// assert_eq!(
///     format!("{error}"),
///     "map records 3 entries but 2 nodes are reachable from the root"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The root node has a parent link.
    RootHasParent {
        /// The root node.
        position: Position,
    },
    /// A child's parent link does not name the node that links to it.
    ParentMismatch {
        /// The child with the wrong parent link.
        position: Position,
    },
    /// A key lies outside the range allowed by its ancestors.
    OrderViolation {
        /// The misplaced node.
        position: Position,
    },
    /// A cached height does not match the node's children.
    StaleHeight {
        /// The node with the stale height.
        position: Position,
        /// Height stored in the node.
        cached: u32,
        /// Height computed from the children.
        expected: u32,
    },
    /// A cached balance factor does not match the node's children.
    StaleBalance {
        /// The node with the stale balance.
        position: Position,
        /// Balance stored in the node.
        cached: i64,
        /// Balance computed from the children.
        expected: i64,
    },
    /// A node of an AVL-balanced map has subtrees whose heights differ by
    /// more than one.
    Unbalanced {
        /// The unbalanced node.
        position: Position,
        /// Its balance factor.
        balance: i64,
    },
    /// The recorded length differs from the number of reachable nodes or the
    /// number of stored nodes.
    CountMismatch {
        /// Length recorded by the map.
        recorded: usize,
        /// Nodes found by walking the tree.
        reachable: usize,
    },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootHasParent { position } => {
                write!(formatter, "root {position:?} has a parent link")
            }
            Self::ParentMismatch { position } => {
                write!(formatter, "{position:?} does not link back to its parent")
            }
            Self::OrderViolation { position } => {
                write!(formatter, "{position:?} breaks the search tree ordering")
            }
            Self::StaleHeight {
                position,
                cached,
                expected,
            } => write!(
                formatter,
                "{position:?} caches height {cached} but its children give {expected}"
            ),
            Self::StaleBalance {
                position,
                cached,
                expected,
            } => write!(
                formatter,
                "{position:?} caches balance {cached} but its children give {expected}"
            ),
            Self::Unbalanced { position, balance } => {
                write!(formatter, "{position:?} is out of balance ({balance})")
            }
            Self::CountMismatch {
                recorded,
                reachable,
            } => write!(
                formatter,
                "map records {recorded} entries but {reachable} nodes are reachable from the root"
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_display_unbalanced() {
        let error = InvariantViolation::Unbalanced {
            position: Position::end(),
            balance: -2,
        };
        assert_eq!(format!("{error}"), "Position(end) is out of balance (-2)");
    }

    #[rstest]
    fn test_is_std_error() {
        let error: Box<dyn std::error::Error> = Box::new(InvariantViolation::CountMismatch {
            recorded: 1,
            reachable: 0,
        });
        assert!(error.to_string().contains("records 1 entries"));
    }
}
