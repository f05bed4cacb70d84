//! Structural self-check for [`AvlMap`].

use smallvec::SmallVec;

use super::cursor::Position;
use super::error::InvariantViolation;
use super::node::NodeId;
use super::tree::{AvlMap, Balancing};

/// A node still to be checked, with the ids of the nodes whose keys bound its
/// subtree from below and above.
#[derive(Clone, Copy)]
struct Pending {
    id: NodeId,
    lower: Option<NodeId>,
    upper: Option<NodeId>,
}

impl<K: Ord, V> AvlMap<K, V> {
    /// Checks every structural invariant of the tree.
    ///
    /// - the root has no parent, and every child links back to its parent
    /// - keys are in search tree order
    /// - cached heights and balance factors match the children
    /// - under [`Balancing::Avl`], every balance factor is within `-1..=1`
    /// - the recorded length matches the reachable and stored node counts
    ///
    /// The walk uses an explicit stack, so it is safe on degenerate trees.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let mut map: AvlMap<i32, ()> = (0..100).map(|key| (key, ())).collect();
    /// map.remove(&50);
    /// assert_eq!(map.validate(), Ok(()));
    /// ```
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let mut reachable = 0;

        if let Some(root) = self.root {
            if self.nodes[root].parent.is_some() {
                return Err(InvariantViolation::RootHasParent {
                    position: Position::at(Some(root)),
                });
            }

            let mut stack: SmallVec<[Pending; 32]> = SmallVec::new();
            stack.push(Pending {
                id: root,
                lower: None,
                upper: None,
            });

            while let Some(Pending { id, lower, upper }) = stack.pop() {
                reachable += 1;
                self.check_node(id, lower, upper)?;

                let node = &self.nodes[id];
                if let Some(left) = node.left {
                    stack.push(Pending {
                        id: left,
                        lower,
                        upper: Some(id),
                    });
                }
                if let Some(right) = node.right {
                    stack.push(Pending {
                        id: right,
                        lower: Some(id),
                        upper,
                    });
                }
            }
        }

        if reachable != self.length || self.nodes.len() != self.length {
            return Err(InvariantViolation::CountMismatch {
                recorded: self.length,
                reachable,
            });
        }
        Ok(())
    }

    fn check_node(
        &self,
        id: NodeId,
        lower: Option<NodeId>,
        upper: Option<NodeId>,
    ) -> Result<(), InvariantViolation> {
        let position = Position::at(Some(id));
        let node = &self.nodes[id];

        let above_lower = lower.is_none_or(|bound| self.nodes[bound].key < node.key);
        let below_upper = upper.is_none_or(|bound| node.key < self.nodes[bound].key);
        if !above_lower || !below_upper {
            return Err(InvariantViolation::OrderViolation { position });
        }

        for child in [node.left, node.right].into_iter().flatten() {
            if self.nodes[child].parent != Some(id) {
                return Err(InvariantViolation::ParentMismatch {
                    position: Position::at(Some(child)),
                });
            }
        }

        let left_height = self.nodes.height_of(node.left);
        let right_height = self.nodes.height_of(node.right);
        let expected_height = 1 + left_height.max(right_height);
        if node.height != expected_height {
            return Err(InvariantViolation::StaleHeight {
                position,
                cached: node.height,
                expected: expected_height,
            });
        }

        let expected_balance = i64::from(left_height) - i64::from(right_height);
        if node.balance != expected_balance {
            return Err(InvariantViolation::StaleBalance {
                position,
                cached: node.balance,
                expected: expected_balance,
            });
        }

        if self.balancing == Balancing::Avl && node.balance.abs() > 1 {
            return Err(InvariantViolation::Unbalanced {
                position,
                balance: node.balance,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn map() -> AvlMap<i32, ()> {
        [5, 3, 8, 1, 4].into_iter().map(|key| (key, ())).collect()
    }

    fn id_of(map: &AvlMap<i32, ()>, key: i32) -> NodeId {
        map.locate(&key).unwrap()
    }

    #[rstest]
    fn test_valid_tree(map: AvlMap<i32, ()>) {
        assert_eq!(map.validate(), Ok(()));
        assert_eq!(AvlMap::<i32, ()>::new().validate(), Ok(()));
    }

    #[rstest]
    fn test_detects_order_violation(mut map: AvlMap<i32, ()>) {
        let four = id_of(&map, 4);
        map.nodes[four].key = 6;
        assert_eq!(
            map.validate(),
            Err(InvariantViolation::OrderViolation {
                position: Position::at(Some(four))
            })
        );
    }

    #[rstest]
    fn test_detects_parent_mismatch(mut map: AvlMap<i32, ()>) {
        let one = id_of(&map, 1);
        let eight = id_of(&map, 8);
        map.nodes[one].parent = Some(eight);
        assert_eq!(
            map.validate(),
            Err(InvariantViolation::ParentMismatch {
                position: Position::at(Some(one))
            })
        );
    }

    #[rstest]
    fn test_detects_root_with_parent(mut map: AvlMap<i32, ()>) {
        let root = map.root.unwrap();
        let one = id_of(&map, 1);
        map.nodes[root].parent = Some(one);
        assert!(matches!(
            map.validate(),
            Err(InvariantViolation::RootHasParent { .. })
        ));
    }

    #[rstest]
    fn test_detects_stale_height(mut map: AvlMap<i32, ()>) {
        let root = map.root.unwrap();
        map.nodes[root].height = 4;
        assert_eq!(
            map.validate(),
            Err(InvariantViolation::StaleHeight {
                position: Position::at(Some(root)),
                cached: 4,
                expected: 3,
            })
        );
    }

    #[rstest]
    fn test_detects_stale_balance(mut map: AvlMap<i32, ()>) {
        let three = id_of(&map, 3);
        map.nodes[three].balance = 1;
        assert!(matches!(
            map.validate(),
            Err(InvariantViolation::StaleBalance {
                cached: 1,
                expected: 0,
                ..
            })
        ));
    }

    #[rstest]
    fn test_unbalanced_policy_allows_skew() {
        let mut map = AvlMap::with_balancing(Balancing::Unbalanced);
        map.extend((0..10).map(|key| (key, ())));
        assert_eq!(map.validate(), Ok(()));

        map.balancing = Balancing::Avl;
        assert!(matches!(
            map.validate(),
            Err(InvariantViolation::Unbalanced { .. })
        ));
    }

    #[rstest]
    fn test_detects_count_mismatch(mut map: AvlMap<i32, ()>) {
        map.length = 4;
        assert_eq!(
            map.validate(),
            Err(InvariantViolation::CountMismatch {
                recorded: 4,
                reachable: 5,
            })
        );
    }
}
