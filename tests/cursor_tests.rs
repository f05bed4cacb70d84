//! Integration tests for positions and cursors.

use avlmap::map::{AvlMap, Balancing, Position};
use rstest::{fixture, rstest};

#[fixture]
fn map() -> AvlMap<i32, &'static str> {
    [(5, "five"), (3, "three"), (8, "eight"), (1, "one"), (4, "four")]
        .into_iter()
        .collect()
}

// =============================================================================
// Position Tests
// =============================================================================

#[rstest]
fn test_walk_positions_from_begin_to_end(map: AvlMap<i32, &'static str>) {
    let mut visited = Vec::new();
    let mut position = map.begin();
    while position != map.end() {
        visited.push(*map.entry_at(position).unwrap().0);
        position = map.next_position(position);
    }
    assert_eq!(visited, vec![1, 3, 4, 5, 8]);
}

#[rstest]
fn test_end_position_is_absorbing(map: AvlMap<i32, &'static str>) {
    assert_eq!(map.next_position(map.end()), map.end());
    assert_eq!(map.entry_at(map.end()), None);
    assert_eq!(Position::end(), Position::default());
    assert!(Position::end().is_end());
}

#[rstest]
fn test_positions_are_shared_between_lookups(map: AvlMap<i32, &'static str>) {
    assert_eq!(map.find(&4), map.find(&4));
    assert_ne!(map.find(&4), map.find(&5));
    assert_eq!(map.find(&1), map.begin());
}

#[rstest]
fn test_value_at_mut(mut map: AvlMap<i32, &'static str>) {
    let position = map.find(&3);
    *map.value_at_mut(position).unwrap() = "THREE";
    assert_eq!(map[&3], "THREE");
    assert_eq!(map.value_at_mut(map.end()), None);
}

#[rstest]
fn test_position_survives_insertions(mut map: AvlMap<i32, &'static str>) {
    let position = map.find(&4);
    for key in 10..40 {
        map.insert(key, "filler");
    }
    assert_eq!(map.entry_at(position), Some((&4, &"four")));
}

#[rstest]
fn test_stale_position_reads_nothing(mut map: AvlMap<i32, &'static str>) {
    let position = map.find(&8);
    map.erase(position);
    assert_eq!(map.entry_at(position), None);
    assert_eq!(map.next_position(position), map.end());
    assert!(map.cursor(position).is_end());
}

#[rstest]
#[case(Balancing::Avl)]
#[case(Balancing::Unbalanced)]
fn test_stale_position_ignores_reused_slot(#[case] balancing: Balancing) {
    let mut map = AvlMap::with_balancing(balancing);
    map.extend((1..=5).map(|key| (key, key)));

    let stale = map.find(&2);
    assert_eq!(map.erase(stale), Some((2, 2)));
    map.insert(100, 100);
    let fresh = map.find(&100);

    assert_ne!(stale, fresh);
    assert_eq!(map.entry_at(stale), None);
    assert_eq!(map.value_at_mut(stale), None);
    assert_eq!(map.next_position(stale), map.end());
    assert!(map.cursor(stale).is_end());
    assert_eq!(map.erase(stale), None);
    assert_eq!(map.len(), 5);
    assert_eq!(map.entry_at(fresh), Some((&100, &100)));
    assert_eq!(map.validate(), Ok(()));
}

// =============================================================================
// Cursor Tests
// =============================================================================

#[rstest]
fn test_cursor_walks_forward(map: AvlMap<i32, &'static str>) {
    let mut cursor = map.cursor(map.find(&4));
    assert_eq!(cursor.key_value(), Some((&4, &"four")));
    cursor.move_next();
    assert_eq!(cursor.key(), Some(&5));
    cursor.move_next();
    assert_eq!(cursor.value(), Some(&"eight"));
    cursor.move_next();
    assert!(cursor.is_end());
    cursor.move_next();
    assert!(cursor.is_end());
    assert_eq!(cursor.position(), map.end());
}

#[rstest]
fn test_cursor_copies_are_independent(map: AvlMap<i32, &'static str>) {
    let front = map.cursor_front();
    let mut moved = front;
    moved.move_next();
    assert_eq!(front.key(), Some(&1));
    assert_eq!(moved.key(), Some(&3));
    assert_ne!(front, moved);
    assert_eq!(front, map.cursor(map.begin()));
}

#[rstest]
fn test_cursor_mut_updates_values(mut map: AvlMap<i32, &'static str>) {
    let mut cursor = map.cursor_front_mut();
    while let Some(value) = cursor.value_mut() {
        *value = "seen";
        cursor.move_next();
    }
    assert!(map.values().all(|value| *value == "seen"));
}

#[rstest]
#[case(Balancing::Avl)]
#[case(Balancing::Unbalanced)]
fn test_cursor_mut_removes_while_walking(#[case] balancing: Balancing) {
    let mut map = AvlMap::with_balancing(balancing);
    map.extend((0..50).map(|key| (key, key)));

    let mut cursor = map.cursor_front_mut();
    let mut removed = Vec::new();
    while let Some(&key) = cursor.key() {
        if key % 5 == 0 {
            removed.push(cursor.remove_current().unwrap().0);
        } else {
            cursor.move_next();
        }
    }

    assert_eq!(removed, (0..50).step_by(5).collect::<Vec<_>>());
    assert_eq!(map.len(), 40);
    assert_eq!(map.validate(), Ok(()));
}

#[rstest]
fn test_cursor_mut_as_cursor(mut map: AvlMap<i32, &'static str>) {
    let position = map.find(&5);
    let cursor = map.cursor_mut(position);
    assert_eq!(cursor.as_cursor().key_value(), Some((&5, &"five")));
    assert_eq!(cursor.position(), position);
}

#[rstest]
fn test_remove_current_at_end_is_noop(mut map: AvlMap<i32, &'static str>) {
    let end = map.end();
    let mut cursor = map.cursor_mut(end);
    assert_eq!(cursor.remove_current(), None);
    assert_eq!(map.len(), 5);
}
