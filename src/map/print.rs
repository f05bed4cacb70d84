//! ASCII diagram of the tree shape, for debugging.
//!
//! The diagram is drawn sideways: the greatest key is on the first line and
//! the left branch of the tree is at the bottom. Each node is indented by
//! `height(root) - height(node)` levels. A left child has a `\` edge line
//! above its own line, and a right child has a `/` edge line below it.
//!
//! ```text
//!               8
//!               /
//! 5
//!               4
//!               /
//!        \
//!        3
//!               \
//!               1
//! ```
//!
//! (the diagram of the keys `5, 3, 8, 1, 4` inserted in that order, minus the
//! trailing blank line)
//!
//! [`AvlMap::diagram`] draws keys only and needs nothing but `K: Display`.
//! [`AvlMap::diagram_with_values`] appends ` -> value` to every node line.

use std::fmt;
use std::io;

use super::node::NodeId;
use super::tree::AvlMap;

const INDENT: &str = "       ";

/// Which link leads to a node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Edge {
    Root,
    Left,
    Right,
}

/// A [`Display`](fmt::Display) adapter that draws the keys of an
/// [`AvlMap`] as a tree.
///
/// Created by [`AvlMap::diagram`].
pub struct Diagram<'a, K, V> {
    map: &'a AvlMap<K, V>,
}

/// A [`Display`](fmt::Display) adapter that draws the entries of an
/// [`AvlMap`] as a tree, each node line reading `key -> value`.
///
/// Created by [`AvlMap::diagram_with_values`].
pub struct ValueDiagram<'a, K, V> {
    map: &'a AvlMap<K, V>,
}

fn edge<K, V>(map: &AvlMap<K, V>, id: NodeId) -> Edge {
    match map.nodes[id].parent {
        None => Edge::Root,
        Some(parent) if map.nodes[parent].is_left_child(id) => Edge::Left,
        Some(_) => Edge::Right,
    }
}

fn write_indent(formatter: &mut fmt::Formatter<'_>, levels: u32) -> fmt::Result {
    for _ in 0..levels {
        formatter.write_str(INDENT)?;
    }
    Ok(())
}

/// Draws the tree, delegating the text of each node line to `label`.
fn draw<K, V, F>(map: &AvlMap<K, V>, formatter: &mut fmt::Formatter<'_>, label: F) -> fmt::Result
where
    K: Ord,
    F: Fn(&mut fmt::Formatter<'_>, &K, &V) -> fmt::Result,
{
    let nodes = &map.nodes;
    let Some(root) = map.root else {
        return writeln!(formatter);
    };
    let root_height = nodes[root].height;

    let mut current = Some(nodes.last(root));
    while let Some(id) = current {
        let node = &nodes[id];
        let depth = root_height - node.height;
        let edge = edge(map, id);

        if edge == Edge::Left {
            write_indent(formatter, depth)?;
            writeln!(formatter, "\\")?;
        }

        write_indent(formatter, depth)?;
        label(formatter, &node.key, &node.value)?;
        writeln!(formatter)?;

        if edge == Edge::Right {
            write_indent(formatter, depth)?;
            writeln!(formatter, "/")?;
        }

        current = nodes.predecessor(id);
    }
    writeln!(formatter)
}

impl<K: Ord + fmt::Display, V> fmt::Display for Diagram<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        draw(self.map, formatter, |formatter, key, _| write!(formatter, "{key}"))
    }
}

impl<K: Ord + fmt::Display, V: fmt::Display> fmt::Display for ValueDiagram<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        draw(self.map, formatter, |formatter, key, value| {
            write!(formatter, "{key} -> {value}")
        })
    }
}

impl<K, V> AvlMap<K, V> {
    /// Returns an adapter that draws the tree shape, one key per line, when
    /// displayed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let map: AvlMap<i32, ()> = [2, 1, 3].into_iter().map(|key| (key, ())).collect();
    /// let expected = "       3\n       /\n2\n       \\\n       1\n\n";
    /// assert_eq!(map.diagram().to_string(), expected);
    /// ```
    #[must_use]
    pub const fn diagram(&self) -> Diagram<'_, K, V> {
        Diagram { map: self }
    }

    /// Like [`diagram`](Self::diagram), with each key followed by ` -> value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use avlmap::AvlMap;
    ///
    /// let map: AvlMap<i32, &str> = [(2, "two"), (1, "one"), (3, "three")]
    ///     .into_iter()
    ///     .collect();
    /// let expected = "       3 -> three\n       /\n2 -> two\n       \\\n       1 -> one\n\n";
    /// assert_eq!(map.diagram_with_values().to_string(), expected);
    /// ```
    #[must_use]
    pub const fn diagram_with_values(&self) -> ValueDiagram<'_, K, V> {
        ValueDiagram { map: self }
    }
}

impl<K: Ord + fmt::Display, V> AvlMap<K, V> {
    /// Writes the keys-only diagram of [`diagram`](Self::diagram) to `sink`.
    ///
    /// # Errors
    ///
    /// Returns any error produced by `sink`.
    pub fn print_keys<W: io::Write>(&self, sink: &mut W) -> io::Result<()> {
        write!(sink, "{}", self.diagram())
    }
}

impl<K: Ord + fmt::Display, V: fmt::Display> AvlMap<K, V> {
    /// Writes the diagram to `sink`, with values when `print_values` is set.
    ///
    /// Use [`print_keys`](Self::print_keys) for maps whose values are not
    /// `Display`.
    ///
    /// # Errors
    ///
    /// Returns any error produced by `sink`.
    pub fn print<W: io::Write>(&self, sink: &mut W, print_values: bool) -> io::Result<()> {
        if print_values {
            write!(sink, "{}", self.diagram_with_values())
        } else {
            self.print_keys(sink)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
