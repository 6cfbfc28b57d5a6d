use std::collections::{btree_map, BTreeMap, HashSet};
use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

use log::trace;

use crate::error::IntervalTreeError;
use crate::index::{DefaultIx, IndexType, NodeIndex};
use crate::interval::{Backward, Interval};
use crate::intervaltree::IntervalTree;
use crate::node::Node;

/// The side of the border an `IntervalTreeIter` walks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IteratorDirection {
    /// Intervals starting at or after the border, in ascending order
    Forward,
    /// Intervals ending at or before the border, in descending order of their end
    Backward,
}

impl FromStr for IteratorDirection {
    type Err = IntervalTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("forward") {
            Ok(IteratorDirection::Forward)
        } else if s.eq_ignore_ascii_case("backward") {
            Ok(IteratorDirection::Backward)
        } else {
            Err(IntervalTreeError::InvalidDirection(s.to_owned()))
        }
    }
}

impl fmt::Display for IteratorDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IteratorDirection::Forward => f.write_str("FORWARD"),
            IteratorDirection::Backward => f.write_str("BACKWARD"),
        }
    }
}

/// Walks over the entries of one node, ascending or in backward order.
#[derive(Debug)]
enum NodeCursor<'a, P> {
    Ascending(btree_map::Iter<'a, Interval<P>, u64>),
    Descending(btree_map::IntoIter<Backward<'a, P>, u64>),
}

impl<'a, P> NodeCursor<'a, P> {
    fn next_entry(&mut self) -> Option<(&'a Interval<P>, u64)> {
        match self {
            NodeCursor::Ascending(iter) => iter.next().map(|(interval, &count)| (interval, count)),
            NodeCursor::Descending(iter) => iter
                .next()
                .map(|(Backward(interval), count)| (interval, count)),
        }
    }
}

/// An iterator over the intervals of an `IntervalTree` lying on one side of a border.
///
/// With [`IteratorDirection::Forward`] it yields the intervals starting at or after the
/// border, with [`IteratorDirection::Backward`] the ones ending at or before it. Duplicated
/// intervals are yielded as many times as they were added. Entries of a node come out in the
/// node's order and nodes are walked in order, starting next to the border.
///
/// The iterator reflects the tree as of its last build and borrows it, so the tree can not be
/// changed while the iterator is alive.
#[derive(Debug)]
pub struct IntervalTreeIter<'a, P, Ix = DefaultIx> {
    /// Reference to the tree
    tree: &'a IntervalTree<P, Ix>,
    direction: IteratorDirection,
    border: i64,
    current_node: NodeIndex<Ix>,
    current_parent: Option<NodeIndex<Ix>>,
    current_interval: Option<&'a Interval<P>>,
    /// Copies of `current_interval` still to be yielded
    current_interval_count: u64,
    cursor: Option<NodeCursor<'a, P>>,
    /// Lookahead filled by `has_next`
    found_next: Option<&'a Interval<P>>,
    /// Nodes whose entries or outer subtree were already walked
    visited: HashSet<NodeIndex<Ix>>,
}

impl<'a, P, Ix> IntervalTreeIter<'a, P, Ix>
where
    P: fmt::Display,
    Ix: IndexType,
{
    /// Creates an iterator over `tree` starting at `border`.
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_tree::{IntervalTree, IntervalTreeIter, IteratorDirection};
    ///
    /// let mut tree = IntervalTree::new();
    /// tree.add(10, 20, "a");
    /// tree.add(30, 40, "b");
    /// tree.build();
    /// let iter = IntervalTreeIter::new(15, &tree, IteratorDirection::Forward);
    /// let payloads: Vec<_> = iter.filter_map(|i| i.payload()).collect();
    /// assert_eq!(payloads, vec![&"b"]);
    /// ```
    pub fn new(border: i64, tree: &'a IntervalTree<P, Ix>, direction: IteratorDirection) -> Self {
        trace!("interval tree iterator from {border} going {direction}");
        let mut iter = IntervalTreeIter {
            tree,
            direction,
            border,
            current_node: tree.root,
            current_parent: None,
            current_interval: None,
            current_interval_count: 0,
            cursor: None,
            found_next: None,
            visited: HashSet::new(),
        };
        iter.descend(tree.root);
        iter
    }

    #[inline]
    pub fn direction(&self) -> IteratorDirection {
        self.direction
    }

    #[inline]
    pub fn border(&self) -> i64 {
        self.border
    }

    /// Returns `true` if another interval is available, computing and caching it.
    pub fn has_next(&mut self) -> bool {
        if self.found_next.is_none() {
            self.found_next = self.advance();
        }
        self.found_next.is_some()
    }

    /// Removing through the iterator is not supported, the tree is read-only while walked.
    pub fn remove(&mut self) -> Result<(), IntervalTreeError> {
        Err(IntervalTreeError::UnsupportedOperation("remove"))
    }

    fn node(&self, idx: NodeIndex<Ix>) -> &'a Node<P, Ix> {
        let tree: &'a IntervalTree<P, Ix> = self.tree;
        &tree.nodes[idx.index()]
    }

    /// Checks if a node with this pivot may hold intervals on the walked side of the border.
    fn reaches(&self, center: i64) -> bool {
        match self.direction {
            IteratorDirection::Forward => center >= self.border,
            IteratorDirection::Backward => center <= self.border,
        }
    }

    fn admits(&self, interval: &Interval<P>) -> bool {
        match self.direction {
            IteratorDirection::Forward => interval.start() >= self.border,
            IteratorDirection::Backward => interval.end() <= self.border,
        }
    }

    /// Child walked before the node itself.
    fn inner_child(&self, node: &Node<P, Ix>) -> Option<NodeIndex<Ix>> {
        match self.direction {
            IteratorDirection::Forward => node.left(),
            IteratorDirection::Backward => node.right(),
        }
    }

    /// Child walked after the node itself.
    fn outer_child(&self, node: &Node<P, Ix>) -> Option<NodeIndex<Ix>> {
        match self.direction {
            IteratorDirection::Forward => node.right(),
            IteratorDirection::Backward => node.left(),
        }
    }

    fn open(&self, node: &'a Node<P, Ix>) -> NodeCursor<'a, P> {
        match self.direction {
            IteratorDirection::Forward => NodeCursor::Ascending(node.intervals.iter()),
            IteratorDirection::Backward => {
                let reversed: BTreeMap<_, _> = node
                    .intervals
                    .iter()
                    .map(|(interval, &count)| (Backward(interval), count))
                    .collect();
                NodeCursor::Descending(reversed.into_iter())
            }
        }
    }

    /// Goes down towards the border from `from`. The last node reached becomes the current
    /// one, and if it reaches the border its cursor is primed.
    fn descend(&mut self, from: NodeIndex<Ix>) {
        let mut next = Some(from);
        while let Some(idx) = next.take() {
            let node = self.node(idx);
            self.current_node = idx;
            self.current_parent = node.parent();
            if self.reaches(node.center()) {
                match self.inner_child(node) {
                    Some(child) => next = Some(child),
                    None => self.prime(node),
                }
            }
        }
    }

    /// Positions the cursor right after the first entry of `node` past the border.
    fn prime(&mut self, node: &'a Node<P, Ix>) {
        let mut cursor = self.open(node);
        while let Some((interval, count)) = cursor.next_entry() {
            if self.admits(interval) {
                self.current_interval = Some(interval);
                self.current_interval_count = count;
                self.cursor = Some(cursor);
                return;
            }
        }
    }

    /// Follows the parent chain to the first ancestor not yet visited that reaches the border.
    fn climb(&mut self) -> Option<NodeIndex<Ix>> {
        while let Some(parent) = self.current_parent {
            let node = self.node(parent);
            if !self.visited.contains(&parent) && self.reaches(node.center()) {
                return Some(parent);
            }
            self.current_parent = node.parent();
        }
        None
    }

    fn advance(&mut self) -> Option<&'a Interval<P>> {
        loop {
            if self.current_interval_count > 0 {
                self.current_interval_count -= 1;
                return self.current_interval;
            }

            match self.cursor.as_mut().map(|cursor| cursor.next_entry()) {
                Some(Some((interval, count))) => {
                    if self.admits(interval) {
                        self.current_interval = Some(interval);
                        self.current_interval_count = count;
                    }
                    continue;
                }
                Some(None) => {
                    self.cursor = None;
                    continue;
                }
                None => {}
            }

            let node = self.node(self.current_node);
            if let Some(child) = self.outer_child(node) {
                let _ignore = self.visited.insert(self.current_node);
                if self.reaches(self.node(child).center()) {
                    self.descend(child);
                } else {
                    self.current_node = child;
                    self.current_parent = self.node(child).parent();
                }
                continue;
            }

            if let Some(ancestor) = self.climb() {
                let node = self.node(ancestor);
                self.current_node = ancestor;
                self.current_parent = node.parent();
                self.cursor = Some(self.open(node));
                let _ignore = self.visited.insert(ancestor);
                continue;
            }

            trace!("interval tree iterator from {} exhausted", self.border);
            return None;
        }
    }
}

impl<'a, P, Ix> Iterator for IntervalTreeIter<'a, P, Ix>
where
    P: fmt::Display,
    Ix: IndexType,
{
    type Item = &'a Interval<P>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self.found_next.take() {
            Some(interval) => Some(interval),
            None => self.advance(),
        }
    }
}

impl<P, Ix> FusedIterator for IntervalTreeIter<'_, P, Ix>
where
    P: fmt::Display,
    Ix: IndexType,
{
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!(
            "FORWARD".parse::<IteratorDirection>(),
            Ok(IteratorDirection::Forward)
        );
        assert_eq!(
            "backward".parse::<IteratorDirection>(),
            Ok(IteratorDirection::Backward)
        );
        assert_eq!(
            "sideways".parse::<IteratorDirection>(),
            Err(IntervalTreeError::InvalidDirection("sideways".to_owned()))
        );
        assert_eq!(IteratorDirection::Backward.to_string(), "BACKWARD");
    }

    #[test]
    fn remove_is_unsupported() {
        let tree = IntervalTree::<&str>::new();
        let mut iter = IntervalTreeIter::new(0, &tree, IteratorDirection::Forward);
        assert_eq!(
            iter.remove(),
            Err(IntervalTreeError::UnsupportedOperation("remove"))
        );
    }

    #[test]
    fn empty_tree_yields_nothing() {
        let tree = IntervalTree::<&str>::new();
        for direction in [IteratorDirection::Forward, IteratorDirection::Backward] {
            let mut iter = IntervalTreeIter::new(0, &tree, direction);
            assert!(!iter.has_next());
            assert_eq!(iter.next(), None);
            assert_eq!(iter.next(), None);
        }
    }

    #[test]
    fn has_next_caches_the_lookahead() {
        let mut tree = IntervalTree::new();
        tree.add(1, 2, "a");
        tree.add(3, 4, "b");
        let mut iter = tree.get_iterator(0, IteratorDirection::Forward);
        assert!(iter.has_next());
        assert!(iter.has_next());
        assert_eq!(iter.next().and_then(Interval::payload), Some(&"a"));
        assert!(iter.has_next());
        assert_eq!(iter.next().and_then(Interval::payload), Some(&"b"));
        assert!(!iter.has_next());
        assert_eq!(iter.next(), None);
    }
}
