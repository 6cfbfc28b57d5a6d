use std::collections::VecDeque;
use std::fmt;

use log::{debug, error};

use crate::error::IntervalTreeError;
use crate::index::{DefaultIx, IndexType, NodeIndex};
use crate::interval::Interval;
use crate::iter::{IntervalTreeIter, IteratorDirection};
use crate::node::Node;

/// An index of intervals answering stabbing and overlap queries.
///
/// Intervals are buffered in a staging list; the centered interval tree over them is rebuilt
/// from scratch by the first query following a change.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "P: serde::Serialize, Ix: serde::Serialize",
        deserialize = "P: serde::Deserialize<'de> + fmt::Display + Eq, Ix: serde::Deserialize<'de>"
    ))
)]
pub struct IntervalTree<P, Ix = DefaultIx> {
    /// Vector that stores nodes, the first one being the empty sentinel
    pub(crate) nodes: Vec<Node<P, Ix>>,
    /// Root of the interval tree
    pub(crate) root: NodeIndex<Ix>,
    /// Intervals waiting for the next build, in insertion order
    pub(crate) staging: Vec<Interval<P>>,
    /// Whether `staging` changed since the last build
    pub(crate) dirty: bool,
    /// Number of intervals in the last build
    pub(crate) size: usize,
}

/// Which child slot of its parent a pending node fills.
#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl<P, Ix> IntervalTree<P, Ix>
where
    Ix: IndexType,
{
    /// Creates a new `IntervalTree` with estimated staging capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        IntervalTree {
            nodes: vec![Node::sentinel()],
            root: NodeIndex::sentinel(),
            staging: Vec::with_capacity(capacity),
            dirty: false,
            size: 0,
        }
    }

    /// Add an interval to the staging list. The tree is rebuilt on the next query.
    #[inline]
    pub fn add_interval(&mut self, interval: Interval<P>) {
        self.staging.push(interval);
        self.dirty = true;
    }

    /// Add the interval [start, end) carrying `payload`. The tree is rebuilt on the next query.
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_tree::IntervalTree;
    ///
    /// let mut tree = IntervalTree::new();
    /// tree.add(1, 5, "A");
    /// assert!(!tree.in_sync());
    /// assert_eq!(tree.get(3), vec![Some(&"A")]);
    /// assert!(tree.in_sync());
    /// ```
    #[inline]
    pub fn add(&mut self, start: i64, end: i64, payload: P) {
        self.add_interval(Interval::new(start, end, Some(payload)));
    }

    /// Remove all intervals. The tree is rebuilt on the next query.
    #[inline]
    pub fn clear(&mut self) {
        self.staging.clear();
        self.dirty = true;
    }

    /// Return `true` if no change was made since the last build.
    #[inline]
    #[must_use]
    pub fn in_sync(&self) -> bool {
        !self.dirty
    }

    /// Return the number of intervals in the staging list.
    #[inline]
    #[must_use]
    pub fn list_size(&self) -> usize {
        self.staging.len()
    }

    /// Return the number of intervals in the staging list, which is what the tree holds once
    /// in sync.
    #[inline]
    #[must_use]
    pub fn current_size(&self) -> usize {
        self.staging.len()
    }

    /// Return the number of intervals the tree was last built from.
    #[inline]
    #[must_use]
    pub fn built_size(&self) -> usize {
        self.size
    }

    /// Get an iterator over the staging list, in insertion order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Interval<P>> {
        self.staging.iter()
    }

    /// Stabbing query against the last build, without rebuilding.
    ///
    /// Each interval containing `time` is returned as many times as it was added.
    pub fn stab(&self, time: i64) -> Vec<&Interval<P>> {
        let mut list = Vec::new();
        let mut x = Some(self.root);
        while let Some(p) = x {
            let node = self.node_ref(p, |np| np);
            node.stab_into(time, &mut list);
            x = if time < node.center() {
                node.left()
            } else if time > node.center() {
                node.right()
            } else {
                None
            };
        }
        list
    }

    /// Overlap query against the last build, without rebuilding.
    ///
    /// Results come node first, then its left subtree, then its right subtree.
    pub fn overlap(&self, start: i64, end: i64) -> Vec<&Interval<P>> {
        let mut list = Vec::new();
        let mut stack = vec![self.root];
        while let Some(p) = stack.pop() {
            let node = self.node_ref(p, |np| np);
            node.query_into(start, end, &mut list);
            if let Some(right) = node.right().filter(|_| end > node.center()) {
                stack.push(right);
            }
            if let Some(left) = node.left().filter(|_| start < node.center()) {
                stack.push(left);
            }
        }
        list
    }

    fn node_ref<'a, F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<P, Ix>) -> R,
    {
        op(&self.nodes[node.index()])
    }

    fn node_mut<F, R>(&mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        F: FnOnce(&mut Node<P, Ix>) -> R,
    {
        op(&mut self.nodes[node.index()])
    }
}

impl<P, Ix> IntervalTree<P, Ix>
where
    P: PartialEq,
    Ix: IndexType,
{
    /// Remove the first interval equal to `interval` from the staging list, returning whether
    /// one was found. The tree is rebuilt on the next query either way.
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_tree::{Interval, IntervalTree};
    ///
    /// let mut tree = IntervalTree::new();
    /// tree.add(1, 3, 1);
    /// tree.add(1, 3, 1);
    /// assert!(tree.remove_interval(&Interval::new(1, 3, Some(1))));
    /// assert!(!tree.remove_interval(&Interval::new(1, 3, Some(2))));
    /// assert_eq!(tree.list_size(), 1);
    /// ```
    pub fn remove_interval(&mut self, interval: &Interval<P>) -> bool {
        let found = self.remove_first(interval);
        self.dirty = true;
        found
    }

    /// Remove each of `intervals` from the staging list, one occurrence per element.
    pub fn remove_intervals<'b, I>(&mut self, intervals: I)
    where
        I: IntoIterator<Item = &'b Interval<P>>,
        P: 'b,
    {
        for interval in intervals {
            let _ignore = self.remove_first(interval);
        }
        self.dirty = true;
    }

    fn remove_first(&mut self, interval: &Interval<P>) -> bool {
        match self.staging.iter().position(|i| i == interval) {
            Some(pos) => {
                let _removed = self.staging.remove(pos);
                true
            }
            None => false,
        }
    }
}

impl<P, Ix> IntervalTree<P, Ix>
where
    P: Clone + fmt::Display + Eq,
    Ix: IndexType,
{
    /// Create an `IntervalTree` over `intervals`, built right away.
    ///
    /// # Panics
    ///
    /// This method panics when the tree needs more nodes than `Ix` can address
    #[must_use]
    pub fn from_intervals(intervals: Vec<Interval<P>>) -> Self {
        let mut tree = Self::with_capacity(0);
        tree.staging = intervals;
        tree.dirty = true;
        tree.build();
        tree
    }

    /// Rebuild the tree from the staging list if it changed since the last build.
    ///
    /// # Panics
    ///
    /// This method panics when the tree needs more nodes than `Ix` can address, or when a
    /// staged interval was inverted through `set_start`/`set_end` or deserialization
    pub fn build(&mut self) {
        if !self.dirty {
            return;
        }
        // an inverted interval never straddles a pivot and would be split forever
        assert!(
            self.staging.iter().all(|i| i.start() <= i.end()),
            "invalid range"
        );
        self.nodes = vec![Node::sentinel()];
        self.root = NodeIndex::sentinel();
        if !self.staging.is_empty() {
            if let Err(err) = self.grow(self.staging.clone()) {
                error!("interval tree rebuild failed: {err}");
                self.nodes.truncate(1);
                return;
            }
            self.root = NodeIndex::new(1);
        }
        self.dirty = false;
        self.size = self.staging.len();
        debug!(
            "interval tree rebuilt: {} intervals, {} nodes, root pivot {}",
            self.size,
            self.nodes.len() - 1,
            self.node_ref(self.root, Node::center)
        );
    }

    /// Lays out the nodes over `intervals` breadth first, after the ones already stored.
    fn grow(&mut self, intervals: Vec<Interval<P>>) -> Result<(), IntervalTreeError> {
        let mut queue: VecDeque<(Vec<Interval<P>>, Option<(NodeIndex<Ix>, Side)>)> =
            VecDeque::new();
        queue.push_back((intervals, None));
        while let Some((bucket, link)) = queue.pop_front() {
            let node_idx = NodeIndex::new(self.nodes.len());
            // check for max capacity, except if we use usize
            assert!(
                <Ix as IndexType>::max().index() == !0 || NodeIndex::end() != node_idx,
                "Reached maximum number of nodes"
            );
            let (node, split) = Node::build(bucket, link.map(|(parent, _)| parent))?;
            self.nodes.push(node);
            match link {
                Some((parent, Side::Left)) => self.node_mut(parent, Node::set_left(node_idx)),
                Some((parent, Side::Right)) => self.node_mut(parent, Node::set_right(node_idx)),
                None => {}
            }
            if !split.left.is_empty() {
                queue.push_back((split.left, Some((node_idx, Side::Left))));
            }
            if !split.right.is_empty() {
                queue.push_back((split.right, Some((node_idx, Side::Right))));
            }
        }
        Ok(())
    }

    /// Stabbing query: all intervals containing `time`, rebuilding first if needed.
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_tree::IntervalTree;
    ///
    /// let mut tree = IntervalTree::new();
    /// tree.add(1, 5, "A");
    /// tree.add(3, 7, "B");
    /// assert_eq!(tree.get_intervals(4).len(), 2);
    /// assert_eq!(tree.get_intervals(5).len(), 1);
    /// ```
    pub fn get_intervals(&mut self, time: i64) -> Vec<&Interval<P>> {
        self.build();
        self.stab(time)
    }

    /// Payloads of the intervals containing `time`.
    pub fn get(&mut self, time: i64) -> Vec<Option<&P>> {
        self.get_intervals(time)
            .into_iter()
            .map(Interval::payload)
            .collect()
    }

    /// Overlap query: all intervals intersecting [start, end), rebuilding first if needed.
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_tree::IntervalTree;
    ///
    /// let mut tree = IntervalTree::new();
    /// tree.add(1, 5, "A");
    /// tree.add(6, 10, "C");
    /// assert_eq!(tree.get_intervals_between(2, 6).len(), 1);
    /// assert_eq!(tree.get_intervals_between(2, 7).len(), 2);
    /// ```
    pub fn get_intervals_between(&mut self, start: i64, end: i64) -> Vec<&Interval<P>> {
        self.build();
        self.overlap(start, end)
    }

    /// Payloads of the intervals intersecting [start, end).
    pub fn get_between(&mut self, start: i64, end: i64) -> Vec<Option<&P>> {
        self.get_intervals_between(start, end)
            .into_iter()
            .map(Interval::payload)
            .collect()
    }

    /// Iterator walking away from `border` in `direction`, rebuilding first if needed.
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_tree::{IntervalTree, IteratorDirection};
    ///
    /// let mut tree = IntervalTree::new();
    /// tree.add(10, 20, "a");
    /// tree.add(15, 25, "b");
    /// tree.add(30, 40, "c");
    /// let backward: Vec<_> = tree
    ///     .get_iterator(30, IteratorDirection::Backward)
    ///     .filter_map(|i| i.payload())
    ///     .collect();
    /// assert_eq!(backward, vec![&"b", &"a"]);
    /// ```
    pub fn get_iterator(
        &mut self,
        border: i64,
        direction: IteratorDirection,
    ) -> IntervalTreeIter<'_, P, Ix> {
        self.build();
        IntervalTreeIter::new(border, self, direction)
    }

    /// Iterator walking away from `border` over the last build, without rebuilding.
    pub fn cursor(&self, border: i64, direction: IteratorDirection) -> IntervalTreeIter<'_, P, Ix> {
        IntervalTreeIter::new(border, self, direction)
    }
}

impl<P> IntervalTree<P> {
    /// Create an empty `IntervalTree`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }
}

impl<P> Default for IntervalTree<P> {
    #[inline]
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<P, Ix> FromIterator<Interval<P>> for IntervalTree<P, Ix>
where
    P: Clone + fmt::Display + Eq,
    Ix: IndexType,
{
    fn from_iter<I: IntoIterator<Item = Interval<P>>>(iter: I) -> Self {
        Self::from_intervals(iter.into_iter().collect())
    }
}

impl<P, Ix> Extend<Interval<P>> for IntervalTree<P, Ix>
where
    Ix: IndexType,
{
    fn extend<I: IntoIterator<Item = Interval<P>>>(&mut self, iter: I) {
        self.staging.extend(iter);
        self.dirty = true;
    }
}

impl<'a, P, Ix> IntoIterator for &'a IntervalTree<P, Ix>
where
    Ix: IndexType,
{
    type Item = &'a Interval<P>;
    type IntoIter = std::slice::Iter<'a, Interval<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One line per node, pre-order, indented with a tab per level.
impl<P, Ix> fmt::Display for IntervalTree<P, Ix>
where
    P: fmt::Display,
    Ix: IndexType,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root, 0)];
        while let Some((p, level)) = stack.pop() {
            let node = self.node_ref(p, |np| np);
            for _ in 0..level {
                f.write_str("\t")?;
            }
            writeln!(f, "{node}")?;
            if let Some(right) = node.right() {
                stack.push((right, level + 1));
            }
            if let Some(left) = node.left() {
                stack.push((left, level + 1));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "graphviz")]
impl<P, Ix> IntervalTree<P, Ix>
where
    P: fmt::Display,
    Ix: IndexType,
{
    /// Write the last build as a Graphviz digraph to `filename`.
    pub fn draw(&self, filename: &str) -> std::io::Result<()> {
        self.draw_with(filename, |node| node.to_string())
    }

    /// Write the last build as a Graphviz digraph to `filename`, showing only the pivots and
    /// the bounds of the intervals.
    pub fn draw_without_payload(&self, filename: &str) -> std::io::Result<()> {
        self.draw_with(filename, |node| {
            let mut label = format!("{}:", node.center());
            for (interval, count) in &node.intervals {
                label.push_str(&format!(" [{},{})x{}", interval.start(), interval.end(), count));
            }
            label
        })
    }

    fn draw_with<F>(&self, filename: &str, label: F) -> std::io::Result<()>
    where
        F: Fn(&Node<P, Ix>) -> String,
    {
        use std::io::Write;

        let mut file = std::io::BufWriter::new(std::fs::File::create(filename)?);
        writeln!(file, "digraph IntervalTree {{")?;
        writeln!(file, "    node [shape=box];")?;
        let mut stack = vec![self.root];
        while let Some(p) = stack.pop() {
            let node = self.node_ref(p, |np| np);
            let text = label(node).replace('"', "\\\"");
            writeln!(file, "    n{} [label=\"{}\"];", p.index(), text.trim_end())?;
            for child in [node.left(), node.right()].into_iter().flatten() {
                writeln!(file, "    n{} -> n{};", p.index(), child.index())?;
                stack.push(child);
            }
        }
        writeln!(file, "}}")?;
        file.flush()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn growing_from_nothing_is_an_error() {
        let mut tree = IntervalTree::<&str>::new();
        assert_eq!(tree.grow(Vec::new()), Err(IntervalTreeError::EmptyInput));
        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.node_ref(tree.root, |node| node.left().is_none()));
    }
}
