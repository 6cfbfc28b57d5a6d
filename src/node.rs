use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::IntervalTreeError;
use crate::index::{IndexType, NodeIndex};
use crate::interval::Interval;

/// Node of the centered interval tree
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "P: serde::Serialize, Ix: serde::Serialize",
        deserialize = "P: serde::Deserialize<'de> + fmt::Display + Eq, Ix: serde::Deserialize<'de>"
    ))
)]
pub struct Node<P, Ix> {
    /// Pivot point, always one of the endpoints the node was built from
    pub center: i64,
    /// Intervals straddling the pivot, with their number of occurrences
    #[cfg_attr(feature = "serde", serde(with = "multiset"))]
    pub intervals: BTreeMap<Interval<P>, u64>,
    /// Subtree of the intervals ending before the pivot
    pub left: Option<NodeIndex<Ix>>,
    /// Subtree of the intervals starting after the pivot
    pub right: Option<NodeIndex<Ix>>,
    /// Parent
    pub parent: Option<NodeIndex<Ix>>,
}

/// Intervals of a node's input lying wholly on one side of its pivot.
pub(crate) struct Split<P> {
    pub left: Vec<Interval<P>>,
    pub right: Vec<Interval<P>>,
}

impl<P, Ix> Node<P, Ix>
where
    P: fmt::Display + Eq,
    Ix: IndexType,
{
    /// Builds a node over `intervals`, keeping the ones straddling the median endpoint and
    /// returning the others for the children.
    pub(crate) fn build(
        intervals: Vec<Interval<P>>,
        parent: Option<NodeIndex<Ix>>,
    ) -> Result<(Self, Split<P>), IntervalTreeError> {
        let center = median_endpoint(&intervals).ok_or(IntervalTreeError::EmptyInput)?;
        let mut node = Node {
            center,
            intervals: BTreeMap::new(),
            left: None,
            right: None,
            parent,
        };
        let mut split = Split {
            left: Vec::new(),
            right: Vec::new(),
        };
        for interval in intervals {
            if interval.end() < center {
                split.left.push(interval);
            } else if interval.start() > center {
                split.right.push(interval);
            } else {
                *node.intervals.entry(interval).or_insert(0) += 1;
            }
        }
        Ok((node, split))
    }
}

/// Returns the endpoint at position `len / 2` among the distinct endpoints, not interpolated.
fn median_endpoint<P>(intervals: &[Interval<P>]) -> Option<i64> {
    let endpoints: BTreeSet<i64> = intervals
        .iter()
        .flat_map(|i| [i.start(), i.end()])
        .collect();
    endpoints.iter().nth(endpoints.len() / 2).copied()
}

// Convenient getter methods
impl<P, Ix> Node<P, Ix>
where
    Ix: IndexType,
{
    pub fn sentinel() -> Self {
        Node {
            center: 0,
            intervals: BTreeMap::new(),
            left: None,
            right: None,
            parent: None,
        }
    }

    #[cfg(test)]
    pub fn is_sentinel(&self) -> bool {
        self.intervals.is_empty() && self.left.is_none() && self.right.is_none()
    }

    pub fn center(&self) -> i64 {
        self.center
    }

    pub fn left(&self) -> Option<NodeIndex<Ix>> {
        self.left
    }

    pub fn right(&self) -> Option<NodeIndex<Ix>> {
        self.right
    }

    pub fn parent(&self) -> Option<NodeIndex<Ix>> {
        self.parent
    }

    pub fn set_left(left: NodeIndex<Ix>) -> impl FnOnce(&mut Node<P, Ix>) {
        move |node: &mut Node<P, Ix>| {
            let _ignore = node.left.replace(left);
        }
    }

    pub fn set_right(right: NodeIndex<Ix>) -> impl FnOnce(&mut Node<P, Ix>) {
        move |node: &mut Node<P, Ix>| {
            let _ignore = node.right.replace(right);
        }
    }

    /// Collects the local intervals containing `time`, each as many times as it occurs.
    ///
    /// The scan stops at the first interval starting after `time`.
    pub fn stab_into<'a>(&'a self, time: i64, out: &mut Vec<&'a Interval<P>>) {
        for (interval, &count) in &self.intervals {
            if interval.contains(time) {
                out.extend(std::iter::repeat(interval).take(count as usize));
            } else if interval.start() > time {
                break;
            }
        }
    }

    /// Collects the local intervals intersecting [start, end), each as many times as it occurs.
    ///
    /// The scan stops at the first interval starting after `end`.
    pub fn query_into<'a>(&'a self, start: i64, end: i64, out: &mut Vec<&'a Interval<P>>) {
        for (interval, &count) in &self.intervals {
            if end > interval.start() && start < interval.end() {
                out.extend(std::iter::repeat(interval).take(count as usize));
            } else if interval.start() > end {
                break;
            }
        }
    }
}

impl<P: fmt::Display, Ix> fmt::Display for Node<P, Ix> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.center)?;
        for (interval, &count) in &self.intervals {
            write!(f, "[{},{}]:{{", interval.start(), interval.end())?;
            for _ in 0..count {
                write!(f, "{interval}")?;
            }
            write!(f, "}} ")?;
        }
        Ok(())
    }
}

/// The multiset is written as a sequence of `(interval, count)` pairs, since most formats only
/// accept strings as map keys.
#[cfg(feature = "serde")]
mod multiset {
    use std::collections::BTreeMap;
    use std::fmt;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::interval::Interval;

    pub fn serialize<S, P>(map: &BTreeMap<Interval<P>, u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        P: Serialize,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D, P>(deserializer: D) -> Result<BTreeMap<Interval<P>, u64>, D::Error>
    where
        D: Deserializer<'de>,
        P: Deserialize<'de> + fmt::Display + Eq,
    {
        let entries = Vec::<(Interval<P>, u64)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type TestNode = Node<&'static str, u32>;

    #[test]
    fn empty_input_is_rejected() {
        let res = TestNode::build(Vec::new(), None);
        assert!(matches!(res, Err(IntervalTreeError::EmptyInput)));
    }

    #[test]
    fn pivot_is_median_endpoint() {
        // endpoints {1, 3, 5, 6, 7, 10}, index 3
        let (node, split) = TestNode::build(
            vec![
                Interval::new(1, 5, Some("A")),
                Interval::new(3, 7, Some("B")),
                Interval::new(6, 10, Some("C")),
            ],
            None,
        )
        .unwrap();
        assert_eq!(node.center, 6);
        assert_eq!(split.left, vec![Interval::new(1, 5, Some("A"))]);
        assert!(split.right.is_empty());
        let local: Vec<_> = node.intervals.keys().cloned().collect();
        assert_eq!(
            local,
            vec![Interval::new(3, 7, Some("B")), Interval::new(6, 10, Some("C"))]
        );
    }

    #[test]
    fn interval_ending_at_pivot_straddles() {
        let (node, split) = TestNode::build(
            vec![Interval::new(0, 4, Some("a")), Interval::new(4, 8, Some("b"))],
            None,
        )
        .unwrap();
        assert_eq!(node.center, 4);
        assert_eq!(node.intervals.len(), 2);
        assert!(split.left.is_empty() && split.right.is_empty());
    }

    #[test]
    fn duplicates_collapse_into_count() {
        let (node, _) =
            TestNode::build(vec![Interval::new(0, 10, Some("x")); 3], None).unwrap();
        assert_eq!(node.intervals.len(), 1);
        assert_eq!(node.intervals.get(&Interval::new(0, 10, Some("x"))), Some(&3));

        let mut out = Vec::new();
        node.stab_into(5, &mut out);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn local_scans_respect_half_open_bounds() {
        let (node, _) = TestNode::build(
            vec![Interval::new(0, 4, Some("a")), Interval::new(4, 8, Some("b"))],
            None,
        )
        .unwrap();
        let mut out = Vec::new();
        node.stab_into(4, &mut out);
        assert_eq!(out, vec![&Interval::new(4, 8, Some("b"))]);

        out.clear();
        node.query_into(8, 12, &mut out);
        assert!(out.is_empty());

        out.clear();
        node.query_into(3, 5, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn display_lists_every_copy() {
        let (node, _) =
            TestNode::build(vec![Interval::new(0, 10, Some("x")); 2], None).unwrap();
        assert_eq!(node.to_string(), "10: [0,10]:{(0,10,x)(0,10,x)} ");
    }
}
