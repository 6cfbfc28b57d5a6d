//! `centered_interval_tree` is an index of half-open intervals `[start, end)` carrying
//! payloads, based on a centered interval tree.
//!
//! It answers stabbing queries (all intervals containing a point), overlap queries (all
//! intervals intersecting a range), and walks the intervals from a border forward or backward.
//!
//! Changes are buffered in a staging list and the tree is rebuilt from scratch by the next
//! query, so batches of insertions and removals cost a single O(n log n) build. Nodes live in
//! an arena and refer to their children and parent by index, which lets the directional
//! iterator climb back up the tree without reference cycles.
//!
//! # Example
//!
//! ```rust
//! use centered_interval_tree::{IntervalTree, IteratorDirection};
//!
//! let mut tree = IntervalTree::new();
//! tree.add(1, 5, "A");
//! tree.add(3, 7, "B");
//! tree.add(6, 10, "C");
//! let mut at_four = tree.get(4);
//! at_four.sort();
//! assert_eq!(at_four, vec![Some(&"A"), Some(&"B")]);
//!
//! let after: Vec<_> = tree
//!     .get_iterator(3, IteratorDirection::Forward)
//!     .filter_map(|i| i.payload())
//!     .collect();
//! assert_eq!(after, vec![&"B", &"C"]);
//! ```
//!

mod error;
mod index;
mod interval;
mod intervaltree;
mod iter;
mod node;


pub use error::IntervalTreeError;
pub use index::{DefaultIx, IndexType};
pub use interval::Interval;
pub use intervaltree::IntervalTree;
pub use iter::{IntervalTreeIter, IteratorDirection};
