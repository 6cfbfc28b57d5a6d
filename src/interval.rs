//! The `Interval` indexed by `IntervalTree` represents the half-open range [start, end)
//! together with an optional payload.
//!
//! Intervals are ordered by `start`, then by `end`. When both intervals carry a payload the
//! tie is broken by comparing the payloads' `Display` renderings as UTF-16 code units, so
//! characters outside the Basic Multilingual Plane sort before U+E000..=U+FFFF. Each such
//! comparison renders both payloads. For instance:
//! - [1,4)<[2,5), because 1<2
//! - [1,4)<[1,5), because 4<5
//! - [1,4,"a")<[1,4,"b"), because "a"<"b"
//!
//! Two intervals whose bounds match and where either payload is missing compare as equal, so
//! they collapse into the same multiset entry inside a tree node.

use std::cmp::Ordering;
use std::fmt;

/// An interval [start, end) carrying an optional payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval<P> {
    /// Inclusive lower bound
    start: i64,
    /// Exclusive upper bound
    end: i64,
    /// Associated data
    payload: Option<P>,
}

impl<P> Interval<P> {
    /// Create a new `Interval`
    ///
    /// # Panics
    ///
    /// This method panics when start > end
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_tree::Interval;
    ///
    /// let int = Interval::new(10, 20, Some("job"));
    /// assert!(int.contains(10));
    /// assert!(!int.contains(20));
    /// ```
    #[inline]
    pub fn new(start: i64, end: i64, payload: Option<P>) -> Self {
        assert!(start <= end, "invalid range");
        Self {
            start,
            end,
            payload,
        }
    }

    /// Create an `Interval` without payload.
    ///
    /// # Panics
    ///
    /// This method panics when start > end
    #[inline]
    pub fn bare(start: i64, end: i64) -> Self {
        Self::new(start, end, None)
    }

    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Bounds are not checked here, an inverted interval makes the next tree build panic.
    #[inline]
    pub fn set_start(&mut self, start: i64) {
        self.start = start;
    }

    #[inline]
    pub fn end(&self) -> i64 {
        self.end
    }

    #[inline]
    pub fn set_end(&mut self, end: i64) {
        self.end = end;
    }

    #[inline]
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    #[inline]
    pub fn set_payload(&mut self, payload: Option<P>) {
        self.payload = payload;
    }

    /// Consumes the interval and returns its payload
    #[inline]
    pub fn into_payload(self) -> Option<P> {
        self.payload
    }

    /// Checks if `time` lies in [start, end)
    #[inline]
    pub fn contains(&self, time: i64) -> bool {
        time < self.end && time >= self.start
    }

    /// Checks if self intersects with other interval
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_tree::Interval;
    ///
    /// let a = Interval::<()>::bare(10, 20);
    /// assert!(a.intersects(&Interval::<()>::bare(19, 30)));
    /// assert!(!a.intersects(&Interval::<()>::bare(20, 30)));
    /// ```
    #[inline]
    pub fn intersects<Q>(&self, other: &Interval<Q>) -> bool {
        other.end > self.start && other.start < self.end
    }
}

impl<P: fmt::Display> Interval<P> {
    /// Compare two intervals in backward order: `end` descending, then `start` descending,
    /// then the payload rendering ascending.
    pub fn cmp_backward(&self, other: &Self) -> Ordering {
        other
            .end
            .cmp(&self.end)
            .then_with(|| other.start.cmp(&self.start))
            .then_with(|| cmp_payloads(self.payload(), other.payload()))
    }
}

/// Payloads only break ties when both sides have one.
fn cmp_payloads<P: fmt::Display>(a: Option<&P>, b: Option<&P>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a
            .to_string()
            .encode_utf16()
            .cmp(b.to_string().encode_utf16()),
        _ => Ordering::Equal,
    }
}

impl<P: fmt::Display + Eq> Ord for Interval<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
            .then_with(|| cmp_payloads(self.payload(), other.payload()))
    }
}

impl<P: fmt::Display + Eq> PartialOrd for Interval<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: fmt::Display> fmt::Display for Interval<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(p) => write!(f, "({},{},{})", self.start, self.end, p),
            None => write!(f, "({},{},_)", self.start, self.end),
        }
    }
}

/// Borrowed interval keyed by the backward order, used to materialise a reversed view of a
/// node's multiset.
#[derive(Debug)]
pub(crate) struct Backward<'a, P>(pub(crate) &'a Interval<P>);

impl<P: fmt::Display> Ord for Backward<'_, P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp_backward(other.0)
    }
}

impl<P: fmt::Display> PartialOrd for Backward<'_, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: fmt::Display> PartialEq for Backward<'_, P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<P: fmt::Display> Eq for Backward<'_, P> {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn half_open_bounds() {
        let int = Interval::new(10, 20, Some("a"));
        assert!(int.contains(10));
        assert!(int.contains(19));
        assert!(!int.contains(20));
        assert!(!int.contains(9));
        assert!(!int.intersects(&Interval::<&str>::bare(20, 30)));
        assert!(!int.intersects(&Interval::<&str>::bare(0, 10)));
        assert!(int.intersects(&Interval::<&str>::bare(0, 11)));
        assert!(int.intersects(&Interval::<&str>::bare(12, 13)));
    }

    #[test]
    fn order_by_start_end_then_payload() {
        let a = Interval::new(1, 4, Some("b"));
        let b = Interval::new(1, 5, Some("a"));
        let c = Interval::new(2, 3, Some("a"));
        let d = Interval::new(1, 4, Some("c"));
        assert!(a < b);
        assert!(b < c);
        assert!(a < d);
        assert_eq!(
            Interval::new(1, 4, Some("x")).cmp(&Interval::new(1, 4, None)),
            Ordering::Equal
        );
    }

    #[test]
    fn payload_order_uses_rendering() {
        // 10 < 9 when compared as text
        let a = Interval::new(0, 1, Some(10));
        let b = Interval::new(0, 1, Some(9));
        assert!(a < b);
    }

    #[test]
    fn payload_order_compares_utf16_units() {
        // U+10000 is encoded as the surrogate pair D800 DC00
        let astral = Interval::new(0, 1, Some("\u{10000}"));
        let private_use = Interval::new(0, 1, Some("\u{E000}"));
        assert!(astral < private_use);
        assert_eq!(private_use.cmp_backward(&astral), Ordering::Greater);
    }

    #[test]
    fn backward_order() {
        let a = Interval::new(10, 20, Some("a"));
        let b = Interval::new(15, 25, Some("b"));
        let c = Interval::new(12, 25, Some("c"));
        let d = Interval::new(15, 25, Some("d"));
        assert_eq!(b.cmp_backward(&a), Ordering::Less);
        assert_eq!(b.cmp_backward(&c), Ordering::Less);
        assert_eq!(b.cmp_backward(&d), Ordering::Less);
        assert_eq!(b.cmp_backward(&b.clone()), Ordering::Equal);
    }

    #[test]
    fn structural_equality_includes_payload() {
        assert_eq!(Interval::new(1, 2, Some(3)), Interval::new(1, 2, Some(3)));
        assert_ne!(Interval::new(1, 2, Some(3)), Interval::new(1, 2, None));
    }

    #[test]
    #[should_panic(expected = "invalid range")]
    fn invalid_range_should_panic() {
        let _interval = Interval::new(3, 1, Some("a"));
    }

    #[test]
    fn empty_range_is_allowed() {
        let int = Interval::new(4, 4, Some("a"));
        assert!(!int.contains(4));
    }

    #[test]
    fn mutators_update_fields() {
        let mut int = Interval::new(1, 2, Some("a"));
        int.set_start(5);
        int.set_end(9);
        int.set_payload(Some("b"));
        assert_eq!(int, Interval::new(5, 9, Some("b")));
        assert_eq!(int.to_string(), "(5,9,b)");
        assert_eq!(Interval::<&str>::bare(1, 2).to_string(), "(1,2,_)");
    }
}
