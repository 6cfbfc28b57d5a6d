/// Errors surfaced by the interval tree and its iterator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum IntervalTreeError {
    /// The iterator was asked to walk in a direction it does not know.
    #[error("unknown iterator direction: {0}")]
    InvalidDirection(String),
    /// The operation is not available on this object.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    /// A tree node can only be built from at least one interval.
    #[error("cannot build a tree node from an empty interval list")]
    EmptyInput,
}
