use std::fmt;
use std::hash::Hash;

pub type DefaultIx = u32;

/// Integer types usable as arena indices.
///
/// # Safety
///
/// `new(x).index()` must return `x` for every `x <= max().index()`.
pub unsafe trait IndexType: Copy + Default + Hash + Ord + fmt::Debug + 'static {
    fn new(x: usize) -> Self;
    fn index(&self) -> usize;
    fn max() -> Self;
}

macro_rules! index_type {
    ($($t:ty),*) => {$(
        unsafe impl IndexType for $t {
            #[inline(always)]
            fn new(x: usize) -> Self {
                x as $t
            }
            #[inline(always)]
            fn index(&self) -> usize {
                *self as usize
            }
            #[inline(always)]
            fn max() -> Self {
                <$t>::MAX
            }
        }
    )*};
}

index_type!(u16, u32, u64, usize);

/// Position of a node inside the tree's arena.
#[derive(Copy, Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct NodeIndex<Ix = DefaultIx>(Ix);

impl<Ix: IndexType> NodeIndex<Ix> {
    #[inline]
    pub fn new(x: usize) -> Self {
        NodeIndex(IndexType::new(x))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0.index()
    }

    /// The first index that can no longer be addressed.
    #[inline]
    pub fn end() -> Self {
        NodeIndex(IndexType::max())
    }

    /// Slot of the empty sentinel node.
    #[inline]
    pub fn sentinel() -> Self {
        NodeIndex::new(0)
    }
}

impl<Ix: fmt::Debug> fmt::Debug for NodeIndex<Ix> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NodeIndex({:?})", self.0)
    }
}
