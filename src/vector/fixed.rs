//! Fixed-capacity storage backed by an inline buffer.

use core::mem::MaybeUninit;

use allocated::AllocResult;
use generic_array::{ArrayLength, GenericArray};

use crate::common::destruct_n;

use super::storage::Storage;
use super::Vector;

/// Storage with room for exactly `N` elements, held inline.
///
/// The buffer never moves to the heap: any request to grow past `N` is a
/// fatal precondition violation rather than a recoverable error.
///
/// ```
/// use allocated_containers::FixedVector;
/// use allocated_containers::typenum::U4;
///
/// let mut v = FixedVector::<u32, U4>::new_fixed();
/// v.extend([1, 2, 3, 4]);
/// assert_eq!(v.capacity(), 4);
/// ```
pub struct FixedStorage<T, N: ArrayLength> {
    data: GenericArray<MaybeUninit<T>, N>,
    len: usize,
}

impl<T, N: ArrayLength> FixedStorage<T, N> {
    /// Creates an empty inline storage.
    pub fn new() -> Self {
        Self {
            data: GenericArray::uninit(),
            len: 0,
        }
    }
}

impl<T, N: ArrayLength> Default for FixedStorage<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: `data` always holds N slots and `len <= N` is maintained; the
// grow paths diverge instead of changing the buffer.
unsafe impl<T, N: ArrayLength> Storage<T> for FixedStorage<T, N> {
    #[inline]
    fn as_ptr(&self) -> *const T {
        self.data.as_ptr().cast()
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr().cast()
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn capacity(&self) -> usize {
        N::to_usize()
    }

    #[inline]
    unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(len <= N::to_usize());
        self.len = len;
    }

    fn reallocate(&mut self, new_capacity: usize) -> AllocResult<()> {
        panic!(
            "fixed-capacity storage cannot grow: requested {new_capacity}, capacity is {}",
            N::to_usize()
        );
    }

    fn reallocate_discard_old(&mut self, new_capacity: usize) -> AllocResult<()> {
        panic!(
            "fixed-capacity storage cannot grow: requested {new_capacity}, capacity is {}",
            N::to_usize()
        );
    }

    fn reset(&mut self) {
        let len = self.len;
        self.len = 0;
        let ptr = self.as_mut_ptr();
        // SAFETY: `[0, len)` was initialized and len is already zeroed. The
        // inline buffer is never handed to an allocator.
        unsafe { destruct_n(ptr, len) };
    }
}

impl<T, N: ArrayLength> Drop for FixedStorage<T, N> {
    fn drop(&mut self) {
        self.reset();
    }
}

/// A [`Vector`] that never allocates and holds at most `N` elements.
pub type FixedVector<T, N> = Vector<T, FixedStorage<T, N>>;

impl<T, N: ArrayLength> Vector<T, FixedStorage<T, N>> {
    /// Creates an empty fixed-capacity vector.
    pub fn new_fixed() -> Self {
        Self::with_storage(FixedStorage::new())
    }
}

impl<T, N: ArrayLength> Default for Vector<T, FixedStorage<T, N>> {
    fn default() -> Self {
        Self::new_fixed()
    }
}

impl<T: Clone, N: ArrayLength> Clone for Vector<T, FixedStorage<T, N>> {
    fn clone(&self) -> Self {
        let mut out = Self::new_fixed();
        out.extend(self.iter().cloned());
        out
    }
}
