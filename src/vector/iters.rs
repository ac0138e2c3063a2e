use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr;

use crate::common::destruct_n;

use super::storage::Storage;

/// An owning iterator over the elements of a [`Vector`](super::Vector).
///
/// The storage is taken over with its length set to zero, so the buffer is
/// released when the iterator is dropped and only the elements not yet
/// yielded are destroyed.
pub struct IntoIter<T, S: Storage<T>> {
    storage: S,
    front: usize,
    back: usize,
    _marker: PhantomData<T>,
}

impl<T, S: Storage<T>> IntoIter<T, S> {
    pub(super) fn new(mut storage: S) -> Self {
        let back = storage.len();
        // SAFETY: the iterator now owns `[0, back)` and tracks it itself.
        unsafe { storage.set_len(0) };
        Self {
            storage,
            front: 0,
            back,
            _marker: PhantomData,
        }
    }

    /// Returns the elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[front, back)` is initialized and owned by the iterator.
        unsafe {
            core::slice::from_raw_parts(self.storage.as_ptr().add(self.front), self.back - self.front)
        }
    }
}

impl<T, S: Storage<T>> Iterator for IntoIter<T, S> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: front < back, the slot is initialized and is never read again.
        let value = unsafe { ptr::read(self.storage.as_ptr().add(self.front)) };
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<T, S: Storage<T>> DoubleEndedIterator for IntoIter<T, S> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: back >= front, the slot is initialized and is never read again.
        Some(unsafe { ptr::read(self.storage.as_ptr().add(self.back)) })
    }
}

impl<T, S: Storage<T>> ExactSizeIterator for IntoIter<T, S> {}

impl<T, S: Storage<T>> FusedIterator for IntoIter<T, S> {}

impl<T, S: Storage<T>> Drop for IntoIter<T, S> {
    fn drop(&mut self) {
        let remaining = self.back - self.front;
        let front = self.front;
        self.front = self.back;
        // SAFETY: `[front, back)` still holds values nobody else will read.
        unsafe { destruct_n(self.storage.as_mut_ptr().add(front), remaining) };
    }
}
