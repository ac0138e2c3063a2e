use core::fmt;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut, Range};
use core::ptr;
use core::slice;

use allocated::{AllocResult, AllocResultExt};
use allocator_api2::alloc::{Allocator, Global};

use crate::common::{destruct_n, shift_left, shift_right};

mod fixed;
mod iters;
pub mod sorted;
pub mod storage;

#[cfg(test)]
mod tests;

pub use fixed::{FixedStorage, FixedVector};
pub use iters::IntoIter;
pub use storage::{HeapStorage, Storage};

/// A contiguous growable array whose memory is managed by a [`Storage`].
///
/// The default storage allocates from [`Global`]; [`HeapStorage::new_in`]
/// accepts any other [`Allocator`], and [`FixedStorage`] keeps the elements
/// inline with a compile-time capacity.
///
/// Growth doubles the capacity, starting from
/// [`INITIAL_CAPACITY`](Self::INITIAL_CAPACITY), so `push` is amortised
/// O(1).
///
/// Methods without a `try_` prefix treat allocation failure as fatal and
/// divert to [`alloc::alloc::handle_alloc_error`]. Index and capacity
/// preconditions are checked in every build.
///
/// # Examples
///
/// ```
/// use allocated_containers::Vector;
///
/// let mut v = Vector::new();
/// for i in 0..17 {
///     v.push(i);
/// }
/// assert_eq!(v.len(), 17);
/// assert_eq!(v.capacity(), 32);
///
/// let at = v.insert(3, 100);
/// assert_eq!(v[at], 100);
/// v.erase(at);
/// assert_eq!(v[3], 3);
/// ```
pub struct Vector<T, S = HeapStorage<T, Global>> {
    storage: S,
    _marker: PhantomData<T>,
}

impl<T> Vector<T, HeapStorage<T, Global>> {
    /// Creates an empty vector on the global allocator. Nothing is
    /// allocated until the first element is added.
    pub const fn new() -> Self {
        Self {
            storage: HeapStorage::new(),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Vector<T, HeapStorage<T, Global>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> Vector<T, HeapStorage<T, A>> {
    /// Creates an empty vector that allocates from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            storage: HeapStorage::new_in(alloc),
            _marker: PhantomData,
        }
    }

    /// Creates a vector holding `len` default values.
    pub fn with_len_in(len: usize, alloc: A) -> Self
    where
        T: Default,
    {
        let mut v = Self::new_in(alloc);
        v.resize(len);
        v
    }

    /// Creates a vector holding a copy of `items`.
    pub fn from_slice_in(items: &[T], alloc: A) -> Self
    where
        T: Clone,
    {
        let mut v = Self::new_in(alloc);
        v.assign(items);
        v
    }

    /// Returns a reference to the allocator.
    pub fn allocator(&self) -> &A {
        self.storage.allocator()
    }

    /// Replaces the allocator. Has no effect once a buffer is allocated.
    pub fn set_allocator(&mut self, alloc: A) {
        self.storage.set_allocator(alloc);
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for Vector<T, HeapStorage<T, A>> {
    fn clone(&self) -> Self {
        let mut out = Self::new_in(self.allocator().clone());
        if self.is_empty() {
            return out;
        }
        out.storage
            .reallocate_discard_old(self.capacity())
            .handle_alloc_error();
        out.extend(self.iter().cloned());
        out
    }
}

impl<T, S: Storage<T>> Vector<T, S> {
    /// Capacity chosen when an empty vector first grows.
    pub const INITIAL_CAPACITY: usize = 16;

    /// Wraps an existing storage; its constructed elements become the
    /// vector's contents.
    pub fn with_storage(storage: S) -> Self {
        debug_assert!(storage.invariant());
        Self {
            storage,
            _marker: PhantomData,
        }
    }

    /// Returns the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if the vector holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of slots available without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns the elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is initialized and the pointer is aligned and
        // non-null even when nothing is allocated.
        unsafe { slice::from_raw_parts(self.storage.as_ptr(), self.len()) }
    }

    /// Returns the elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len();
        // SAFETY: as for `as_slice`, and `&mut self` guarantees uniqueness.
        unsafe { slice::from_raw_parts_mut(self.storage.as_mut_ptr(), len) }
    }

    /// Returns the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn at(&self, index: usize) -> &T {
        let len = self.len();
        assert!(index < len, "index {index} out of bounds (len {len})");
        &self.as_slice()[index]
    }

    /// Returns the element at `index` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn at_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        assert!(index < len, "index {index} out of bounds (len {len})");
        &mut self.as_mut_slice()[index]
    }

    /// # Panics
    ///
    /// Panics if the vector is empty.
    pub fn front(&self) -> &T {
        assert!(!self.is_empty(), "front() on empty vector");
        self.at(0)
    }

    /// # Panics
    ///
    /// Panics if the vector is empty.
    pub fn front_mut(&mut self) -> &mut T {
        assert!(!self.is_empty(), "front_mut() on empty vector");
        self.at_mut(0)
    }

    /// # Panics
    ///
    /// Panics if the vector is empty.
    pub fn back(&self) -> &T {
        assert!(!self.is_empty(), "back() on empty vector");
        self.at(self.len() - 1)
    }

    /// # Panics
    ///
    /// Panics if the vector is empty.
    pub fn back_mut(&mut self) -> &mut T {
        assert!(!self.is_empty(), "back_mut() on empty vector");
        let last = self.len() - 1;
        self.at_mut(last)
    }

    /// Capacity to allocate so that at least `min_capacity` slots exist:
    /// at least double the current capacity, and never below
    /// [`INITIAL_CAPACITY`](Self::INITIAL_CAPACITY) when starting from zero.
    fn compute_new_capacity(&self, min_capacity: usize) -> usize {
        let c = self.capacity();
        if c == 0 {
            core::cmp::max(min_capacity, Self::INITIAL_CAPACITY)
        } else {
            core::cmp::max(min_capacity, c.saturating_mul(2))
        }
    }

    fn grow(&mut self) -> AllocResult<()> {
        debug_assert_eq!(self.len(), self.capacity());
        let c = self.capacity();
        let new_capacity = if c == 0 {
            Self::INITIAL_CAPACITY
        } else {
            match c.checked_mul(2) {
                Some(doubled) => doubled,
                None => panic!("capacity overflow"),
            }
        };
        self.storage.reallocate(new_capacity)
    }

    /// Appends `value`, growing the buffer if it is full.
    ///
    /// # Errors
    ///
    /// Returns `Err` if growing fails; the vector is unchanged and `value`
    /// is dropped.
    pub fn try_push(&mut self, value: T) -> AllocResult<()> {
        let len = self.len();
        if len == self.capacity() {
            self.grow()?;
        }
        // SAFETY: len < capacity after growing; slot `len` is free.
        unsafe {
            ptr::write(self.storage.as_mut_ptr().add(len), value);
            self.storage.set_len(len + 1);
        }
        debug_assert!(self.storage.invariant());
        Ok(())
    }

    /// Appends `value`.
    pub fn push(&mut self, value: T) {
        self.try_push(value).handle_alloc_error();
    }

    /// Appends a default-constructed element.
    pub fn push_default(&mut self)
    where
        T: Default,
    {
        self.push(T::default());
    }

    /// Removes and returns the last element.
    pub fn pop_back(&mut self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        // SAFETY: slot len - 1 is initialized and is forgotten by shrinking
        // the length before the read value is handed out.
        unsafe {
            self.storage.set_len(len - 1);
            Some(ptr::read(self.storage.as_ptr().add(len - 1)))
        }
    }

    /// Inserts `value` at `index`, shifting the tail right. Returns `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if growing fails; the vector is unchanged.
    pub fn try_insert(&mut self, index: usize, value: T) -> AllocResult<usize> {
        let len = self.len();
        assert!(index <= len, "insert index {index} out of bounds (len {len})");
        if len == self.capacity() {
            self.grow()?;
        }
        // SAFETY: capacity > len, so the buffer has room for the shifted
        // tail; the gap at `index` is filled before the length is updated.
        unsafe {
            let base = self.storage.as_mut_ptr();
            shift_right(base, index, len, 1);
            ptr::write(base.add(index), value);
            self.storage.set_len(len + 1);
        }
        debug_assert!(self.storage.invariant());
        Ok(index)
    }

    /// Inserts `value` at `index`. Returns `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) -> usize {
        self.try_insert(index, value).handle_alloc_error()
    }

    /// Inserts `n` copies of `value` at `index`. Returns `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if growing fails; the vector is unchanged.
    pub fn try_insert_n(&mut self, index: usize, n: usize, value: T) -> AllocResult<usize>
    where
        T: Clone,
    {
        let len = self.len();
        assert!(index <= len, "insert index {index} out of bounds (len {len})");
        if n == 0 {
            return Ok(index);
        }

        let required = match len.checked_add(n) {
            Some(required) => required,
            None => panic!("capacity overflow"),
        };
        if required > self.capacity() {
            let new_capacity = self.compute_new_capacity(required);
            self.storage.reallocate(new_capacity)?;
        }

        // SAFETY: capacity >= len + n. While the gap is being filled the
        // length covers only the untouched prefix, so a panicking clone leaks
        // the tail instead of exposing uninitialized slots.
        unsafe {
            let base = self.storage.as_mut_ptr();
            self.storage.set_len(index);
            shift_right(base, index, len, n);
            for i in 0..n - 1 {
                ptr::write(base.add(index + i), value.clone());
            }
            ptr::write(base.add(index + n - 1), value);
            self.storage.set_len(len + n);
        }
        debug_assert!(self.storage.invariant());
        Ok(index)
    }

    /// Inserts `n` copies of `value` at `index`. Returns `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_n(&mut self, index: usize, n: usize, value: T) -> usize
    where
        T: Clone,
    {
        self.try_insert_n(index, n, value).handle_alloc_error()
    }

    /// Removes and returns the element at `index`, shifting the tail left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.len();
        assert!(index < len, "erase index {index} out of bounds (len {len})");
        // SAFETY: index < len; the value is read out before its slot is
        // overwritten by the shifted tail.
        unsafe {
            let base = self.storage.as_mut_ptr();
            let value = ptr::read(base.add(index));
            shift_left(base, index + 1, len, 1);
            self.storage.set_len(len - 1);
            value
        }
    }

    /// Drops the element at `index`, shifting the tail left. Returns the
    /// index of the element that followed it, which equals `len` when the
    /// last element was erased.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn erase(&mut self, index: usize) -> usize {
        drop(self.remove(index));
        index
    }

    /// Drops the elements in `range`, shifting the tail left. Returns the
    /// index of the element that followed the range. An empty or inverted
    /// range erases nothing and returns `len`.
    ///
    /// # Panics
    ///
    /// Panics if `range.end > len`.
    pub fn erase_range(&mut self, range: Range<usize>) -> usize {
        let len = self.len();
        let Range { start, end } = range;
        if end <= start {
            return len;
        }
        assert!(end <= len, "erase range end {end} out of bounds (len {len})");

        let n = end - start;
        // SAFETY: `[start, end)` is initialized. The length is cut to `start`
        // first so a panicking destructor leaks instead of double-dropping.
        unsafe {
            let base = self.storage.as_mut_ptr();
            self.storage.set_len(start);
            destruct_n(base.add(start), n);
            shift_left(base, end, len, n);
            self.storage.set_len(len - n);
        }
        debug_assert!(self.storage.invariant());
        start
    }

    /// Removes the element at `index` in O(1) by moving the last element
    /// into its place. Order is not preserved.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn swap_erase(&mut self, index: usize) -> T {
        let len = self.len();
        assert!(index < len, "erase index {index} out of bounds (len {len})");
        let last = len - 1;
        // SAFETY: index and last are both initialized; after the read the
        // last slot is moved into the hole and dropped from the length.
        unsafe {
            let base = self.storage.as_mut_ptr();
            let value = ptr::read(base.add(index));
            if index != last {
                ptr::copy_nonoverlapping(base.add(last), base.add(index), 1);
            }
            self.storage.set_len(last);
            value
        }
    }

    /// Drops every element from `len` onwards.
    pub fn truncate(&mut self, len: usize) {
        let old_len = self.len();
        if len >= old_len {
            return;
        }
        // SAFETY: `[len, old_len)` is initialized and is cut off before it
        // is dropped.
        unsafe {
            self.storage.set_len(len);
            destruct_n(self.storage.as_mut_ptr().add(len), old_len - len);
        }
    }

    /// Grows with default values or shrinks to exactly `len` elements.
    pub fn resize(&mut self, len: usize)
    where
        T: Default,
    {
        let old_len = self.len();
        if len <= old_len {
            self.truncate(len);
            return;
        }
        if len > self.capacity() {
            let new_capacity = self.compute_new_capacity(len);
            self.storage.reallocate(new_capacity).handle_alloc_error();
        }
        for i in old_len..len {
            // SAFETY: i < len <= capacity and the length grows one slot at a
            // time behind the writes.
            unsafe {
                ptr::write(self.storage.as_mut_ptr().add(i), T::default());
                self.storage.set_len(i + 1);
            }
        }
    }

    /// Grows with copies of `value` or shrinks to exactly `len` elements.
    pub fn resize_with_value(&mut self, len: usize, value: T)
    where
        T: Clone,
    {
        let old_len = self.len();
        if len > old_len {
            self.insert_n(old_len, len - old_len, value);
        } else {
            self.truncate(len);
        }
    }

    /// Ensures room for at least `capacity` elements in total.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the buffer cannot be grown.
    pub fn try_reserve(&mut self, capacity: usize) -> AllocResult<()> {
        if capacity > self.capacity() {
            self.storage.reallocate(capacity)?;
        }
        Ok(())
    }

    /// Ensures room for at least `capacity` elements in total.
    pub fn reserve(&mut self, capacity: usize) {
        self.try_reserve(capacity).handle_alloc_error();
    }

    /// Moves the contents to a buffer of exactly `capacity` slots, dropping
    /// elements that do not fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.storage.reallocate(capacity).handle_alloc_error();
    }

    /// Drops all elements, keeping the buffer.
    pub fn clear(&mut self) {
        self.truncate(0);
        debug_assert!(self.storage.invariant());
    }

    /// Drops all elements and releases the buffer.
    pub fn reset(&mut self) {
        self.storage.reset();
        debug_assert!(self.storage.invariant());
    }

    /// Replaces the contents with a copy of `items`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a large enough buffer cannot be allocated; the
    /// vector is left empty.
    pub fn try_assign(&mut self, items: &[T]) -> AllocResult<()>
    where
        T: Clone,
    {
        self.clear();
        let count = items.len();
        if count > self.capacity() {
            let new_capacity = self.compute_new_capacity(count);
            self.storage.reallocate_discard_old(new_capacity)?;
        }
        for (i, item) in items.iter().enumerate() {
            // SAFETY: i < count <= capacity, length follows the writes.
            unsafe {
                ptr::write(self.storage.as_mut_ptr().add(i), item.clone());
                self.storage.set_len(i + 1);
            }
        }
        debug_assert!(self.storage.invariant());
        Ok(())
    }

    /// Replaces the contents with a copy of `items`.
    pub fn assign(&mut self, items: &[T])
    where
        T: Clone,
    {
        self.try_assign(items).handle_alloc_error();
    }

    /// Returns the index of the first element equal to `item`.
    pub fn find(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().position(|x| x == item)
    }

    /// Returns the index of the first element equal to `item` at or after
    /// `start`.
    ///
    /// # Panics
    ///
    /// Panics if `start > len`.
    pub fn index_of(&self, item: &T, start: usize) -> Option<usize>
    where
        T: PartialEq,
    {
        let len = self.len();
        assert!(start <= len, "start index {start} out of bounds (len {len})");
        self.as_slice()[start..]
            .iter()
            .position(|x| x == item)
            .map(|i| i + start)
    }
}

impl<T, S: Storage<T>> Deref for Vector<T, S> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, S: Storage<T>> DerefMut for Vector<T, S> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, S: Storage<T>> Extend<T> for Vector<T, S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let wanted = self.len().saturating_add(lower);
        if wanted > self.capacity() {
            let new_capacity = self.compute_new_capacity(wanted);
            self.storage.reallocate(new_capacity).handle_alloc_error();
        }
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: fmt::Debug, S: Storage<T>> fmt::Debug for Vector<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, S1: Storage<T>, S2: Storage<T>> PartialEq<Vector<T, S2>> for Vector<T, S1> {
    fn eq(&self, other: &Vector<T, S2>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, S: Storage<T>> Eq for Vector<T, S> {}

impl<T: PartialEq, S: Storage<T>> PartialEq<[T]> for Vector<T, S> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<'s, T, S: Storage<T>> IntoIterator for &'s Vector<T, S> {
    type Item = &'s T;
    type IntoIter = slice::Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, T, S: Storage<T>> IntoIterator for &'s mut Vector<T, S> {
    type Item = &'s mut T;
    type IntoIter = slice::IterMut<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, S: Storage<T>> IntoIterator for Vector<T, S> {
    type Item = T;
    type IntoIter = IntoIter<T, S>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.storage)
    }
}

impl<T> FromIterator<T> for Vector<T, HeapStorage<T, Global>> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = Self::new();
        v.extend(iter);
        v
    }
}
