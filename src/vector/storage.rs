//! Storage engines backing [`Vector`](super::Vector).
//!
//! A storage owns a buffer of `capacity` slots of which the prefix
//! `[0, len)` is constructed. The vector never touches memory directly; it
//! asks the storage to grow, and the storage decides how (or whether) that
//! is possible.

use core::alloc::Layout;
use core::cmp;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;

use allocated::{AllocResult, AllocatorExt};
use allocator_api2::alloc::{Allocator, Global};

use crate::common::{destruct_n, relocate_n};

/// Raw memory management for a resizable, type-homogeneous array.
///
/// # Safety
///
/// Implementations must guarantee that `as_ptr()` is valid for `capacity()`
/// slots of `T`, that `[0, len())` is initialized, and that
/// `len() <= capacity()` after every call.
pub unsafe trait Storage<T> {
    /// Pointer to the first slot. Dangling but aligned when nothing is allocated.
    fn as_ptr(&self) -> *const T;

    /// Mutable pointer to the first slot.
    fn as_mut_ptr(&mut self) -> *mut T;

    /// Number of constructed elements.
    fn len(&self) -> usize;

    /// Number of allocated slots.
    fn capacity(&self) -> usize;

    /// Sets the number of constructed elements.
    ///
    /// # Safety
    ///
    /// `len <= capacity()` and `[0, len)` must be initialized.
    unsafe fn set_len(&mut self, len: usize);

    /// Moves the buffer to one of `new_capacity` slots, keeping the first
    /// `min(len, new_capacity)` elements and dropping the rest.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the new buffer cannot be allocated; the storage is
    /// left untouched.
    fn reallocate(&mut self, new_capacity: usize) -> AllocResult<()>;

    /// Replaces the buffer with an empty one of `new_capacity` slots,
    /// dropping all elements.
    ///
    /// # Panics
    ///
    /// Panics if `new_capacity <= capacity()`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the new buffer cannot be allocated; the storage is
    /// left untouched.
    fn reallocate_discard_old(&mut self, new_capacity: usize) -> AllocResult<()>;

    /// Drops all elements and releases the buffer.
    fn reset(&mut self);

    /// Returns `true` if `len <= capacity`.
    fn invariant(&self) -> bool {
        self.len() <= self.capacity()
    }
}

/// Growable storage that obtains its buffer from an [`Allocator`].
///
/// The allocator is held by value. The buffer is allocated lazily on the
/// first growth and released on drop or [`Storage::reset`].
pub struct HeapStorage<T, A: Allocator = Global> {
    ptr: NonNull<T>,
    len: usize,
    capacity: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

// SAFETY: HeapStorage uniquely owns its elements, like `Vec<T, A>`.
unsafe impl<T: Send, A: Allocator + Send> Send for HeapStorage<T, A> {}
// SAFETY: shared access only hands out `&T` and `&A`.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for HeapStorage<T, A> {}

impl<T> HeapStorage<T, Global> {
    /// Creates an empty storage using the global allocator.
    pub const fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T> Default for HeapStorage<T, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> HeapStorage<T, A> {
    /// Creates an empty storage that will allocate from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            capacity: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Replaces the allocator. Ignored unless the storage owns no buffer.
    pub fn set_allocator(&mut self, alloc: A) {
        if self.capacity == 0 || mem::size_of::<T>() == 0 {
            self.alloc = alloc;
        }
    }

    /// # Panics
    ///
    /// Panics with `capacity overflow` if `capacity` slots of `T` exceed
    /// `isize::MAX` bytes.
    fn allocate_buffer(&self, capacity: usize) -> AllocResult<NonNull<T>> {
        let Ok(layout) = Layout::array::<T>(capacity) else {
            panic!("capacity overflow");
        };
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        Ok(self.alloc.allocate_array::<T>(capacity)?.into_inner())
    }

    /// Frees the current buffer without touching its elements.
    ///
    /// # Safety
    ///
    /// The elements must already be dropped or relocated.
    unsafe fn release_buffer(&mut self) {
        if self.capacity == 0 || mem::size_of::<T>() == 0 {
            return;
        }
        // SAFETY: `ptr` came from `allocate_array` on `self.alloc` with
        // `capacity` slots.
        unsafe { self.alloc.deallocate_array(self.ptr, self.capacity) };
    }
}

// SAFETY: `ptr` is valid for `capacity` slots (or dangling for zero-sized
// layouts) and `len <= capacity` is maintained by every method.
unsafe impl<T, A: Allocator> Storage<T> for HeapStorage<T, A> {
    #[inline]
    fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity);
        self.len = len;
    }

    fn reallocate(&mut self, new_capacity: usize) -> AllocResult<()> {
        let new_ptr = self.allocate_buffer(new_capacity)?;
        let new_len = cmp::min(self.len, new_capacity);

        // SAFETY: the new buffer holds new_capacity >= new_len slots and is
        // distinct from the old one; the surplus tail is dropped exactly once
        // and the old buffer is released after everything was moved out.
        unsafe {
            relocate_n(self.ptr.as_ptr(), new_ptr.as_ptr(), new_len);
            destruct_n(self.ptr.as_ptr().add(new_len), self.len - new_len);
            self.release_buffer();
        }

        self.ptr = new_ptr;
        self.len = new_len;
        self.capacity = new_capacity;
        debug_assert!(self.invariant());
        Ok(())
    }

    fn reallocate_discard_old(&mut self, new_capacity: usize) -> AllocResult<()> {
        assert!(
            new_capacity > self.capacity,
            "reallocate_discard_old must grow the buffer"
        );
        let new_ptr = self.allocate_buffer(new_capacity)?;

        // SAFETY: `[0, len)` is initialized and discarded here.
        unsafe {
            destruct_n(self.ptr.as_ptr(), self.len);
            self.release_buffer();
        }

        self.ptr = new_ptr;
        self.len = 0;
        self.capacity = new_capacity;
        debug_assert!(self.invariant());
        Ok(())
    }

    fn reset(&mut self) {
        let len = self.len;
        self.len = 0;
        // SAFETY: `[0, len)` was initialized; len is zeroed first so a
        // panicking destructor cannot cause a double drop.
        unsafe {
            destruct_n(self.ptr.as_ptr(), len);
            self.release_buffer();
        }
        self.ptr = NonNull::dangling();
        self.capacity = 0;
    }
}

impl<T, A: Allocator> Drop for HeapStorage<T, A> {
    fn drop(&mut self) {
        self.reset();
    }
}
