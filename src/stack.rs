//! A bump allocator over an inline byte buffer.
//!
//! Lets the heap-backed containers run without a system heap: the buffer
//! lives wherever the [`StackBuffer`] lives, and every [`StackAllocator`]
//! handle carves blocks off its front. Blocks are never freed individually;
//! the whole buffer is rewound with [`StackBuffer::reset`].
//!
//! ```
//! use allocated_containers::{StackBuffer, Vector};
//! use allocated_containers::typenum::U256;
//!
//! let buffer = StackBuffer::<U256>::new();
//! let mut v = Vector::new_in(buffer.allocator());
//! v.extend(0..16u64);
//! assert_eq!(buffer.used(), 128);
//! ```

use core::alloc::Layout;
use core::cell::{Cell, UnsafeCell};
use core::fmt;
use core::mem::MaybeUninit;
use core::ptr::{self, NonNull};

use allocator_api2::alloc::{AllocError, Allocator};
use generic_array::{ArrayLength, GenericArray};

/// Inline storage handed out by [`StackAllocator`].
pub struct StackBuffer<N: ArrayLength> {
    data: UnsafeCell<GenericArray<MaybeUninit<u8>, N>>,
    top: Cell<usize>,
}

impl<N: ArrayLength> StackBuffer<N> {
    /// Creates an empty buffer of `N` bytes.
    pub fn new() -> Self {
        Self {
            data: UnsafeCell::new(GenericArray::uninit()),
            top: Cell::new(0),
        }
    }

    /// A handle that allocates from this buffer.
    pub fn allocator(&self) -> StackAllocator<'_, N> {
        StackAllocator { buffer: self }
    }

    /// Size of the buffer in bytes.
    pub fn capacity(&self) -> usize {
        N::to_usize()
    }

    /// Bytes handed out so far, alignment padding included.
    pub fn used(&self) -> usize {
        self.top.get()
    }

    /// Bytes still available, before any alignment padding.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Makes the whole buffer available again.
    ///
    /// Taking `&mut self` guarantees no handle, and so no container holding
    /// blocks from this buffer, is still alive.
    pub fn reset(&mut self) {
        self.top.set(0);
    }

    fn bump(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let base = self.data.get().cast::<u8>();
        let top = self.top.get();

        // SAFETY: `top <= N`, so the result is in bounds or one past the end.
        let cursor = unsafe { base.add(top) };
        let padding = cursor.align_offset(layout.align());
        let start = top.checked_add(padding).ok_or(AllocError)?;
        let end = start.checked_add(layout.size()).ok_or(AllocError)?;
        if end > N::to_usize() {
            return Err(AllocError);
        }
        self.top.set(end);

        // SAFETY: `start <= end <= N`.
        let block = unsafe { base.add(start) };
        let block = ptr::slice_from_raw_parts_mut(block, layout.size());
        NonNull::new(block).ok_or(AllocError)
    }
}

impl<N: ArrayLength> Default for StackBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: ArrayLength> fmt::Debug for StackBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackBuffer")
            .field("capacity", &self.capacity())
            .field("used", &self.used())
            .finish()
    }
}

/// Copyable bump-allocating handle to a [`StackBuffer`].
///
/// `deallocate` is a no-op, so a container that grows repeatedly leaves its
/// old buffers behind until the [`StackBuffer`] is reset.
pub struct StackAllocator<'a, N: ArrayLength> {
    buffer: &'a StackBuffer<N>,
}

impl<N: ArrayLength> Clone for StackAllocator<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: ArrayLength> Copy for StackAllocator<'_, N> {}

impl<N: ArrayLength> fmt::Debug for StackAllocator<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StackAllocator").field(self.buffer).finish()
    }
}

// SAFETY: blocks never overlap because `top` only moves forward while any
// handle is alive, and they stay valid until the buffer is reset, which
// needs exclusive access to it.
unsafe impl<N: ArrayLength> Allocator for StackAllocator<'_, N> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.buffer.bump(layout)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}
