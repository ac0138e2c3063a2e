//! Raw element helpers shared by the storage engines and the vector.
//!
//! Every function here works on a buffer described by a base pointer and
//! the number of constructed elements. Moving an element is always a
//! bitwise relocation; only destruction is dispatched on the element type.

use core::mem;
use core::ptr;

/// Returns `true` if dropping a `T` is a no-op, so a run of them can be
/// discarded without visiting each element.
#[inline]
pub const fn has_trivial_destructor<T>() -> bool {
    !mem::needs_drop::<T>()
}

/// Drops `n` constructed elements starting at `ptr`.
///
/// # Safety
///
/// `[ptr, ptr + n)` must hold initialized values that are not used again.
#[inline]
pub unsafe fn destruct_n<T>(ptr: *mut T, n: usize) {
    if has_trivial_destructor::<T>() || n == 0 {
        return;
    }
    // SAFETY: caller guarantees the range is initialized and dead afterwards.
    unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr, n)) };
}

/// Opens a gap of `n` slots at `idx` by relocating `[idx, len)` to
/// `[idx + n, len + n)`.
///
/// When `idx + n > len` part of the tail lands past the old end; the
/// overlapping copy handles both shapes.
///
/// # Safety
///
/// `base` must be valid for `len + n` slots and `idx <= len`. The gap
/// `[idx, idx + n)` is left logically uninitialized.
#[inline]
pub unsafe fn shift_right<T>(base: *mut T, idx: usize, len: usize, n: usize) {
    debug_assert!(idx <= len);
    // SAFETY: idx <= len, so both offsets stay within the len + n slots.
    let src = unsafe { base.add(idx) };
    // SAFETY: idx + n <= len + n.
    let dst = unsafe { base.add(idx + n) };
    // SAFETY: both ranges lie inside the buffer; ptr::copy handles overlap.
    unsafe { ptr::copy(src, dst, len - idx) };
}

/// Closes a gap of `n` slots ending at `from` by relocating `[from, len)` to
/// `[from - n, len - n)`.
///
/// # Safety
///
/// `base` must be valid for `len` slots, `n <= from <= len`, and the gap
/// `[from - n, from)` must not hold live values.
#[inline]
pub unsafe fn shift_left<T>(base: *mut T, from: usize, len: usize, n: usize) {
    debug_assert!(n <= from && from <= len);
    // SAFETY: from <= len.
    let src = unsafe { base.add(from) };
    // SAFETY: from - n <= from.
    let dst = unsafe { base.add(from - n) };
    // SAFETY: both ranges lie inside the buffer; ptr::copy handles overlap.
    unsafe { ptr::copy(src, dst, len - from) };
}

/// Relocates `n` elements from `src` into the fresh buffer `dst`.
///
/// # Safety
///
/// `src` must hold `n` initialized values that are treated as moved-out
/// afterwards; `dst` must be valid for `n` writes and not overlap `src`.
#[inline]
pub unsafe fn relocate_n<T>(src: *const T, dst: *mut T, n: usize) {
    // SAFETY: forwarded from the caller.
    unsafe { ptr::copy_nonoverlapping(src, dst, n) };
}
