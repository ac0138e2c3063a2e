//! Allocator-aware containers for `no_std` targets.
//!
//! This crate provides a growable array and an ordered tree whose memory
//! comes from a pluggable storage engine:
//!
//! - [`Vector`] - A contiguous array with amortised O(1) `push`
//! - [`RbTree`] - A red-black tree kept in an index arena, with [`RbSet`]
//!   and [`RbMap`] on top
//! - [`SortedVector`] - A flat ordered map for small, read-mostly data
//! - [`SortedMultiMap`] - The same layout with duplicate keys allowed
//!
//! # Quick Start
//!
//! ```
//! use allocated_containers::{RbMap, Vector};
//!
//! let mut v = Vector::new();
//! v.push(1);
//! v.push(2);
//! v.insert(0, 0);
//! assert_eq!(v.as_slice(), &[0, 1, 2]);
//!
//! let mut map = RbMap::new();
//! map.insert(2, "two");
//! map.insert(1, "one");
//! assert_eq!(map.get(&2), Some(&"two"));
//! assert_eq!(map.len(), 2);
//! ```
//!
//! # Storage
//!
//! Every container is generic over a [`Storage`] engine:
//!
//! - [`HeapStorage<T, A>`] - Grows through any [`allocator_api2`] allocator.
//!   The default is the global heap; a [`StackAllocator`] carves blocks out
//!   of an inline [`StackBuffer`] instead.
//! - [`FixedStorage<T, N>`] - An inline buffer of `N` slots (a `typenum`
//!   length). It never allocates, and needing more room is fatal.
//!
//! ```
//! use allocated_containers::{FixedRbTree, KeyWrapper};
//! use allocated_containers::typenum::U8;
//!
//! let mut tree = FixedRbTree::<KeyWrapper<u32>, U8>::new_fixed();
//! for k in [3, 1, 2] {
//!     tree.insert(KeyWrapper(k));
//! }
//! assert!(tree.contains(&2));
//! ```
//!
//! # Allocation Failure
//!
//! Methods that may allocate come in pairs. The `try_` form returns an
//! [`AllocErrorWithLayout`] and leaves the container untouched; the plain
//! form calls [`AllocResultExt::handle_alloc_error`] and so treats failure as
//! fatal, like the standard collections. A capacity whose byte size
//! overflows `isize` panics in both forms.
//!
//! ```
//! use allocated_containers::{AllocErrorWithLayout, StackBuffer, Vector};
//! use allocated_containers::typenum::U64;
//! use core::alloc::Layout;
//!
//! let buffer = StackBuffer::<U64>::new();
//! let mut v = Vector::<u64, _>::new_in(buffer.allocator());
//! let err = v.try_push(1).unwrap_err();
//! assert_eq!(err, AllocErrorWithLayout::from(Layout::array::<u64>(16).unwrap()));
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(any(feature = "std", test))]
extern crate std;

extern crate alloc;

mod common;
/// Red-black tree over an index arena.
///
/// This module provides [`rbtree::RbTree`] and the [`rbtree::RbMap`] wrapper.
/// Nodes are addressed by [`rbtree::NodeId`] rather than pointers, so a tree
/// can be moved freely and stored in any [`Storage`].
pub mod rbtree;
pub mod stack;
/// Contiguous growable arrays and their storage engines.
pub mod vector;

pub use allocated::{AllocErrorWithLayout, AllocResult, AllocResultExt};
pub use generic_array::typenum;
pub use rbtree::{Color, FixedRbTree, KeyWrapper, NodeId, RbMap, RbSet, RbTree, TreeValue};
pub use stack::{StackAllocator, StackBuffer};
pub use vector::sorted::{FixedSortedMultiMap, FixedSortedVector, SortedMultiMap, SortedVector};
pub use vector::{FixedStorage, FixedVector, HeapStorage, Storage, Vector};
