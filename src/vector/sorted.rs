//! Flat ordered maps kept in a [`Vector`].
//!
//! Lookups are binary searches over contiguous `(key, value)` pairs, which
//! beats a node-based tree for small maps that are read far more often
//! than they are modified. [`SortedVector`] keeps one pair per key;
//! [`SortedMultiMap`] keeps every pair, grouped by key in insertion order.

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::ops::Range;

use allocated::{AllocResult, AllocResultExt};
use allocator_api2::alloc::{Allocator, Global};
use generic_array::ArrayLength;

use super::fixed::FixedStorage;
use super::storage::{HeapStorage, Storage};
use super::Vector;

/// Ordered map stored as a sorted run of `(K, V)` pairs with unique keys.
///
/// ```
/// use allocated_containers::SortedVector;
///
/// let mut map = SortedVector::new();
/// map.insert(3, "c");
/// map.insert(1, "a");
/// assert_eq!(map.insert(3, "C"), (1, false));
///
/// assert_eq!(map.get(&3), Some(&"c"));
/// assert_eq!(map.as_slice(), &[(1, "a"), (3, "c")]);
/// ```
pub struct SortedVector<K, V, S = HeapStorage<(K, V), Global>> {
    inner: Vector<(K, V), S>,
}

/// A [`SortedVector`] with inline storage for `N` pairs.
pub type FixedSortedVector<K, V, N> = SortedVector<K, V, FixedStorage<(K, V), N>>;

impl<K: Ord, V> SortedVector<K, V> {
    /// Creates an empty map on the global allocator.
    pub const fn new() -> Self {
        Self {
            inner: Vector::new(),
        }
    }
}

impl<K: Ord, V> Default for SortedVector<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V, A: Allocator> SortedVector<K, V, HeapStorage<(K, V), A>> {
    /// Creates an empty map that allocates from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            inner: Vector::new_in(alloc),
        }
    }

    /// Builds a map from unordered pairs. When a key repeats, the first
    /// occurrence wins.
    pub fn from_iter_in<I: IntoIterator<Item = (K, V)>>(iter: I, alloc: A) -> Self {
        let mut inner = Vector::new_in(alloc);
        inner.extend(iter);
        Self::from_unsorted(inner)
    }
}

impl<K: Ord, V, N: ArrayLength> SortedVector<K, V, FixedStorage<(K, V), N>> {
    /// Creates an empty map with inline storage.
    pub fn new_fixed() -> Self {
        Self {
            inner: Vector::<(K, V), FixedStorage<(K, V), N>>::new_fixed(),
        }
    }
}

impl<K: Ord, V, S: Storage<(K, V)>> SortedVector<K, V, S> {
    fn from_unsorted(mut inner: Vector<(K, V), S>) -> Self {
        // Stable, so the first of equal keys stays in front.
        inner.sort_by(|a, b| a.0.cmp(&b.0));
        if inner.len() > 1 {
            // `[0, write]` holds the kept pairs; duplicates are swapped past
            // it and dropped together by the final truncate.
            let mut write = 0;
            for read in 1..inner.len() {
                if inner[read].0 != inner[write].0 {
                    write += 1;
                    inner.swap(write, read);
                }
            }
            inner.truncate(write + 1);
        }
        let map = Self { inner };
        debug_assert!(map.invariant());
        map
    }

    /// Returns the number of pairs.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of pairs the storage holds without growing.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Returns the pairs in key order.
    pub fn as_slice(&self) -> &[(K, V)] {
        self.inner.as_slice()
    }

    /// Iterates over the pairs in key order.
    pub fn iter(&self) -> core::slice::Iter<'_, (K, V)> {
        self.inner.iter()
    }

    /// Removes every pair.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Index of the first pair whose key is not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.partition_point(|(k, _)| k.borrow() < key)
    }

    /// Index of the first pair whose key is greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.partition_point(|(k, _)| k.borrow() <= key)
    }

    /// Returns the index of the pair with `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let i = self.lower_bound(key);
        match self.inner.get(i) {
            Some((k, _)) if k.borrow().cmp(key) == Ordering::Equal => Some(i),
            _ => None,
        }
    }

    /// Returns the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|i| &self.inner[i].1)
    }

    /// Returns the value stored under `key` mutably.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|i| &mut self.inner[i].1)
    }

    /// Inserts `(key, value)` at its ordered position.
    ///
    /// Returns the index of the pair under `key` and whether it was newly
    /// inserted. An existing key is left untouched and `value` is dropped.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the storage cannot grow.
    pub fn try_insert(&mut self, key: K, value: V) -> AllocResult<(usize, bool)> {
        let i = self.lower_bound(&key);
        if let Some((k, _)) = self.inner.get(i) {
            if *k == key {
                return Ok((i, false));
            }
        }
        let i = self.inner.try_insert(i, (key, value))?;
        debug_assert!(self.invariant());
        Ok((i, true))
    }

    /// Inserts `(key, value)` at its ordered position. See [`try_insert`](Self::try_insert).
    pub fn insert(&mut self, key: K, value: V) -> (usize, bool) {
        self.try_insert(key, value).handle_alloc_error()
    }

    /// Removes the pair at `index`, returning the index of the next pair.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn erase_at(&mut self, index: usize) -> usize {
        self.inner.erase(index)
    }

    /// Removes the pair under `key`. Returns the number of pairs removed.
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.find(key) {
            Some(i) => {
                self.inner.erase(i);
                debug_assert!(self.invariant());
                1
            }
            None => 0,
        }
    }

    /// Removes and returns the pair under `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|i| self.inner.remove(i))
    }

    fn invariant(&self) -> bool {
        self.inner.windows(2).all(|w| w[0].0 < w[1].0)
    }
}

/// Ordered multimap stored as a sorted run of `(K, V)` pairs.
///
/// Pairs with equal keys sit next to each other in the order they were
/// inserted, so [`equal_range`](Self::equal_range) is a contiguous slice.
///
/// ```
/// use allocated_containers::SortedMultiMap;
///
/// let mut map = SortedMultiMap::new();
/// map.insert(2, "b");
/// map.insert(1, "a");
/// map.insert(2, "B");
///
/// assert_eq!(map.equal_range(&2), 1..3);
/// assert_eq!(map.get_all(&2), &[(2, "b"), (2, "B")]);
/// assert_eq!(map.find_value(&"B", 0..map.len()), Some(2));
/// ```
pub struct SortedMultiMap<K, V, S = HeapStorage<(K, V), Global>> {
    inner: Vector<(K, V), S>,
}

/// A [`SortedMultiMap`] with inline storage for `N` pairs.
pub type FixedSortedMultiMap<K, V, N> = SortedMultiMap<K, V, FixedStorage<(K, V), N>>;

impl<K: Ord, V> SortedMultiMap<K, V> {
    /// Creates an empty multimap on the global allocator.
    pub const fn new() -> Self {
        Self {
            inner: Vector::new(),
        }
    }
}

impl<K: Ord, V> Default for SortedMultiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V, A: Allocator> SortedMultiMap<K, V, HeapStorage<(K, V), A>> {
    /// Creates an empty multimap that allocates from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            inner: Vector::new_in(alloc),
        }
    }

    /// Builds a multimap from unordered pairs, keeping every pair. Pairs
    /// with equal keys keep their relative order.
    pub fn from_iter_in<I: IntoIterator<Item = (K, V)>>(iter: I, alloc: A) -> Self {
        let mut inner = Vector::new_in(alloc);
        inner.extend(iter);
        inner.sort_by(|a, b| a.0.cmp(&b.0));
        Self { inner }
    }
}

impl<K: Ord, V, N: ArrayLength> SortedMultiMap<K, V, FixedStorage<(K, V), N>> {
    /// Creates an empty multimap with inline storage.
    pub fn new_fixed() -> Self {
        Self {
            inner: Vector::<(K, V), FixedStorage<(K, V), N>>::new_fixed(),
        }
    }
}

impl<K: Ord, V, S: Storage<(K, V)>> SortedMultiMap<K, V, S> {
    /// Returns the number of pairs.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the multimap is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of pairs the storage holds without growing.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Returns the pairs in key order.
    pub fn as_slice(&self) -> &[(K, V)] {
        self.inner.as_slice()
    }

    /// Iterates over the pairs in key order.
    pub fn iter(&self) -> core::slice::Iter<'_, (K, V)> {
        self.inner.iter()
    }

    /// Removes every pair.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Index of the first pair whose key is not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.partition_point(|(k, _)| k.borrow() < key)
    }

    /// Index of the first pair whose key is greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.partition_point(|(k, _)| k.borrow() <= key)
    }

    /// Indices of all pairs under `key`. Empty, positioned where `key`
    /// would be inserted, if there are none.
    pub fn equal_range<Q>(&self, key: &Q) -> Range<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lower_bound(key)..self.upper_bound(key)
    }

    /// Returns the index of the first pair under `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let range = self.equal_range(key);
        if range.is_empty() {
            None
        } else {
            Some(range.start)
        }
    }

    /// Returns the number of pairs under `key`.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.equal_range(key).len()
    }

    /// Returns every pair under `key`, in insertion order.
    pub fn get_all<Q>(&self, key: &Q) -> &[(K, V)]
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let range = self.equal_range(key);
        &self.inner[range]
    }

    /// Returns the index of the first pair in `range` whose value equals
    /// `value`. This is a linear scan.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    pub fn find_value(&self, value: &V, range: Range<usize>) -> Option<usize>
    where
        V: PartialEq,
    {
        let start = range.start;
        self.inner[range]
            .iter()
            .position(|(_, v)| v == value)
            .map(|i| start + i)
    }

    /// Inserts `(key, value)` after every pair already under `key`.
    /// Returns its index.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the storage cannot grow.
    pub fn try_insert(&mut self, key: K, value: V) -> AllocResult<usize> {
        let i = self.upper_bound(&key);
        let i = self.inner.try_insert(i, (key, value))?;
        debug_assert!(self.invariant());
        Ok(i)
    }

    /// Inserts `(key, value)` after every pair already under `key`.
    /// Returns its index.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        self.try_insert(key, value).handle_alloc_error()
    }

    /// Removes the pair at `index`, returning the index of the next pair.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn erase_at(&mut self, index: usize) -> usize {
        self.inner.erase(index)
    }

    /// Removes every pair under `key`. Returns the number removed.
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let range = self.equal_range(key);
        let removed = range.len();
        self.inner.erase_range(range);
        debug_assert!(self.invariant());
        removed
    }

    fn invariant(&self) -> bool {
        self.inner.windows(2).all(|w| w[0].0 <= w[1].0)
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SortedMultiMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_iter_in(iter, Global)
    }
}

impl<'s, K, V, S: Storage<(K, V)>> IntoIterator for &'s SortedMultiMap<K, V, S> {
    type Item = &'s (K, V);
    type IntoIter = core::slice::Iter<'s, (K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SortedVector<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_iter_in(iter, Global)
    }
}

impl<'s, K, V, S: Storage<(K, V)>> IntoIterator for &'s SortedVector<K, V, S> {
    type Item = &'s (K, V);
    type IntoIter = core::slice::Iter<'s, (K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
