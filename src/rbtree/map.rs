use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::mem;

use allocated::{AllocResult, AllocResultExt};
use allocator_api2::alloc::{Allocator, Global};
use generic_array::ArrayLength;

use crate::vector::{FixedStorage, HeapStorage, Storage};

use super::{Iter, Node, RbTree};

/// An ordered map on top of [`RbTree`].
///
/// Unlike the bare tree, inserting an existing key replaces its value.
///
/// ```
/// use allocated_containers::RbMap;
///
/// let mut map = RbMap::new();
/// assert_eq!(map.insert("b", 2), None);
/// assert_eq!(map.insert("a", 1), None);
/// assert_eq!(map.insert("b", 20), Some(2));
///
/// assert_eq!(map.get(&"b"), Some(&20));
/// assert!(map.keys().copied().eq(["a", "b"]));
/// ```
pub struct RbMap<K, V, S = HeapStorage<Node<(K, V)>, Global>> {
    tree: RbTree<(K, V), S>,
}

impl<K: Ord, V> RbMap<K, V> {
    /// Creates an empty map on the global allocator.
    pub const fn new() -> Self {
        Self {
            tree: RbTree::new(),
        }
    }
}

impl<K: Ord, V> Default for RbMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V, A: Allocator> RbMap<K, V, HeapStorage<Node<(K, V)>, A>> {
    /// Creates an empty map whose nodes are allocated from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            tree: RbTree::new_in(alloc),
        }
    }
}

impl<K: Ord, V, N: ArrayLength> RbMap<K, V, FixedStorage<Node<(K, V)>, N>> {
    /// Creates an empty map with inline room for `N` entries.
    pub fn new_fixed() -> Self {
        Self::with_storage(FixedStorage::new())
    }
}

impl<K: Ord, V, S: Storage<Node<(K, V)>>> RbMap<K, V, S> {
    /// Creates an empty map over `storage`.
    pub fn with_storage(storage: S) -> Self {
        Self {
            tree: RbTree::with_storage(storage),
        }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &RbTree<(K, V), S> {
        &self.tree
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Removes every entry, keeping the node arena.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the node arena cannot grow.
    pub fn try_insert(&mut self, key: K, value: V) -> AllocResult<Option<V>> {
        if let Some(id) = self.tree.find_node(&key) {
            if let Some(slot) = self.tree.value_mut(id) {
                return Ok(Some(mem::replace(&mut slot.1, value)));
            }
        }
        self.tree.try_insert((key, value))?;
        Ok(None)
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.try_insert(key, value).handle_alloc_error()
    }

    /// Returns the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key).map(|(_, v)| v)
    }

    /// Returns the value stored under `key` mutably.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.tree.find_node(key)?;
        self.tree.value_mut(id).map(|(_, v)| v)
    }

    /// Returns `true` if the map has an entry for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains(key)
    }

    /// Removes `key` and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key).map(|(_, v)| v)
    }

    /// The entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let id = self.tree.first()?;
        self.tree.value(id).map(|(k, v)| (k, v))
    }

    /// The entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let id = self.tree.last()?;
        self.tree.value(id).map(|(k, v)| (k, v))
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> MapIter<'_, K, V, S> {
        MapIter {
            inner: self.tree.iter(),
        }
    }

    /// Iterates over the keys in order.
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys {
            inner: self.tree.iter(),
        }
    }

    /// Iterates over the values in key order.
    pub fn values(&self) -> Values<'_, K, V, S> {
        Values {
            inner: self.tree.iter(),
        }
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug, S: Storage<Node<(K, V)>>> fmt::Debug for RbMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RbMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<'s, K: Ord, V, S: Storage<Node<(K, V)>>> IntoIterator for &'s RbMap<K, V, S> {
    type Item = (&'s K, &'s V);
    type IntoIter = MapIter<'s, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of an [`RbMap`].
pub struct MapIter<'s, K, V, S> {
    inner: Iter<'s, (K, V), S>,
}

impl<'s, K: Ord, V, S: Storage<Node<(K, V)>>> Iterator for MapIter<'s, K, V, S> {
    type Item = (&'s K, &'s V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'s, K: Ord, V, S: Storage<Node<(K, V)>>> ExactSizeIterator for MapIter<'s, K, V, S> {}
impl<'s, K: Ord, V, S: Storage<Node<(K, V)>>> FusedIterator for MapIter<'s, K, V, S> {}

/// Iterator over the keys of an [`RbMap`].
pub struct Keys<'s, K, V, S> {
    inner: Iter<'s, (K, V), S>,
}

impl<'s, K: Ord, V, S: Storage<Node<(K, V)>>> Iterator for Keys<'s, K, V, S> {
    type Item = &'s K;

    fn next(&mut self) -> Option<&'s K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'s, K: Ord, V, S: Storage<Node<(K, V)>>> ExactSizeIterator for Keys<'s, K, V, S> {}

/// Iterator over the values of an [`RbMap`].
pub struct Values<'s, K, V, S> {
    inner: Iter<'s, (K, V), S>,
}

impl<'s, K: Ord, V, S: Storage<Node<(K, V)>>> Iterator for Values<'s, K, V, S> {
    type Item = &'s V;

    fn next(&mut self) -> Option<&'s V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'s, K: Ord, V, S: Storage<Node<(K, V)>>> ExactSizeIterator for Values<'s, K, V, S> {}
