use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::mem;

use alloc::string::String;

use allocated::{AllocResult, AllocResultExt};
use allocator_api2::alloc::{Allocator, Global};
use generic_array::ArrayLength;

use crate::vector::{FixedStorage, HeapStorage, Storage, Vector};

mod iters;
mod map;
mod node;


pub use iters::Iter;
pub use map::{Keys, MapIter, RbMap, Values};
pub use node::{Color, KeyWrapper, Node, NodeId, TreeValue};

use node::Links;

const SENTINEL: NodeId = NodeId::SENTINEL;

/// A red-black tree with nodes kept in an index arena.
///
/// Values are ordered by [`TreeValue::key`]; keys are unique. Nodes live in
/// a [`Vector`] over the storage `S`, so the tree allocates through the same
/// engines as the vector and a [`FixedRbTree`] never touches the heap.
/// Links are [`NodeId`]s into that arena, and every tree carries its own
/// sentinel node standing in for the leaves and the root's parent.
///
/// Insert, lookup and erase are O(log n).
///
/// # Examples
///
/// ```
/// use allocated_containers::{KeyWrapper, RbSet};
///
/// let mut tree = RbSet::new();
/// for k in [5, 3, 8, 1, 4, 7, 9] {
///     tree.insert(KeyWrapper(k));
/// }
///
/// let keys: Vec<_> = tree.iter().map(|v| v.0).collect();
/// assert_eq!(keys, [1, 3, 4, 5, 7, 8, 9]);
/// assert_eq!(tree.len(), 7);
/// tree.validate();
/// ```
pub struct RbTree<T, S = HeapStorage<Node<T>, Global>> {
    nodes: Vector<Node<T>, S>,
    sentinel: Links,
    root: NodeId,
}

/// A tree whose values are their own keys.
pub type RbSet<K, S = HeapStorage<Node<KeyWrapper<K>>, Global>> = RbTree<KeyWrapper<K>, S>;

/// A tree with inline room for `N` nodes.
pub type FixedRbTree<T, N> = RbTree<T, FixedStorage<Node<T>, N>>;

impl<T: TreeValue> RbTree<T, HeapStorage<Node<T>, Global>> {
    /// Creates an empty tree on the global allocator.
    pub const fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<T: TreeValue> Default for RbTree<T, HeapStorage<Node<T>, Global>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TreeValue, A: Allocator> RbTree<T, HeapStorage<Node<T>, A>> {
    /// Creates an empty tree whose nodes are allocated from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            nodes: Vector::new_in(alloc),
            sentinel: Links::sentinel(),
            root: SENTINEL,
        }
    }
}

impl<T: TreeValue, N: ArrayLength> RbTree<T, FixedStorage<Node<T>, N>> {
    /// Creates an empty tree with inline room for `N` nodes.
    pub fn new_fixed() -> Self {
        Self::with_storage(FixedStorage::new())
    }
}

impl<T: TreeValue, S: Storage<Node<T>>> RbTree<T, S> {
    /// Creates an empty tree over `storage`.
    ///
    /// # Panics
    ///
    /// Panics if `storage` already holds nodes.
    pub fn with_storage(storage: S) -> Self {
        assert!(storage.len() == 0, "tree storage must start empty");
        Self {
            nodes: Vector::with_storage(storage),
            sentinel: Links::sentinel(),
            root: SENTINEL,
        }
    }

    /// Returns the number of values in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root == SENTINEL
    }

    /// Returns the root node, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.real(self.root)
    }

    #[inline]
    fn real(&self, id: NodeId) -> Option<NodeId> {
        if id == SENTINEL {
            None
        } else {
            Some(id)
        }
    }

    #[inline]
    fn links(&self, id: NodeId) -> &Links {
        if id == SENTINEL {
            &self.sentinel
        } else {
            &self.nodes[id.slot()].links
        }
    }

    #[inline]
    fn links_mut(&mut self, id: NodeId) -> &mut Links {
        if id == SENTINEL {
            &mut self.sentinel
        } else {
            &mut self.nodes[id.slot()].links
        }
    }

    #[inline]
    fn left(&self, id: NodeId) -> NodeId {
        self.links(id).left
    }

    #[inline]
    fn right(&self, id: NodeId) -> NodeId {
        self.links(id).right
    }

    #[inline]
    fn parent(&self, id: NodeId) -> NodeId {
        self.links(id).parent
    }

    #[inline]
    fn color(&self, id: NodeId) -> Color {
        self.links(id).color
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: Color) {
        self.links_mut(id).color = color;
    }

    #[inline]
    fn key_of(&self, id: NodeId) -> &T::Key {
        self.nodes[id.slot()].value.key()
    }

    /// Returns the node behind `id`, or `None` if `id` is stale.
    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        if id == SENTINEL {
            return None;
        }
        self.nodes.get(id.slot())
    }

    /// Returns the value behind `id`, or `None` if `id` is stale.
    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.node(id).map(Node::value)
    }

    /// Mutable access for callers that keep the key unchanged.
    pub(crate) fn value_mut(&mut self, id: NodeId) -> Option<&mut T> {
        if id == SENTINEL {
            return None;
        }
        self.nodes.get_mut(id.slot()).map(|n| &mut n.value)
    }

    /// Inserts `value` unless its key is already present.
    ///
    /// Returns the node holding the key: the new node, or the existing one
    /// (in which case `value` is dropped and the tree is unchanged).
    ///
    /// # Errors
    ///
    /// Returns `Err` if the node arena cannot grow.
    pub fn try_insert(&mut self, value: T) -> AllocResult<NodeId> {
        let mut iter = self.root;
        let mut parent = SENTINEL;
        let mut go_left = false;
        while iter != SENTINEL {
            parent = iter;
            match self.key_of(iter).cmp(value.key()) {
                Ordering::Less => {
                    iter = self.right(iter);
                    go_left = false;
                }
                Ordering::Greater => {
                    iter = self.left(iter);
                    go_left = true;
                }
                Ordering::Equal => return Ok(iter),
            }
        }

        self.nodes.try_push(Node {
            links: Links::leaf(parent),
            value,
        })?;
        let new_node = NodeId::from_slot(self.nodes.len() - 1);

        if parent == SENTINEL {
            self.root = new_node;
        } else if go_left {
            self.links_mut(parent).left = new_node;
        } else {
            self.links_mut(parent).right = new_node;
        }

        self.rebalance(new_node);
        Ok(new_node)
    }

    /// Inserts `value` unless its key is already present. See
    /// [`try_insert`](Self::try_insert).
    pub fn insert(&mut self, value: T) -> NodeId {
        self.try_insert(value).handle_alloc_error()
    }

    /// Returns the node holding `key`.
    pub fn find_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut iter = self.root;
        while iter != SENTINEL {
            match self.key_of(iter).borrow().cmp(key) {
                Ordering::Less => iter = self.right(iter),
                Ordering::Greater => iter = self.left(iter),
                Ordering::Equal => return Some(iter),
            }
        }
        None
    }

    /// Returns the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).and_then(|id| self.value(id))
    }

    /// Returns `true` if a value with `key` is stored.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).is_some()
    }

    /// Removes the value under `key`. Returns the number of values removed.
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.find_node(key) {
            Some(id) => {
                drop(self.erase_node(id));
                1
            }
            None => 0,
        }
    }

    /// Removes and returns the value under `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(key).map(|id| self.erase_node(id))
    }

    /// Removes the value held by `n` and returns it.
    ///
    /// When `n` has two children its in-order successor is unlinked instead
    /// and the successor's value moves into `n`. Every [`NodeId`] obtained
    /// before the call must be treated as invalid afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `n` does not refer to a node of this tree.
    pub fn erase_node(&mut self, n: NodeId) -> T {
        assert!(
            n != SENTINEL && n.slot() < self.nodes.len(),
            "erase of a node not in this tree: {n:?}"
        );

        let to_erase = if self.left(n) == SENTINEL || self.right(n) == SENTINEL {
            n
        } else {
            let mut succ = self.right(n);
            while self.left(succ) != SENTINEL {
                succ = self.left(succ);
            }
            succ
        };

        let erase_child = if self.left(to_erase) != SENTINEL {
            self.left(to_erase)
        } else {
            self.right(to_erase)
        };

        let erase_parent = self.parent(to_erase);
        self.links_mut(erase_child).parent = erase_parent;

        if erase_parent == SENTINEL {
            self.root = erase_child;
        } else if to_erase == self.left(erase_parent) {
            self.links_mut(erase_parent).left = erase_child;
        } else {
            self.links_mut(erase_parent).right = erase_child;
        }

        if to_erase != n {
            self.swap_values(n, to_erase);
        }

        if self.color(to_erase) == Color::Black {
            self.rebalance_after_erase(erase_child);
        }

        self.sentinel = Links::sentinel();
        self.release(to_erase)
    }

    fn swap_values(&mut self, a: NodeId, b: NodeId) {
        let (lo, hi) = if a.slot() < b.slot() {
            (a.slot(), b.slot())
        } else {
            (b.slot(), a.slot())
        };
        let (head, tail) = self.nodes.split_at_mut(hi);
        mem::swap(&mut head[lo].value, &mut tail[0].value);
    }

    /// Drops an unlinked node from the arena, moving the last node into
    /// its slot and repointing that node's neighbours.
    fn release(&mut self, id: NodeId) -> T {
        let slot = id.slot();
        let last = self.nodes.len() - 1;
        let node = self.nodes.swap_erase(slot);

        if slot != last {
            let old = NodeId::from_slot(last);
            let Links {
                left,
                right,
                parent,
                ..
            } = *self.links(id);

            if parent == SENTINEL {
                self.root = id;
            } else if self.left(parent) == old {
                self.links_mut(parent).left = id;
            } else {
                self.links_mut(parent).right = id;
            }
            if left != SENTINEL {
                self.links_mut(left).parent = id;
            }
            if right != SENTINEL {
                self.links_mut(right).parent = id;
            }
        }

        node.value
    }

    /// Removes every value. The arena buffer is kept for reuse.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.sentinel = Links::sentinel();
        self.root = SENTINEL;
    }

    /// Number of nodes in the subtree rooted at `id`, counted recursively.
    pub fn subtree_size(&self, id: NodeId) -> usize {
        if id == SENTINEL {
            0
        } else {
            1 + self.subtree_size(self.left(id)) + self.subtree_size(self.right(id))
        }
    }

    /// The node with the smallest key.
    pub fn first(&self) -> Option<NodeId> {
        let mut iter = self.real(self.root)?;
        while self.left(iter) != SENTINEL {
            iter = self.left(iter);
        }
        Some(iter)
    }

    /// The node with the largest key.
    pub fn last(&self) -> Option<NodeId> {
        let mut iter = self.real(self.root)?;
        while self.right(iter) != SENTINEL {
            iter = self.right(iter);
        }
        Some(iter)
    }

    /// The in-order successor of `n`.
    pub fn find_next(&self, n: NodeId) -> Option<NodeId> {
        if n == SENTINEL {
            return None;
        }
        if self.right(n) != SENTINEL {
            let mut next = self.right(n);
            while self.left(next) != SENTINEL {
                next = self.left(next);
            }
            return Some(next);
        }

        let mut iter = n;
        let mut parent = self.parent(iter);
        while parent != SENTINEL && iter == self.right(parent) {
            iter = parent;
            parent = self.parent(iter);
        }
        self.real(parent)
    }

    /// Iterates over the values in key order.
    pub fn iter(&self) -> Iter<'_, T, S> {
        Iter::new(self, self.first(), self.len())
    }

    /// Checks every red-black invariant and returns the black height.
    ///
    /// Verifies that the root is black, red nodes have black children,
    /// children point back at their parent, keys are strictly increasing
    /// in order, every path to a leaf has the same number of black nodes
    /// and the node count matches [`len`](Self::len). Runs in O(n); meant
    /// for tests and debugging.
    ///
    /// # Panics
    ///
    /// Panics on the first violated invariant.
    pub fn validate(&self) -> usize {
        assert_eq!(self.color(self.root), Color::Black, "root must be black");
        assert_eq!(self.sentinel.color, Color::Black, "sentinel must be black");
        if self.root != SENTINEL {
            assert_eq!(self.parent(self.root), SENTINEL, "root must not have a parent");
        }
        let (count, black_height) = self.validate_node(self.root, None, None);
        assert_eq!(count, self.len(), "node count does not match len");
        black_height
    }

    fn validate_node(
        &self,
        n: NodeId,
        lower: Option<&T::Key>,
        upper: Option<&T::Key>,
    ) -> (usize, usize) {
        if n == SENTINEL {
            return (0, 1);
        }

        let Links {
            left,
            right,
            parent,
            color,
        } = *self.links(n);

        assert!(
            parent == SENTINEL || self.left(parent) == n || self.right(parent) == n,
            "{n:?} is not a child of its parent"
        );
        if left != SENTINEL {
            assert_eq!(self.parent(left), n, "left child of {n:?} has a stale parent");
        }
        if right != SENTINEL {
            assert_eq!(self.parent(right), n, "right child of {n:?} has a stale parent");
        }
        if color == Color::Red {
            assert_eq!(self.color(left), Color::Black, "red {n:?} has a red left child");
            assert_eq!(self.color(right), Color::Black, "red {n:?} has a red right child");
        }

        let key = self.key_of(n);
        if let Some(lower) = lower {
            assert!(lower < key, "keys out of order at {n:?}");
        }
        if let Some(upper) = upper {
            assert!(key < upper, "keys out of order at {n:?}");
        }

        let (left_count, left_height) = self.validate_node(left, lower, Some(key));
        let (right_count, right_height) = self.validate_node(right, Some(key), upper);
        assert_eq!(left_height, right_height, "black height differs below {n:?}");

        let own = usize::from(color == Color::Black);
        (left_count + right_count + 1, left_height + own)
    }

    /// Visits every node in pre-order with `(node, is_left_child, depth)`.
    /// `is_left_child` is `None` for the root.
    pub fn traverse<F>(&self, mut f: F)
    where
        F: FnMut(&Node<T>, Option<bool>, usize),
    {
        if self.root != SENTINEL {
            self.traverse_node(self.root, &mut f, 0);
        }
    }

    fn traverse_node<F>(&self, n: NodeId, f: &mut F, depth: usize)
    where
        F: FnMut(&Node<T>, Option<bool>, usize),
    {
        let parent = self.parent(n);
        let is_left = self.real(parent).map(|p| self.left(p) == n);
        f(&self.nodes[n.slot()], is_left, depth);

        let (left, right) = (self.left(n), self.right(n));
        if left != SENTINEL {
            self.traverse_node(left, f, depth + 1);
        }
        if right != SENTINEL {
            self.traverse_node(right, f, depth + 1);
        }
    }

    /// Renders the tree as a Graphviz digraph.
    pub fn to_dot(&self) -> String
    where
        T::Key: fmt::Debug,
    {
        let mut out = String::new();
        let written = self.write_dot(&mut out);
        debug_assert!(written.is_ok(), "formatting into a String failed");
        out
    }

    /// Writes the Graphviz digraph of [`to_dot`](Self::to_dot) into `out`.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by `out`.
    pub fn write_dot<W: fmt::Write>(&self, out: &mut W) -> fmt::Result
    where
        T::Key: fmt::Debug,
    {
        out.write_str("digraph G {\n")?;
        for (slot, node) in self.nodes.iter().enumerate() {
            let fill = match node.links.color {
                Color::Red => "red",
                Color::Black => "black",
            };
            writeln!(
                out,
                "\"n{slot}\" [label=\"{:?}\"; style=filled; fillcolor={fill}; fontcolor=white];",
                node.value.key()
            )?;
            for child in [node.links.left, node.links.right] {
                if child != SENTINEL {
                    writeln!(out, "\"n{slot}\" -> \"n{}\";", child.slot())?;
                }
            }
        }
        out.write_str("}\n")
    }

    fn rotate_left(&mut self, n: NodeId) {
        let right_child = self.right(n);
        let inner = self.left(right_child);

        self.links_mut(n).right = inner;
        if inner != SENTINEL {
            self.links_mut(inner).parent = n;
        }

        let parent = self.parent(n);
        self.links_mut(right_child).parent = parent;
        if parent == SENTINEL {
            self.root = right_child;
        } else if n == self.left(parent) {
            self.links_mut(parent).left = right_child;
        } else {
            self.links_mut(parent).right = right_child;
        }

        self.links_mut(right_child).left = n;
        self.links_mut(n).parent = right_child;
    }

    fn rotate_right(&mut self, n: NodeId) {
        let left_child = self.left(n);
        let inner = self.right(left_child);

        self.links_mut(n).left = inner;
        if inner != SENTINEL {
            self.links_mut(inner).parent = n;
        }

        let parent = self.parent(n);
        self.links_mut(left_child).parent = parent;
        if parent == SENTINEL {
            self.root = left_child;
        } else if n == self.left(parent) {
            self.links_mut(parent).left = left_child;
        } else {
            self.links_mut(parent).right = left_child;
        }

        self.links_mut(left_child).right = n;
        self.links_mut(n).parent = left_child;
    }

    fn rebalance(&mut self, new_node: NodeId) {
        debug_assert_eq!(self.color(new_node), Color::Red);

        let mut iter = new_node;
        while self.color(self.parent(iter)) == Color::Red {
            let parent = self.parent(iter);
            let grandparent = self.parent(parent);

            if parent == self.left(grandparent) {
                let uncle = self.right(grandparent);
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    iter = grandparent;
                } else {
                    if iter == self.right(parent) {
                        iter = parent;
                        self.rotate_left(iter);
                    }
                    let parent = self.parent(iter);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.left(grandparent);
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    iter = grandparent;
                } else {
                    if iter == self.left(parent) {
                        iter = parent;
                        self.rotate_right(iter);
                    }
                    let parent = self.parent(iter);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_left(grandparent);
                }
            }
        }

        let root = self.root;
        self.set_color(root, Color::Black);
    }

    fn rebalance_after_erase(&mut self, n: NodeId) {
        let mut iter = n;

        while iter != self.root && self.color(iter) == Color::Black {
            let parent = self.parent(iter);

            if iter == self.left(parent) {
                let mut sibling = self.right(parent);
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    sibling = self.right(self.parent(iter));
                }

                if self.color(self.left(sibling)) == Color::Black
                    && self.color(self.right(sibling)) == Color::Black
                {
                    self.set_color(sibling, Color::Red);
                    iter = self.parent(iter);
                } else {
                    if self.color(self.right(sibling)) == Color::Black {
                        let inner = self.left(sibling);
                        self.set_color(inner, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.right(self.parent(iter));
                    }

                    let parent = self.parent(iter);
                    let outer = self.right(sibling);
                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(outer, Color::Black);
                    self.rotate_left(parent);
                    iter = self.root;
                }
            } else {
                let mut sibling = self.left(parent);
                if self.color(sibling) == Color::Red {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    sibling = self.left(self.parent(iter));
                }

                if self.color(self.left(sibling)) == Color::Black
                    && self.color(self.right(sibling)) == Color::Black
                {
                    self.set_color(sibling, Color::Red);
                    iter = self.parent(iter);
                } else {
                    if self.color(self.left(sibling)) == Color::Black {
                        let inner = self.right(sibling);
                        self.set_color(inner, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.left(self.parent(iter));
                    }

                    let parent = self.parent(iter);
                    let outer = self.left(sibling);
                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(outer, Color::Black);
                    self.rotate_right(parent);
                    iter = self.root;
                }
            }
        }

        self.set_color(iter, Color::Black);
    }
}

impl<T: TreeValue + fmt::Debug, S: Storage<Node<T>>> fmt::Debug for RbTree<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'s, T: TreeValue, S: Storage<Node<T>>> IntoIterator for &'s RbTree<T, S> {
    type Item = &'s T;
    type IntoIter = Iter<'s, T, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: TreeValue> FromIterator<T> for RbTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        for value in iter {
            tree.insert(value);
        }
        tree
    }
}
