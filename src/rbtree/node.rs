use core::fmt;

/// Colour of a red-black tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// Red node; its children are black.
    Red,
    /// Black node; counts towards the black height.
    Black,
}

/// Handle to a node of an [`RbTree`](super::RbTree).
///
/// Handles are only valid until the next erase on the same tree: erasing
/// a node with two children moves its successor's value into it, and the
/// freed arena slot is refilled by relocating the last node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The per-tree sentinel standing in for every leaf and the root's parent.
    pub(crate) const SENTINEL: NodeId = NodeId(0);

    #[inline]
    pub(crate) const fn from_slot(slot: usize) -> Self {
        NodeId(slot + 1)
    }

    /// Arena index. Must not be called on the sentinel.
    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == NodeId::SENTINEL {
            write!(f, "NodeId(sentinel)")
        } else {
            write!(f, "NodeId({})", self.slot())
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Links {
    pub(crate) left: NodeId,
    pub(crate) right: NodeId,
    pub(crate) parent: NodeId,
    pub(crate) color: Color,
}

impl Links {
    /// Black and pointing at itself on every side.
    pub(crate) const fn sentinel() -> Self {
        Links {
            left: NodeId::SENTINEL,
            right: NodeId::SENTINEL,
            parent: NodeId::SENTINEL,
            color: Color::Black,
        }
    }

    pub(crate) const fn leaf(parent: NodeId) -> Self {
        Links {
            left: NodeId::SENTINEL,
            right: NodeId::SENTINEL,
            parent,
            color: Color::Red,
        }
    }
}

/// A tree node: links, colour and the payload.
pub struct Node<T> {
    pub(crate) links: Links,
    pub(crate) value: T,
}

impl<T> Node<T> {
    /// The stored value.
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// The node's colour.
    #[inline]
    pub fn color(&self) -> Color {
        self.links.color
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("value", &self.value)
            .field("color", &self.links.color)
            .field("left", &self.links.left)
            .field("right", &self.links.right)
            .field("parent", &self.links.parent)
            .finish()
    }
}

/// Extracts the ordering key from a value stored in an [`RbTree`](super::RbTree).
pub trait TreeValue {
    /// Key type; keys are unique within a tree.
    type Key: Ord;

    /// Returns the key of this value.
    fn key(&self) -> &Self::Key;
}

/// A value that is its own key, used by [`RbSet`](super::RbSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyWrapper<K>(pub K);

impl<K: Ord> TreeValue for KeyWrapper<K> {
    type Key = K;

    #[inline]
    fn key(&self) -> &K {
        &self.0
    }
}

impl<K: Ord, V> TreeValue for (K, V) {
    type Key = K;

    #[inline]
    fn key(&self) -> &K {
        &self.0
    }
}
