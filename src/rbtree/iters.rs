use core::iter::FusedIterator;

use crate::vector::Storage;

use super::{Node, NodeId, RbTree, TreeValue};

/// In-order iterator over the values of an [`RbTree`].
pub struct Iter<'s, T, S> {
    tree: &'s RbTree<T, S>,
    next: Option<NodeId>,
    remaining: usize,
}

impl<'s, T: TreeValue, S: Storage<Node<T>>> Iter<'s, T, S> {
    pub(super) fn new(tree: &'s RbTree<T, S>, first: Option<NodeId>, len: usize) -> Self {
        Self {
            tree,
            next: first,
            remaining: len,
        }
    }
}

impl<'s, T: TreeValue, S: Storage<Node<T>>> Iterator for Iter<'s, T, S> {
    type Item = &'s T;

    fn next(&mut self) -> Option<&'s T> {
        let id = self.next?;
        self.next = self.tree.find_next(id);
        self.remaining -= 1;
        self.tree.value(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'s, T: TreeValue, S: Storage<Node<T>>> ExactSizeIterator for Iter<'s, T, S> {}

impl<'s, T: TreeValue, S: Storage<Node<T>>> FusedIterator for Iter<'s, T, S> {}

impl<'s, T, S> Clone for Iter<'s, T, S> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            next: self.next,
            remaining: self.remaining,
        }
    }
}
