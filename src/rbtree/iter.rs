use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;

use super::RbTree;
use crate::linked::Linked;
use crate::node::RbNode;
use crate::path::Path;

/// In-order iterator over the members of an [`RbTree`], lowest first.
///
/// Walks the tree without recursing, keeping its position in the tree's own traversal stack.
/// That is also why it borrows the tree mutably: the tree cannot change under a walk.
/// Code holding only a shared borrow can still use [`RbTree::get_min`], [`RbTree::get_max`]
/// and [`RbTree::contains`].
pub struct Iter<'a> {
    path: &'a mut Path,
    root: Option<NonNull<RbNode>>,
    state: State,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Walking,
    Done,
}

impl<'a> Iter<'a> {
    pub(super) fn new(path: &'a mut Path, root: Option<NonNull<RbNode>>) -> Self {
        path.clear();
        Self { path, root, state: State::Fresh }
    }
}

impl Iterator for Iter<'_> {
    type Item = NonNull<RbNode>;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the path only ever holds live members of the borrowed tree.
        let next = match self.state {
            State::Done => None,
            State::Fresh => self.root.map(|root| unsafe { self.path.push_left_limb(root, false) }),
            State::Walking => unsafe { self.path.advance() },
        };
        self.state = if next.is_some() { State::Walking } else { State::Done };
        next
    }
}

impl FusedIterator for Iter<'_> {}

/// Like [`Iter`], but yields the structures the nodes are embedded in.
pub struct Containers<'a, T: Linked + ?Sized> {
    inner: Iter<'a>,
    _marker: PhantomData<fn() -> NonNull<T>>,
}

impl<T: Linked + ?Sized> Iterator for Containers<'_, T> {
    type Item = NonNull<T>;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: `RbTree::iter_containers` made the caller promise every member lives in a `T`.
        self.inner.next().map(|node| unsafe { T::from_links(node) })
    }
}

impl<T: Linked + ?Sized> FusedIterator for Containers<'_, T> {}

impl<C> RbTree<C> {
    /// Walks the tree in order without recursing.
    pub fn iter(&mut self) -> Iter<'_> {
        Iter::new(&mut self.path, self.root)
    }

    /// Walks the tree in order, yielding the `T` each node is embedded in.
    ///
    /// # Safety
    ///
    /// Every member of the tree must be the [`Linked::links`] of a live `T`.
    pub unsafe fn iter_containers<T: Linked + ?Sized>(&mut self) -> Containers<'_, T> {
        Containers { inner: self.iter(), _marker: PhantomData }
    }

    /// Calls `visit` on every member, in order.
    pub fn walk(&mut self, visit: impl FnMut(NonNull<RbNode>)) {
        self.iter().for_each(visit);
    }
}

impl<'a, C> IntoIterator for &'a mut RbTree<C> {
    type Item = NonNull<RbNode>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
