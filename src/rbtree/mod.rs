use core::fmt;
use core::ptr::NonNull;

use crate::node::{RbNode, Side};
use crate::path::{precedes, Path};

mod insert;
mod iter;
mod remove;
mod validate;

#[cfg(test)]
mod tests;

pub use iter::{Containers, Iter};
pub use validate::InvariantViolation;

/// A red-black tree comparison predicate.
///
/// Returns `true` if node `a` sorts strictly before node `b`. During insertion the new node
/// is always `a` and the resident node is `b`, so a comparator can (carefully) use this to put
/// new nodes after their equals (plain `<`, FIFO order) or in front of them (`<=`, LIFO order).
pub type LessThan = fn(NonNull<RbNode>, NonNull<RbNode>) -> bool;

/// An intrusive red-black tree.
///
/// The tree owns nothing but the shape of the links between its members: nodes live inside
/// caller structures, and the tree just threads [`RbNode`] links through them. No operation
/// allocates, recurses, or takes more than O(log n) steps.
///
/// There is no parent pointer in a node, so any time an algorithm needs to walk back up the
/// tree it re-descends from the root and keeps the ancestors on a fixed-size stack. The tree
/// carries one such stack, sized for the deepest tree that could fit in memory ([`MAX_DEPTH`]).
///
/// Dropping the tree does not touch its members. Freeing them is up to the caller.
///
/// [`MAX_DEPTH`]: crate::MAX_DEPTH
pub struct RbTree<C = LessThan> {
    root: Option<NonNull<RbNode>>,
    less_than: C,
    /// Longest root-to-leaf path recorded since the tree was last empty.
    max_depth: usize,
    path: Path,
}

/// SAFETY: the tree only holds addresses of nodes that the caller promised stay valid while they
///         are members, and all access to them goes through `&mut self` or `&self` on the tree.
unsafe impl<C: Send> Send for RbTree<C> {}

impl<C> RbTree<C> {
    /// Creates an empty tree ordered by `less_than`.
    pub const fn new(less_than: C) -> Self {
        Self {
            root: None,
            less_than,
            max_depth: 0,
            path: Path::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<NonNull<RbNode>> {
        self.root
    }

    /// The longest root-to-leaf path (in nodes) any insertion has produced since the tree was
    /// last empty. Never exceeds [`MAX_DEPTH`](crate::MAX_DEPTH).
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Forgets every member in O(1), without visiting them.
    ///
    /// The former members' links are left as they were, which is to say unspecified.
    pub fn clear(&mut self) {
        self.root = None;
        self.max_depth = 0;
    }

    /// Returns the lowest-sorted member of the tree.
    pub fn get_min(&self) -> Option<NonNull<RbNode>> {
        self.extreme(Side::Left)
    }

    /// Returns the highest-sorted member of the tree.
    pub fn get_max(&self) -> Option<NonNull<RbNode>> {
        self.extreme(Side::Right)
    }

    fn extreme(&self, side: Side) -> Option<NonNull<RbNode>> {
        let mut node = self.root?;
        // SAFETY: every member is live for as long as it is in the tree (see `insert`).
        while let Some(next) = unsafe { node.as_ref().child(side) } {
            node = next;
        }
        Some(node)
    }
}

impl<C> RbTree<C>
where
    C: Fn(NonNull<RbNode>, NonNull<RbNode>) -> bool,
{
    /// Returns true if `node` is a member of the tree.
    ///
    /// This compares addresses: it never dereferences `node` itself (though the comparator
    /// may), and it tells apart members that compare equal, so the tree can be used as a
    /// set of node identities.
    pub fn contains(&self, node: NonNull<RbNode>) -> bool {
        let mut cur = self.root;
        while let Some(resident) = cur {
            if resident == node {
                return true;
            }
            let side = if precedes(&self.less_than, resident, node) {
                Side::Right
            } else if precedes(&self.less_than, node, resident) {
                Side::Left
            } else {
                // an equal but different node: ours could be on either side of it
                return self.scan_equals(node);
            };
            // SAFETY: members are live.
            cur = unsafe { resident.as_ref().child(side) };
        }
        false
    }

    #[cold]
    fn scan_equals(&self, node: NonNull<RbNode>) -> bool {
        let Some(root) = self.root else { return false };
        let mut path = Path::new();
        // SAFETY: `root` heads a valid tree of live members.
        unsafe { path.locate(root, node, &self.less_than) }
    }
}

impl<C> fmt::Debug for RbTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RbTree")
            .field("root", &self.root)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
