//! Bounded ancestor stacks.
//!
//! Nodes do not know their parents, so every algorithm that needs to walk upward
//! first walks down from the root and remembers where it has been.

use core::ptr::NonNull;

use crate::node::{RbNode, Side};

/// Address bits that alignment guarantees to be zero in a two-pointer node.
const TAG_BITS: usize = if size_of::<usize>() < 8 { 2 } else { 3 };
const POINTER_BITS: usize = 8 * size_of::<usize>();

/// The deepest a tree can ever get.
///
/// If all of memory were filled with two-pointer nodes, a red-black tree over them
/// could be at most twice as deep as a perfectly packed binary tree, plus the root.
/// That is 59 levels with 32-bit pointers and 121 with 64-bit pointers.
pub const MAX_DEPTH: usize = 2 * (POINTER_BITS - TAG_BITS - 1) + 1;

/// Room for a full root-to-leaf path plus the two extra entries removal pushes while rotating.
pub(crate) const STACK_DEPTH: usize = MAX_DEPTH + 2;

/// A root-to-node path. `is_left[i]` says whether `nodes[i]` is the left child of
/// `nodes[i - 1]`; the root is recorded as not-left.
pub(crate) struct Path {
    nodes: [NonNull<RbNode>; STACK_DEPTH],
    is_left: [bool; STACK_DEPTH],
    len: usize,
}

impl Path {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: [NonNull::dangling(); STACK_DEPTH],
            is_left: [false; STACK_DEPTH],
            len: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn top(&self) -> Option<NonNull<RbNode>> {
        self.len.checked_sub(1).map(|i| self.nodes[i])
    }

    pub(crate) fn push(&mut self, node: NonNull<RbNode>, is_left: bool) {
        debug_assert!(self.len < STACK_DEPTH, "tree deeper than MAX_DEPTH");
        self.nodes[self.len] = node;
        self.is_left[self.len] = is_left;
        self.len += 1;
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    /// The whole buffer, for the fix-up routines that track their own length.
    pub(crate) fn nodes_mut(&mut self) -> &mut [NonNull<RbNode>; STACK_DEPTH] {
        &mut self.nodes
    }

    /// Pushes `node` and then every node down its left spine. Returns the last one pushed.
    ///
    /// SAFETY: `node` and everything below it must be live tree members.
    pub(crate) unsafe fn push_left_limb(&mut self, mut node: NonNull<RbNode>, is_left: bool) -> NonNull<RbNode> {
        self.push(node, is_left);
        while let Some(left) = unsafe { node.as_ref().child(Side::Left) } {
            self.push(left, true);
            node = left;
        }
        node
    }

    /// Moves the top of the path to its in-order successor and returns it.
    /// Returns `None` (leaving the path empty) once the walk runs off the end.
    ///
    /// SAFETY: the path must describe a real root-to-node chain of live nodes.
    pub(crate) unsafe fn advance(&mut self) -> Option<NonNull<RbNode>> {
        let top = self.top()?;

        // the next node is the leftmost one in our right subtree, if we have one
        if let Some(right) = unsafe { top.as_ref().child(Side::Right) } {
            return Some(unsafe { self.push_left_limb(right, false) });
        }

        // otherwise climb past every right-child link; the parent of the first
        // left child we find hasn't been visited yet
        loop {
            let was_left = self.is_left[self.len - 1];
            self.len -= 1;
            if was_left || self.len == 0 {
                break;
            }
        }
        self.top()
    }

    /// Points the path at `target` if it is a member of the tree under `root`.
    ///
    /// Descends towards the first node that does not strictly precede `target`
    /// (checking identity on the way down), then steps through the run of nodes
    /// the comparator cannot tell apart from `target`.
    ///
    /// SAFETY: `root` must be the root of a valid tree of live nodes.
    pub(crate) unsafe fn locate<C>(&mut self, root: NonNull<RbNode>, target: NonNull<RbNode>, less_than: &C) -> bool
    where
        C: Fn(NonNull<RbNode>, NonNull<RbNode>) -> bool,
    {
        self.clear();

        let mut lower_bound = None;
        let mut cur = Some(root);
        let mut is_left = false;
        while let Some(node) = cur {
            self.push(node, is_left);
            if node == target {
                return true;
            }
            is_left = !precedes(less_than, node, target);
            if is_left {
                lower_bound = Some(self.len);
            }
            cur = unsafe { node.as_ref().child(Side::of_less(is_left)) };
        }

        let Some(len) = lower_bound else { return false };
        self.truncate(len);
        while let Some(node) = self.top() {
            if node == target {
                return true;
            }
            if precedes(less_than, target, node) {
                return false;
            }
            unsafe { self.advance() };
        }
        false
    }
}

/// `a` sorts strictly before `b`. Both plain `<` comparators and the `<=` style
/// ones that put new nodes in front of their equals agree on this.
pub(crate) fn precedes<C>(less_than: &C, a: NonNull<RbNode>, b: NonNull<RbNode>) -> bool
where
    C: Fn(NonNull<RbNode>, NonNull<RbNode>) -> bool,
{
    less_than(a, b) && !less_than(b, a)
}

/// Rotates the node on top of `stack` with its parent (the entry below it),
/// relinking the grandparent if there is one. The two stack entries trade places.
///
/// SAFETY: `stack` must hold a root-to-node chain of at least two live nodes.
pub(crate) unsafe fn rotate(stack: &mut [NonNull<RbNode>]) {
    let len = stack.len();
    debug_assert!(len >= 2);

    let parent = stack[len - 2];
    let child = stack[len - 1];
    let (p, c) = unsafe { (parent.as_ref(), child.as_ref()) };

    let side = p.side_of(child);
    let inner = c.child(side.opposite());

    if len >= 3 {
        let grandparent = unsafe { stack[len - 3].as_ref() };
        grandparent.set_child(grandparent.side_of(parent), Some(child));
    }

    c.set_child(side.opposite(), Some(parent));
    p.set_child(side, inner);

    stack[len - 2] = child;
    stack[len - 1] = parent;
}
