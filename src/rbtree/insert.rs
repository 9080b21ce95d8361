use core::ptr::NonNull;

use super::RbTree;
use crate::node::{is_red, Color, RbNode, Side};
use crate::path::rotate;

impl<C> RbTree<C>
where
    C: Fn(NonNull<RbNode>, NonNull<RbNode>) -> bool,
{
    /// Inserts `node` into the tree.
    ///
    /// Never fails and never allocates. Nodes that compare equal to existing members are
    /// accepted and placed after them, unless the comparator says otherwise (see [`LessThan`]).
    ///
    /// # Safety
    ///
    /// - `node` must not already be a member of this or any other tree.
    /// - `node` must stay valid, and must not move, until it is removed or the tree is cleared
    ///   or dropped.
    /// - Nobody else may touch the node's links while it is a member.
    ///
    /// [`LessThan`]: super::LessThan
    pub unsafe fn insert(&mut self, node: NonNull<RbNode>) {
        let less_than = &self.less_than;
        let root = &mut self.root;
        let max_depth = &mut self.max_depth;
        let path = &mut self.path;
        // SAFETY: the caller hands us a live node, and every member is live.
        unsafe {
            let new = node.as_ref();
            new.reset();

            let Some(mut cur) = *root else {
                *root = Some(node);
                *max_depth = 1;
                trace!("inserted {node:p} as the root");
                return;
            };

            path.clear();
            let mut is_left = false;
            loop {
                path.push(cur, is_left);
                let side = Side::of_less(less_than(node, cur));
                match cur.as_ref().child(side) {
                    Some(next) => {
                        cur = next;
                        is_left = side == Side::Left;
                    }
                    None => {
                        cur.as_ref().set_child(side, Some(node));
                        path.push(node, side == Side::Left);
                        break;
                    }
                }
            }
            new.set_color(Color::Red);

            let depth = path.len();
            if depth > *max_depth {
                *max_depth = depth;
                debug!("tree depth grew to {depth}");
            }

            let stack = path.nodes_mut();
            fix_extra_red(stack, depth);

            // we may have rotated something new up into the root
            *root = Some(stack[0]);
            debug_assert!(stack[0].as_ref().is_black());
        }
        trace!("inserted {node:p} at depth {}", path.len());
    }
}

/// Repairs a red node (on top of the stack) sitting under a red parent, working upward.
///
/// SAFETY: `stack[..len]` must be the root-to-node chain of the freshly colored red node.
unsafe fn fix_extra_red(stack: &mut [NonNull<RbNode>], mut len: usize) {
    unsafe {
        while len > 1 {
            let node = stack[len - 1];
            let parent = stack[len - 2];
            debug_assert!(!is_red(node.as_ref().child(Side::Left)));
            debug_assert!(!is_red(node.as_ref().child(Side::Right)));

            if parent.as_ref().is_black() {
                return;
            }

            // a red parent is never the root, so there is a grandparent
            let grandparent = stack[len - 3].as_ref();
            let side = grandparent.side_of(parent);
            let aunt = grandparent.child(side.opposite());

            if is_red(aunt) {
                grandparent.set_color(Color::Red);
                parent.as_ref().set_color(Color::Black);
                if let Some(aunt) = aunt {
                    aunt.as_ref().set_color(Color::Black);
                }
                // the grandparent is red now, and might have a red parent of its own
                len -= 2;
                continue;
            }

            // a local rotation fixes everything: first get the node onto the same side of its
            // parent as the parent is of the grandparent
            if parent.as_ref().side_of(node) != side {
                rotate(&mut stack[..len]);
            }

            // then rotate the parent over the grandparent, swapping their colors
            rotate(&mut stack[..len - 1]);
            stack[len - 3].as_ref().set_color(Color::Black);
            stack[len - 2].as_ref().set_color(Color::Red);
            return;
        }

        // we climbed all the way to the root, which must be black
        stack[0].as_ref().set_color(Color::Black);
    }
}
