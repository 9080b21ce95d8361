use core::ptr::NonNull;

use super::RbTree;
use crate::node::{is_red, Color, RbNode, Side};
use crate::path::rotate;

impl<C> RbTree<C>
where
    C: Fn(NonNull<RbNode>, NonNull<RbNode>) -> bool,
{
    /// Removes `node` from the tree.
    ///
    /// Afterwards the node's links are unspecified, and it may be inserted again (into this
    /// or any other tree). Removing a node that is not a member leaves the tree untouched.
    ///
    /// # Safety
    ///
    /// `node` must be live, and all members must still satisfy the requirements of
    /// [`insert`](RbTree::insert).
    pub unsafe fn remove(&mut self, node: NonNull<RbNode>) {
        let Some(root) = self.root else {
            warn!("remove: {node:p} is not in this (empty) tree");
            return;
        };

        // SAFETY: `root` heads a valid tree of live members.
        if !unsafe { self.path.locate(root, node, &self.less_than) } {
            warn!("remove: {node:p} is not a member of this tree");
            return;
        }

        let mut len = self.path.len();
        let stack = self.path.nodes_mut();

        // SAFETY: everything on the stack is a live member, and so is `node`.
        unsafe {
            let n = node.as_ref();

            // we can only unlink a node with at most one child, so swap a node with two
            // children with its in-order predecessor first
            if let (Some(left), Some(right)) = (n.child(Side::Left), n.child(Side::Right)) {
                let node_len = len;
                let hiparent = if len > 1 { Some(stack[len - 2]) } else { None };

                let mut pred = left;
                stack[len] = pred;
                len += 1;
                while let Some(next) = pred.as_ref().child(Side::Right) {
                    pred = next;
                    stack[len] = pred;
                    len += 1;
                }
                let loparent = stack[len - 2];
                let p = pred.as_ref();

                match hiparent {
                    Some(hiparent) => {
                        let hiparent = hiparent.as_ref();
                        hiparent.set_child(hiparent.side_of(node), Some(pred));
                    }
                    None => self.root = Some(pred),
                }

                if loparent == node {
                    n.set_child(Side::Left, p.child(Side::Left));
                    p.set_child(Side::Left, Some(node));
                } else {
                    let lp = loparent.as_ref();
                    lp.set_child(lp.side_of(pred), Some(node));
                    n.set_child(Side::Left, p.child(Side::Left));
                    p.set_child(Side::Left, Some(left));
                }

                // the predecessor has no right child
                p.set_child(Side::Right, Some(right));
                n.set_child(Side::Right, None);

                stack.swap(node_len - 1, len - 1);

                let pred_color = p.color();
                p.set_color(n.color());
                n.set_color(pred_color);
            }

            debug_assert!(n.child(Side::Left).is_none() || n.child(Side::Right).is_none());
            let child = n.child(Side::Left).or(n.child(Side::Right));

            if len < 2 {
                // removing the root
                self.root = child;
                match child {
                    Some(child) => child.as_ref().set_color(Color::Black),
                    None => self.max_depth = 0,
                }
                trace!("removed {node:p} (was the root)");
                return;
            }

            let parent = stack[len - 2].as_ref();
            match child {
                // a childless black node stays in place while the rotations run; the fix-up
                // unlinks it once nothing needs it any more
                None if n.is_black() => fix_missing_black(stack, len, Some(node)),
                // red leaves can just be dropped
                None => parent.set_child(parent.side_of(node), None),
                Some(child) => {
                    parent.set_child(parent.side_of(node), Some(child));

                    // in a valid tree at least one of the two is black; if the other one is red
                    // painting the child black restores the black height
                    debug_assert!(n.is_black() || child.as_ref().is_black(), "both nodes red");
                    if !n.is_black() || !child.as_ref().is_black() {
                        child.as_ref().set_color(Color::Black);
                    } else {
                        stack[len - 1] = child;
                        fix_missing_black(stack, len, None);
                    }
                }
            }

            // we may have rotated something new up into the root
            self.root = Some(stack[0]);
        }
        trace!("removed {node:p}");
    }
}

/// Repairs the black node on top of the stack, whose subtree is one black short of its
/// sibling's, working upward.
///
/// `null_node`, if given, is the node being removed. It still sits in the tree so the rotations
/// have something to work with, and gets unlinked once the rebalancing is done.
///
/// SAFETY: `stack[..len]` must be a root-to-node chain of live nodes, with room for two more
/// entries after it.
unsafe fn fix_missing_black(stack: &mut [NonNull<RbNode>], mut len: usize, null_node: Option<NonNull<RbNode>>) {
    unsafe {
        while len > 1 {
            let n = stack[len - 1];
            let mut parent = stack[len - 2];
            let n_side = parent.as_ref().side_of(n);
            debug_assert!(n.as_ref().is_black());

            let Some(mut sib) = parent.as_ref().child(n_side.opposite()) else {
                error!("Tree corruption detected: black node {n:p} has no sibling under {parent:p}");
                return;
            };

            // make sure the sibling is black, by rotating it above the parent if it isn't
            // (which pushes `n` one level further down)
            if !sib.as_ref().is_black() {
                stack[len - 1] = sib;
                rotate(&mut stack[..len]);
                parent.as_ref().set_color(Color::Red);
                sib.as_ref().set_color(Color::Black);
                stack[len] = n;
                len += 1;

                parent = stack[len - 2];
                let Some(new_sib) = parent.as_ref().child(n_side.opposite()) else {
                    error!("Tree corruption detected: black node {n:p} lost its sibling under {parent:p}");
                    return;
                };
                sib = new_sib;
            }

            // a sibling with only black children is easy: paint it red
            let s = sib.as_ref();
            if !is_red(s.child(Side::Left)) && !is_red(s.child(Side::Right)) {
                if Some(n) == null_node {
                    parent.as_ref().set_child(n_side, None);
                }
                s.set_color(Color::Red);
                if parent.as_ref().is_black() {
                    // now the parent's whole subtree is one black short, so go again one level up
                    len -= 1;
                    continue;
                }
                // a red parent can absorb it
                parent.as_ref().set_color(Color::Black);
                return;
            }

            // the sibling has a red child; get it onto the far side from `n`
            let mut outer = s.child(n_side.opposite());
            if !is_red(outer) {
                let Some(inner) = s.child(n_side) else {
                    error!("Tree corruption detected: sibling {sib:p} lost its red child");
                    return;
                };
                stack[len - 1] = sib;
                stack[len] = inner;
                len += 1;
                rotate(&mut stack[..len]);
                s.set_color(Color::Red);
                inner.as_ref().set_color(Color::Black);

                // put `n` back on top and look at the new sibling
                sib = stack[len - 2];
                outer = sib.as_ref().child(n_side.opposite());
                stack[len - 2] = n;
                len -= 1;
            }

            // finally, the far child is red: rotate the sibling above the parent and recolor
            let Some(outer) = outer else {
                error!("Tree corruption detected: sibling {sib:p} has no outer child");
                return;
            };
            sib.as_ref().set_color(parent.as_ref().color());
            parent.as_ref().set_color(Color::Black);
            outer.as_ref().set_color(Color::Black);
            stack[len - 1] = sib;
            rotate(&mut stack[..len]);
            if Some(n) == null_node {
                parent.as_ref().set_child(n_side, None);
            }
            return;
        }
    }
}
