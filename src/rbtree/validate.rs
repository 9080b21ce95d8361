use core::fmt;
use core::ptr::NonNull;

use super::RbTree;
use crate::node::{is_red, RbNode, Side};
use crate::path::{precedes, MAX_DEPTH};

/// A broken red-black tree invariant, as found by [`RbTree::validate`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The root is red.
    RedRoot,
    /// A red node has a red child.
    RedRed { node: NonNull<RbNode> },
    /// Two root-to-nil paths cross a different number of black nodes.
    BlackHeight { expected: usize, found: usize },
    /// An in-order walk met `next` after `prev`, but the comparator puts `next` first.
    OutOfOrder { prev: NonNull<RbNode>, next: NonNull<RbNode> },
    /// Some path is longer than [`MAX_DEPTH`](crate::MAX_DEPTH).
    TooDeep,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RedRoot => write!(f, "the root is red"),
            Self::RedRed { node } => write!(f, "red node {node:p} has a red child"),
            Self::BlackHeight { expected, found } => {
                write!(f, "black height mismatch (expected {expected}, found {found})")
            }
            Self::OutOfOrder { prev, next } => write!(f, "{next:p} sorts before {prev:p} but comes after it"),
            Self::TooDeep => write!(f, "tree is deeper than {MAX_DEPTH}"),
        }
    }
}

impl core::error::Error for InvariantViolation {}

impl<C> RbTree<C>
where
    C: Fn(NonNull<RbNode>, NonNull<RbNode>) -> bool,
{
    /// Checks every red-black invariant and the ordering of the members, returning the tree's
    /// black height (nil links excluded).
    ///
    /// Walks the whole tree, so it is O(n); meant for tests and debugging. Like everything else
    /// it runs on a fixed-size stack instead of recursing.
    pub fn validate(&self) -> Result<usize, InvariantViolation> {
        let Some(root) = self.root else { return Ok(0) };
        // SAFETY: members are live.
        if unsafe { !root.as_ref().is_black() } {
            return Err(InvariantViolation::RedRoot);
        }

        // (node, black nodes from the root down to and including it, depth)
        let mut stack = [(NonNull::<RbNode>::dangling(), 0usize, 0usize); MAX_DEPTH];
        let mut len = 0;
        let mut expected = None;
        let mut prev: Option<NonNull<RbNode>> = None;

        let mut check_nil = |blacks: usize| match expected {
            None => {
                expected = Some(blacks);
                Ok(())
            }
            Some(expected) if expected == blacks => Ok(()),
            Some(expected) => Err(InvariantViolation::BlackHeight { expected, found: blacks }),
        };

        let mut cur = Some(root);
        let mut above = 0;
        let mut depth = 0;
        loop {
            // go down the left spine, checking colors on the way
            while let Some(node) = cur {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(InvariantViolation::TooDeep);
                }
                let n = unsafe { node.as_ref() };
                if !n.is_black() && unsafe { is_red(n.child(Side::Left)) || is_red(n.child(Side::Right)) } {
                    return Err(InvariantViolation::RedRed { node });
                }
                above += usize::from(n.is_black());
                stack[len] = (node, above, depth);
                len += 1;
                cur = n.child(Side::Left);
            }

            // `above` counts the blacks over the nil we just reached
            check_nil(above)?;

            let Some(top) = len.checked_sub(1) else { break };
            len = top;
            let (node, blacks, node_depth) = stack[top];

            if let Some(prev) = prev {
                if precedes(&self.less_than, node, prev) {
                    return Err(InvariantViolation::OutOfOrder { prev, next: node });
                }
            }
            prev = Some(node);

            above = blacks;
            depth = node_depth;
            cur = unsafe { node.as_ref().child(Side::Right) };
        }

        Ok(expected.unwrap_or(0))
    }
}
