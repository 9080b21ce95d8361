//! An intrusive red-black tree for places that can't allocate.
//!
//! Callers embed an [`RbNode`] (two pointers, nothing else) in their own structures and link
//! those into an [`RbTree`]. The tree never allocates, never recurses, and keeps no parent
//! pointers: whenever it needs to go back up, it re-descends from the root and remembers the
//! way on a fixed-size stack. Every operation is O(log n) with a statically bounded stack, so
//! it is usable from interrupt handlers and small kernel threads.
//!
//! There is no locking. A tree and its nodes must be used by one thread at a time.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

#[macro_use]
extern crate log;

mod linked;
mod node;
mod path;
mod rbtree;

pub use linked::{container_less, Linked};
pub use node::{Color, RbNode, Side};
pub use path::MAX_DEPTH;
pub use rbtree::{Containers, InvariantViolation, Iter, LessThan, RbTree};
