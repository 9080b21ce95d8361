//! Embedding [`RbNode`]s in your own types.

use core::ptr::NonNull;

use crate::node::RbNode;

/// A type with an [`RbNode`] embedded in it.
///
/// This is the bridge between a tree, which only deals in node addresses, and the structures
/// those nodes live in. Usually implemented with [`impl_linked!`](crate::impl_linked):
///
/// ```ignore
/// struct Timer {
///     deadline: u64,
///     node: RbNode,
/// }
///
/// impl_linked!(Timer, node);
/// ```
///
/// # Safety
///
/// `from_links(links(p))` must give back `p` for every `p`, and `links(p)` must point inside the
/// allocation `p` points to (with provenance over all of it).
pub unsafe trait Linked {
    /// The node embedded in `this`.
    ///
    /// # Safety
    ///
    /// `this` must point to a live `Self`.
    unsafe fn links(this: NonNull<Self>) -> NonNull<RbNode>;

    /// The structure `links` is embedded in.
    ///
    /// # Safety
    ///
    /// `links` must have come from [`Linked::links`] on a live `Self`.
    unsafe fn from_links(links: NonNull<RbNode>) -> NonNull<Self>;
}

/// Implements [`Linked`] for a struct by naming its [`RbNode`] field.
#[macro_export]
macro_rules! impl_linked {
    ($ty:ty, $field:ident) => {
        unsafe impl $crate::Linked for $ty {
            unsafe fn links(this: ::core::ptr::NonNull<Self>) -> ::core::ptr::NonNull<$crate::RbNode> {
                // SAFETY: the field lies inside the live value `this` points to.
                unsafe { this.byte_add(::core::mem::offset_of!($ty, $field)).cast() }
            }

            unsafe fn from_links(links: ::core::ptr::NonNull<$crate::RbNode>) -> ::core::ptr::NonNull<Self> {
                // SAFETY: `links` was derived from a `Self`, so backing up to its start stays in bounds.
                unsafe { links.byte_sub(::core::mem::offset_of!($ty, $field)).cast() }
            }
        }
    };
}

/// Builds a comparator that orders nodes by the [`Ord`] of the structures they live in.
///
/// # Safety
///
/// The comparator dereferences whatever it is given, so every node it is ever called with
/// (every member of the tree it is handed to, plus every node passed to `insert`, `remove` or
/// `contains` on that tree) must be the [`Linked::links`] of a live `T`.
pub unsafe fn container_less<T: Linked + Ord>() -> impl Fn(NonNull<RbNode>, NonNull<RbNode>) -> bool + Copy {
    |a, b| unsafe { T::from_links(a).as_ref() < T::from_links(b).as_ref() }
}
