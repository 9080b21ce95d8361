use core::cell::Cell;
use core::fmt;
use core::ptr::{self, NonNull};

/// Which child slot of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// The side a node goes to when `less` says it sorts before the node it was compared against.
    pub(crate) const fn of_less(less: bool) -> Self {
        if less { Side::Left } else { Side::Right }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Set in the left child slot when the node is black.
const BLACK_BIT: usize = 1;

/// Intrusive red-black tree linkage.
///
/// Embed this in your own type and hand its address to an [`RbTree`](crate::RbTree).
/// It is exactly two pointers wide: there is no parent pointer, and the node color
/// lives in the low bit of the left child pointer, which is always free because of
/// alignment.
///
/// The contents are only meaningful while the node is a member of a tree. A node
/// that was never inserted (or has been removed) holds unspecified links.
#[repr(C)]
pub struct RbNode {
    children: [Cell<*mut RbNode>; 2],
}

// the tag bit has to be free in every node address
const _: () = assert!(align_of::<RbNode>() > BLACK_BIT);
const _: () = assert!(size_of::<RbNode>() == 2 * size_of::<usize>());

/// SAFETY: the links are plain addresses. They are only ever dereferenced by the tree
///         that owns them, and a tree (plus all of its nodes) is used by one thread at a time.
unsafe impl Send for RbNode {}

impl RbNode {
    pub const fn new() -> Self {
        Self {
            children: [Cell::new(ptr::null_mut()), Cell::new(ptr::null_mut())],
        }
    }

    /// The child on `side`, with the color tag stripped off.
    pub fn child(&self, side: Side) -> Option<NonNull<RbNode>> {
        let raw = self.children[side as usize].get();
        NonNull::new(raw.map_addr(|addr| addr & !BLACK_BIT))
    }

    pub fn is_black(&self) -> bool {
        self.children[Side::Left as usize].get().addr() & BLACK_BIT != 0
    }

    pub fn color(&self) -> Color {
        if self.is_black() { Color::Black } else { Color::Red }
    }

    /// Replaces the child on `side`, keeping the color tag intact.
    pub(crate) fn set_child(&self, side: Side, child: Option<NonNull<RbNode>>) {
        let slot = &self.children[side as usize];
        let tag = slot.get().addr() & BLACK_BIT;
        let raw = child.map_or(ptr::null_mut(), NonNull::as_ptr);
        slot.set(raw.map_addr(|addr| addr | tag));
    }

    pub(crate) fn set_color(&self, color: Color) {
        let slot = &self.children[Side::Left as usize];
        let raw = slot.get();
        slot.set(match color {
            Color::Black => raw.map_addr(|addr| addr | BLACK_BIT),
            Color::Red => raw.map_addr(|addr| addr & !BLACK_BIT),
        });
    }

    /// Which side of `self` holds `child`. Anything that is not the right child counts as left.
    pub(crate) fn side_of(&self, child: NonNull<RbNode>) -> Side {
        if self.child(Side::Right) == Some(child) { Side::Right } else { Side::Left }
    }

    /// Detaches both children and paints the node black.
    pub(crate) fn reset(&self) {
        self.children[Side::Left as usize].set(ptr::null_mut::<RbNode>().map_addr(|addr| addr | BLACK_BIT));
        self.children[Side::Right as usize].set(ptr::null_mut());
    }
}

impl Default for RbNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RbNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RbNode")
            .field("left", &self.child(Side::Left))
            .field("right", &self.child(Side::Right))
            .field("color", &self.color())
            .finish()
    }
}

/// Nil links count as black.
///
/// SAFETY: `link` must be `None` or point to a live node.
pub(crate) unsafe fn is_red(link: Option<NonNull<RbNode>>) -> bool {
    link.is_some_and(|node| unsafe { !node.as_ref().is_black() })
}
