use std::mem;

/// Unit index marking the end of the free list (and the "no block" value
/// for any link field).
pub(crate) const NIL: usize = usize::MAX;

/// Record occupying the first unit of every free block in the arena.
///
/// `len` counts the units the block spans, this header unit included. The
/// value stays in place while the block is allocated (the caller only ever
/// sees the units after it), so deallocation can recover the block size by
/// stepping back one unit from the payload.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Header {
  /// Unit index of the next free block in ascending-address order, or [`NIL`].
  pub next: usize,
  /// Units spanned by this block, header unit included.
  pub len: usize,
}

// One allocation unit is exactly one header, sized and aligned to the
// platform's maximum natural alignment.
const _: () = assert!(mem::size_of::<Header>() == mem::align_of::<Header>());

impl Header {
  pub fn new(
    next: usize,
    len: usize,
  ) -> Self {
    Self { next, len }
  }
}
