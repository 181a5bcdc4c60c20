use crate::arena::Arena;
use crate::block::{Header, NIL};

/// Address-ordered free list threaded through the arena's own units.
///
/// Each free block stores its [`Header`] in its first unit; the list links
/// blocks by unit index, sorted strictly by ascending start address. The
/// ordering is what lets deallocation coalesce against immediate neighbours
/// only, without a global scan.
///
/// This type holds only the list head and the running unit totals; the
/// blocks themselves live in the [`Arena`] passed into every operation.
pub(crate) struct FreeList {
  head: usize,
  free_units: usize,
  free_units_min: usize,
}

impl FreeList {
  /// Starts with the entire arena as a single free block.
  pub fn new(arena: &Arena) -> Self {
    let n_units = arena.n_units();

    arena.write_header(0, Header::new(NIL, n_units));

    Self {
      head: 0,
      free_units: n_units,
      free_units_min: n_units,
    }
  }

  /// Current total of free units across all blocks. Diagnostic only.
  pub fn free_units(&self) -> usize {
    self.free_units
  }

  /// Lowest value [`FreeList::free_units`] has ever reached.
  pub fn min_free_units(&self) -> usize {
    self.free_units_min
  }

  /// First-fit search for a block of at least `units` units.
  ///
  /// On success the returned block is off the list and its header `len`
  /// records exactly how many units it consumed (which may exceed `units`
  /// by one when a 1-unit remainder was absorbed).
  pub fn take_first_fit(
    &mut self,
    arena: &Arena,
    units: usize,
  ) -> Option<usize> {
    debug_assert!(units >= 2, "a block needs a header unit plus payload");

    let mut prev = NIL;
    let mut curr = self.head;

    while curr != NIL {
      match Self::split(arena, curr, units) {
        Some(rest) => {
          if prev == NIL {
            self.head = rest;
          } else {
            let mut header = arena.read_header(prev);
            header.next = rest;
            arena.write_header(prev, header);
          }

          let consumed = arena.read_header(curr).len;
          self.free_units -= consumed;
          self.free_units_min = self.free_units_min.min(self.free_units);

          return Some(curr);
        }
        None => {
          prev = curr;
          curr = arena.read_header(curr).next;
        }
      }
    }

    None
  }

  /// Returns the block at `block` to the list, coalescing with physical
  /// neighbours. Its header `len` must still hold the count recorded when
  /// the block was carved.
  pub fn release(
    &mut self,
    arena: &Arena,
    block: usize,
  ) {
    let len = arena.read_header(block).len;

    arena.write_header(block, Header::new(NIL, len));
    self.free_units += len;

    if self.head == NIL {
      self.head = block;
      return;
    }

    if block < self.head {
      Self::concat(arena, block, self.head);
      self.head = block;
      return;
    }

    // Invariant: curr < block for the whole walk.
    let mut curr = self.head;

    loop {
      let next = arena.read_header(curr).next;

      if next == NIL {
        break;
      }

      if block < next {
        Self::concat(arena, block, next);
        Self::concat(arena, curr, block);
        return;
      }

      curr = next;
    }

    Self::concat(arena, curr, block);
  }

  /// Snapshot of `(start_unit, len_units)` for every free block, in address
  /// order. Diagnostic only.
  pub fn extents(
    &self,
    arena: &Arena,
  ) -> Vec<(usize, usize)> {
    let mut extents = Vec::new();
    let mut curr = self.head;

    while curr != NIL {
      let header = arena.read_header(curr);
      extents.push((curr, header.len));
      curr = header.next;
    }

    extents
  }

  /// Carves `units` units out of the free block at `at`.
  ///
  /// Returns the list continuation that replaces `at`, or `None` when the
  /// block is too small. A remainder of exactly one unit cannot hold a
  /// header plus payload, so it is absorbed into the allocation instead of
  /// being left on the list as an unusable fragment.
  fn split(
    arena: &Arena,
    at: usize,
    units: usize,
  ) -> Option<usize> {
    let header = arena.read_header(at);

    if header.len == units || header.len == units + 1 {
      Some(header.next)
    } else if header.len > units {
      let tail = at + units;

      arena.write_header(tail, Header::new(header.next, header.len - units));
      arena.write_header(at, Header::new(NIL, units));

      Some(tail)
    } else {
      None
    }
  }

  /// Merges or links two free blocks known to be in ascending order.
  ///
  /// Physically contiguous blocks collapse into one; otherwise `rear` is
  /// linked after `front` to keep the address ordering.
  fn concat(
    arena: &Arena,
    front: usize,
    rear: usize,
  ) {
    debug_assert!(front < rear);

    let mut header = arena.read_header(front);

    if front + header.len == rear {
      let rear_header = arena.read_header(rear);
      header.len += rear_header.len;
      header.next = rear_header.next;
    } else {
      header.next = rear;
    }

    arena.write_header(front, header);
  }
}
