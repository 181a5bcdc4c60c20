use std::alloc::{self, Layout, handle_alloc_error};
use std::ptr::{self, NonNull};

use crate::block::Header;
use crate::round_up;
use crate::unit::UNIT_SIZE;

/// Fixed-capacity backing buffer, carved into allocation units.
///
/// The arena owns its bytes for the lifetime of the allocator instance and
/// hands out nothing but unit-granular views of them. All block bookkeeping
/// is done with unit indices; raw pointers only appear at the two edges
/// where memory crosses the API boundary ([`Arena::payload_ptr`] and
/// [`Arena::block_of`]).
pub(crate) struct Arena {
  base: NonNull<Header>,
  n_units: usize,
}

impl Arena {
  /// Reserves a buffer of `capacity_bytes`, rounded up to whole units.
  ///
  /// # Panics
  ///
  /// Panics if `capacity_bytes` is zero or rounds past `isize::MAX`.
  pub fn new(capacity_bytes: usize) -> Self {
    assert!(capacity_bytes > 0, "arena capacity must be non-zero");

    let n_units = round_up!(capacity_bytes, UNIT_SIZE) / UNIT_SIZE;
    let layout = Layout::from_size_align(n_units * UNIT_SIZE, UNIT_SIZE)
      .expect("arena capacity overflows a layout");

    // Safety: the layout has non-zero size.
    let raw = unsafe { alloc::alloc(layout) };

    let base = match NonNull::new(raw.cast::<Header>()) {
      Some(base) => base,
      None => handle_alloc_error(layout),
    };

    Self { base, n_units }
  }

  pub fn n_units(&self) -> usize {
    self.n_units
  }

  pub fn capacity_bytes(&self) -> usize {
    self.n_units * UNIT_SIZE
  }

  /// Raw pointer to the unit at `index`.
  fn unit_ptr(
    &self,
    index: usize,
  ) -> *mut Header {
    debug_assert!(index < self.n_units);

    // Safety: `index` stays within the `n_units`-unit allocation.
    unsafe { self.base.as_ptr().add(index) }
  }

  /// Reads the header stored in the unit at `index`.
  pub fn read_header(
    &self,
    index: usize,
  ) -> Header {
    // Safety: `unit_ptr` yields an in-bounds, unit-aligned pointer and
    // `Header` is valid for any bit pattern.
    unsafe { ptr::read(self.unit_ptr(index)) }
  }

  /// Writes `header` into the unit at `index`.
  pub fn write_header(
    &self,
    index: usize,
    header: Header,
  ) {
    // Safety: `unit_ptr` yields an in-bounds, unit-aligned pointer into
    // memory this arena owns exclusively.
    unsafe { ptr::write(self.unit_ptr(index), header) }
  }

  /// Pointer to the payload of the block starting at unit `block`: the
  /// address immediately after its header unit.
  pub fn payload_ptr(
    &self,
    block: usize,
  ) -> NonNull<u8> {
    // Safety: `unit_ptr` never returns null.
    unsafe { NonNull::new_unchecked(self.unit_ptr(block + 1).cast::<u8>()) }
  }

  /// Unit index of the block whose payload starts at `ptr`.
  ///
  /// Only meaningful for pointers previously produced by
  /// [`Arena::payload_ptr`]; anything else is a caller contract violation.
  pub fn block_of(
    &self,
    ptr: NonNull<u8>,
  ) -> usize {
    let offset = ptr.as_ptr() as usize - self.base.as_ptr() as usize;

    debug_assert!(offset % UNIT_SIZE == 0);
    debug_assert!(offset > 0 && offset < self.capacity_bytes());

    offset / UNIT_SIZE - 1
  }

  /// Whether `ptr` lies strictly inside the arena's byte range.
  ///
  /// Diagnostic only; never consulted on the allocation path.
  pub fn contains(
    &self,
    ptr: *const u8,
  ) -> bool {
    let addr = ptr as usize;
    let base = self.base.as_ptr() as usize;

    base < addr && addr < base + self.capacity_bytes()
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    let layout = Layout::from_size_align(self.n_units * UNIT_SIZE, UNIT_SIZE)
      .expect("arena capacity overflows a layout");

    // Safety: `base` came from `alloc::alloc` with this exact layout and is
    // released exactly once.
    unsafe { alloc::dealloc(self.base.as_ptr().cast::<u8>(), layout) }
  }
}
