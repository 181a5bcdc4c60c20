use std::alloc::{GlobalAlloc, Layout};
use std::error::Error;
use std::fmt;
use std::ptr::{self, NonNull};

use spin::Mutex;

use crate::arena::Arena;
use crate::freelist::FreeList;
use crate::unit::{UNIT_SIZE, units_for, units_to_bytes};

/// No free block in the arena is large enough to satisfy the request.
///
/// The engine never retries or backs off; whether to fall back to another
/// allocator, propagate, or abort is the caller's decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str("arena out of memory")
  }
}

impl Error for AllocError {}

/// Fixed-capacity memory resource serving variable-sized requests.
///
/// The resource owns a single arena and an address-ordered free list
/// threaded through it. Allocation is first-fit with block splitting;
/// deallocation reinserts in address order and coalesces with physical
/// neighbours. A spinlock serializes every mutation of the list, so a
/// shared instance is safe to use from multiple threads.
pub struct VariableResource {
  arena: Arena,
  state: Mutex<FreeList>,
}

impl VariableResource {
  /// Creates a resource backed by `capacity_bytes` of memory, rounded up to
  /// whole allocation units. The entire arena starts as one free block.
  ///
  /// # Panics
  ///
  /// Panics if `capacity_bytes` is zero.
  pub fn new(capacity_bytes: usize) -> Self {
    let arena = Arena::new(capacity_bytes);
    let state = Mutex::new(FreeList::new(&arena));

    Self { arena, state }
  }

  /// Serves `layout` from the first free block large enough to hold it.
  ///
  /// The returned pointer is aligned to the unit alignment (the platform's
  /// maximum natural alignment); requests for anything stricter fail, as
  /// does exhaustion of the arena.
  pub fn allocate(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>, AllocError> {
    if layout.align() > UNIT_SIZE {
      return Err(AllocError);
    }

    let units = units_for(layout.size()) + 1;

    let block = self
      .state
      .lock()
      .take_first_fit(&self.arena, units)
      .ok_or(AllocError)?;

    Ok(self.arena.payload_ptr(block))
  }

  /// Returns an allocation to the arena.
  ///
  /// # Safety
  ///
  /// `ptr` must have been returned by [`VariableResource::allocate`] on this
  /// same instance and must not have been deallocated since. Anything else
  /// is undefined behavior, exactly as with the standard allocator traits.
  pub unsafe fn deallocate(
    &self,
    ptr: NonNull<u8>,
    _layout: Layout,
  ) {
    debug_assert!(self.contains(ptr.as_ptr()));

    let block = self.arena.block_of(ptr);

    self.state.lock().release(&self.arena, block);
  }

  /// Whether `other` is this very instance.
  ///
  /// Allocations are never interchangeable between instances, so equality
  /// is identity.
  pub fn is_equal(
    &self,
    other: &VariableResource,
  ) -> bool {
    ptr::eq(self, other)
  }

  /// Total capacity of the arena in bytes (a whole number of units).
  pub fn capacity(&self) -> usize {
    self.arena.capacity_bytes()
  }

  /// Current total of free bytes across all free blocks. Diagnostic only.
  pub fn free_bytes(&self) -> usize {
    units_to_bytes(self.state.lock().free_units())
  }

  /// Lowest value [`VariableResource::free_bytes`] has ever reached.
  pub fn min_free_bytes(&self) -> usize {
    units_to_bytes(self.state.lock().min_free_units())
  }

  /// Whether `ptr` lies strictly inside the arena's byte range.
  ///
  /// Diagnostic only; a `true` result does not prove `ptr` is a live
  /// allocation from this instance.
  pub fn contains(
    &self,
    ptr: *const u8,
  ) -> bool {
    self.arena.contains(ptr)
  }

  /// Snapshot of the free list as `(start_unit, len_units)` pairs in
  /// address order. Diagnostic only.
  pub fn free_extents(&self) -> Vec<(usize, usize)> {
    self.state.lock().extents(&self.arena)
  }
}

// The arena is owned exclusively by this instance and every free-list
// mutation happens under the spinlock.
unsafe impl Send for VariableResource {}
unsafe impl Sync for VariableResource {}

unsafe impl GlobalAlloc for VariableResource {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    match self.allocate(layout) {
      Ok(payload) => payload.as_ptr(),
      Err(AllocError) => ptr::null_mut(),
    }
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
  ) {
    if let Some(ptr) = NonNull::new(ptr) {
      // Safety: the `GlobalAlloc` contract gives the same provenance
      // guarantees `deallocate` requires.
      unsafe { self.deallocate(ptr, layout) }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::thread;

  fn layout(size: usize) -> Layout {
    Layout::from_size_align(size, 1).unwrap()
  }

  #[test]
  fn equality_is_identity() {
    let mrv = VariableResource::new(1024);
    let mrv2 = VariableResource::new(1024);

    assert!(mrv.is_equal(&mrv));
    assert!(!mrv.is_equal(&mrv2));
    assert!(!mrv2.is_equal(&mrv));
  }

  #[test]
  fn allocations_stay_inside_the_arena() {
    let mrv = VariableResource::new(1024);

    for _ in 0..8 {
      let ptr = mrv.allocate(layout(48)).unwrap();
      assert!(mrv.contains(ptr.as_ptr()));
      assert!(mrv.contains(unsafe { ptr.as_ptr().add(47) }));
    }
  }

  #[test]
  fn live_allocations_never_overlap() {
    let mrv = VariableResource::new(1024);
    let mut ranges = Vec::new();

    for size in [40, 8, 100, 16, 64] {
      let ptr = mrv.allocate(layout(size)).unwrap().as_ptr() as usize;
      ranges.push((ptr, ptr + size));
    }

    for (i, &(a_start, a_end)) in ranges.iter().enumerate() {
      for &(b_start, b_end) in &ranges[i + 1..] {
        assert!(a_end <= b_start || b_end <= a_start);
      }
    }
  }

  #[test]
  fn allocated_memory_is_writable() {
    let mrv = VariableResource::new(1024);

    let ptr = mrv.allocate(layout(256)).unwrap();

    // Safety: ptr points at 256 bytes owned by this allocation.
    unsafe {
      ptr::write_bytes(ptr.as_ptr(), 0xAB, 256);
      let slice = std::slice::from_raw_parts(ptr.as_ptr(), 256);
      assert!(slice.iter().all(|&b| b == 0xAB));
    }
  }

  #[test]
  fn first_fit_reuses_the_first_freed_slot() {
    let mrv = VariableResource::new(1024);
    let before = mrv.free_bytes();

    // 40 bytes round up to 3 payload units plus 1 header unit.
    let consumed = (units_for(40) + 1) * UNIT_SIZE;

    let a = mrv.allocate(layout(40)).unwrap();
    let _b = mrv.allocate(layout(40)).unwrap();

    unsafe { mrv.deallocate(a, layout(40)) };

    let c = mrv.allocate(layout(40)).unwrap();

    assert_eq!(c, a);
    assert_eq!(mrv.free_bytes(), before - 2 * consumed);
  }

  #[test]
  fn exhaustion_fails_and_freeing_recovers_everything() {
    let mrv = VariableResource::new(1024);

    // 63 payload units + 1 header unit = the whole 64-unit arena.
    let whole = mrv.capacity() - UNIT_SIZE;
    let ptr = mrv.allocate(layout(whole)).unwrap();

    assert_eq!(mrv.free_bytes(), 0);
    assert_eq!(mrv.allocate(layout(1)), Err(AllocError));

    unsafe { mrv.deallocate(ptr, layout(whole)) };

    assert_eq!(mrv.free_bytes(), mrv.capacity());
    assert_eq!(mrv.free_extents().len(), 1);
  }

  #[test]
  fn requests_beyond_capacity_always_fail() {
    let mrv = VariableResource::new(1024);

    assert_eq!(mrv.allocate(layout(2000)), Err(AllocError));
    assert_eq!(mrv.allocate(layout(1024)), Err(AllocError));
    assert_eq!(mrv.free_bytes(), mrv.capacity());
  }

  #[test]
  fn stricter_than_unit_alignment_is_refused() {
    let mrv = VariableResource::new(1024);
    let strict = Layout::from_size_align(8, 2 * UNIT_SIZE).unwrap();

    assert_eq!(mrv.allocate(strict), Err(AllocError));
  }

  #[test]
  fn payload_respects_unit_alignment() {
    let mrv = VariableResource::new(1024);

    for size in [1, 7, 16, 33] {
      let ptr = mrv.allocate(layout(size)).unwrap();
      assert_eq!(ptr.as_ptr() as usize % UNIT_SIZE, 0);
    }
  }

  #[test]
  fn freeing_adjacent_blocks_enables_a_combined_allocation() {
    let mrv = VariableResource::new(1024);

    let a = mrv.allocate(layout(48)).unwrap();
    let b = mrv.allocate(layout(48)).unwrap();
    let _fence = mrv.allocate(layout(48)).unwrap();

    unsafe {
      mrv.deallocate(b, layout(48));
      mrv.deallocate(a, layout(48));
    }

    // a and b together span 8 units; 112 bytes need 7 payload + 1 header.
    let combined = mrv.allocate(layout(112)).unwrap();

    assert_eq!(combined, a);
  }

  #[test]
  fn min_free_bytes_reports_the_low_water_mark() {
    let mrv = VariableResource::new(1024);

    let a = mrv.allocate(layout(384)).unwrap();
    let b = mrv.allocate(layout(384)).unwrap();

    unsafe {
      mrv.deallocate(a, layout(384));
      mrv.deallocate(b, layout(384));
    }

    assert_eq!(mrv.free_bytes(), 1024);
    assert_eq!(mrv.min_free_bytes(), 1024 - 2 * (units_for(384) + 1) * UNIT_SIZE);
  }

  #[test]
  fn global_alloc_maps_exhaustion_to_null() {
    let mrv = VariableResource::new(256);

    // Safety: layouts are non-zero and pointers come from this instance.
    unsafe {
      let ptr = mrv.alloc(layout(64));
      assert!(!ptr.is_null());

      let too_big = mrv.alloc(layout(4096));
      assert!(too_big.is_null());

      mrv.dealloc(ptr, layout(64));
      assert_eq!(mrv.free_bytes(), mrv.capacity());
    }
  }

  #[test]
  fn concurrent_churn_conserves_the_free_total() {
    let mrv = Arc::new(VariableResource::new(64 * 1024));
    let before = mrv.free_bytes();
    let mut handles = Vec::new();

    for t in 0..4usize {
      let mrv = Arc::clone(&mrv);

      handles.push(thread::spawn(move || {
        for round in 0..200usize {
          let mut held = Vec::new();

          for i in 0..8usize {
            let size = 16 + (t * 31 + round * 7 + i * 13) % 240;
            let ptr = mrv.allocate(layout(size)).unwrap();

            // Safety: ptr owns at least `size` bytes until deallocated.
            unsafe { ptr::write_bytes(ptr.as_ptr(), t as u8, size) };
            held.push((ptr, size));
          }

          for (ptr, size) in held {
            // Safety: each pointer is freed exactly once, by its allocator.
            unsafe { mrv.deallocate(ptr, layout(size)) };
          }
        }
      }));
    }

    for handle in handles {
      handle.join().unwrap();
    }

    assert_eq!(mrv.free_bytes(), before);
    assert_eq!(mrv.free_extents().len(), 1);
  }
}
