use std::alloc::Layout;
use std::io::Read;

use varalloc::VariableResource;

/// Waits until the user presses ENTER, so each stage of the free list can
/// be inspected before the next mutation.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the allocator's bookkeeping: free bytes, the low-water mark, and
/// every free block as (start_unit, len_units).
fn print_state(
  label: &str,
  mrv: &VariableResource,
) {
  println!(
    "[{}] free = {} / {} bytes (min ever = {}), free list = {:?}",
    label,
    mrv.free_bytes(),
    mrv.capacity(),
    mrv.min_free_bytes(),
    mrv.free_extents(),
  );
}

fn main() {
  // A 1 KiB arena. The whole buffer starts as a single free block.
  let mrv = VariableResource::new(1024);

  print_state("start", &mrv);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) Three equally sized allocations carve the front of the arena.
  // --------------------------------------------------------------------
  let layout = Layout::array::<u8>(40).unwrap();
  let a = mrv.allocate(layout).expect("arena exhausted");
  let b = mrv.allocate(layout).expect("arena exhausted");
  let c = mrv.allocate(layout).expect("arena exhausted");

  println!("\n[1] Allocated a = {a:?}, b = {b:?}, c = {c:?}");
  print_state("1", &mrv);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) Freeing the middle block leaves a hole: two entries on the list.
  // --------------------------------------------------------------------
  unsafe { mrv.deallocate(b, layout) };

  println!("\n[2] Freed b (the middle block)");
  print_state("2", &mrv);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Freeing a neighbour of the hole coalesces: still two entries, one
  //    of them twice as large.
  // --------------------------------------------------------------------
  unsafe { mrv.deallocate(a, layout) };

  println!("\n[3] Freed a (merges with b's hole)");
  print_state("3", &mrv);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) First-fit: a small request reuses the front hole rather than the
  //    large tail block.
  // --------------------------------------------------------------------
  let d = mrv.allocate(layout).expect("arena exhausted");

  println!("\n[4] Allocated d = {d:?}");
  println!(
    "[4] d == a? {}",
    if d == a {
      "Yes, first-fit reused the freed front block"
    } else {
      "No, it went somewhere else"
    }
  );
  print_state("4", &mrv);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) Exhaustion: a request larger than the biggest free extent fails
  //    without touching the list.
  // --------------------------------------------------------------------
  let huge = Layout::array::<u8>(2048).unwrap();

  println!("\n[5] Requesting 2048 bytes: {:?}", mrv.allocate(huge));
  print_state("5", &mrv);
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 6) Freeing everything restores a single block spanning the arena.
  // --------------------------------------------------------------------
  unsafe {
    mrv.deallocate(d, layout);
    mrv.deallocate(c, layout);
  }

  println!("\n[6] Freed the rest");
  print_state("6", &mrv);
  println!("\n[6] End of demo. The arena is whole again.");
}
