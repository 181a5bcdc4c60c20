//! # varalloc - A Fixed-Arena Variable-Block Allocator
//!
//! This crate provides a **free-list memory resource**: a fixed-capacity
//! arena that serves variable-sized allocation requests by maintaining an
//! address-ordered free list of variable-length blocks, splitting blocks on
//! allocation and merging adjacent free blocks on deallocation.
//!
//! ## Overview
//!
//! ```text
//!   Arena Layout (one unit = header size = max natural alignment):
//!
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                       FIXED-SIZE ARENA                           │
//!   │                                                                  │
//!   │   ┌───┬───────┬───┬───────────┬───┬───────┬───┬──────────────┐   │
//!   │   │ H │ free  │ H │ allocated │ H │ free  │ H │  allocated   │   │
//!   │   └─┬─┴───────┴───┴───────────┴─▲─┴───────┴───┴──────────────┘   │
//!   │     │                          │                                 │
//!   │   head ─────── next ───────────┘                                 │
//!   │                                                                  │
//!   │   Free blocks are linked in ascending address order, so          │
//!   │   coalescing only ever has to look at immediate neighbours.      │
//!   └──────────────────────────────────────────────────────────────────┘
//!
//!   Allocation:   first-fit walk, split the winning block.
//!   Deallocation: address-ordered reinsertion, merge forward + backward.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   varalloc
//!   ├── unit       - Allocation-unit arithmetic (round_up!, units_for)
//!   ├── block      - Free-block header record (internal)
//!   ├── arena      - Fixed, unit-aligned backing buffer (internal)
//!   ├── freelist   - First-fit search, split, coalesce (internal)
//!   └── resource   - VariableResource: the public allocator
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::alloc::Layout;
//! use varalloc::VariableResource;
//!
//! let mrv = VariableResource::new(1024);
//!
//! let layout = Layout::new::<u64>();
//! let ptr = mrv.allocate(layout).expect("arena exhausted");
//!
//! unsafe {
//!     // Use the memory.
//!     let value = ptr.cast::<u64>();
//!     value.write(42);
//!     assert_eq!(value.read(), 42);
//!
//!     // Return it.
//!     mrv.deallocate(ptr, layout);
//! }
//!
//! assert_eq!(mrv.free_bytes(), mrv.capacity());
//! ```
//!
//! ## How It Works
//!
//! Every block, free or allocated, spans a whole number of *units*. A unit
//! is the size of the free-block header, which in turn equals the platform's
//! maximum natural alignment, so every payload the allocator hands out is
//! aligned for any ordinary type:
//!
//! ```text
//!   Single Allocation:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Header (1 unit)    │         User Payload           │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ next: index/NIL │  │  ┌──────────────────────────┐  │
//!   │  │ len:  N units   │  │  │   (N - 1) whole units    │  │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Pointer returned to the caller
//! ```
//!
//! The header's `len` stays in place while the block is allocated, so
//! deallocation recovers it by stepping back one unit from the payload.
//! Splitting never leaves a 1-unit remainder on the list (it could never
//! hold a header plus payload); such a remainder is absorbed into the
//! allocation instead.
//!
//! ## Features
//!
//! - **Bounded memory**: one fixed buffer, no growth, no syscalls after
//!   construction
//! - **Coalescing free list**: adjacent free blocks always merge, in either
//!   deallocation order
//! - **Thread-safe**: a spinlock serializes every free-list mutation
//! - **Pluggable**: implements [`std::alloc::GlobalAlloc`] on top of the
//!   inherent `allocate`/`deallocate`/`is_equal` interface
//!
//! ## Limitations
//!
//! - **First-fit only**: no best-fit search and no size classes
//! - **Unit alignment only**: requests aligned stricter than the unit size
//!   fail
//! - **No realloc**: growing an allocation means allocate + copy + free
//! - **Busy-waiting**: contending threads spin rather than block; fine for
//!   the short critical sections here, wasteful under heavy contention
//!
//! ## Safety
//!
//! Allocating is safe; *using* the returned memory and giving it back are
//! not. `deallocate` is `unsafe` with the same contract as the standard
//! allocator traits: the pointer must come from the same instance and must
//! not be freed twice. Misuse is not detected, only the diagnostic
//! [`VariableResource::contains`] check is offered for tests.

pub mod unit;

mod arena;
mod block;
mod freelist;
mod resource;

pub use resource::{AllocError, VariableResource};
