//! # segalloc - A Segregated Free-List Memory Allocator
//!
//! This crate provides a general-purpose heap allocator built on
//! **segregated free lists** with **boundary-tag coalescing**, managing
//! memory via the `sbrk` system call.
//!
//! ## Overview
//!
//! Free blocks are bucketed by size into one of nine classes, each with its
//! own doubly-linked list:
//!
//! ```text
//!   Segregated Free Lists:
//!
//!   class 0 (<=32)   root ──▶ [16B] ──▶ [32B] ──▶ NULL
//!   class 1 (<=64)   root ──▶ [48B] ──▶ NULL
//!   class 2 (<=128)  root ──▶ NULL
//!   ...
//!   class 8 (>16384) root ──▶ [20000B] ──▶ NULL
//!
//!   allocate(n) picks the smallest class that could fit n, then scans
//!   that list and every larger one, first fit, until a block is found.
//! ```
//!
//! Every block — free or allocated — carries a header word and a footer
//! word that both encode its total size plus an `alloc` flag. Freeing a
//! block inspects its physical neighbors through those boundary tags and
//! merges with whichever ones are also free, before the merged result goes
//! back onto a free list.
//!
//! ## Crate Structure
//!
//! ```text
//!   segalloc
//!   ├── align      - Size constants and alignment helpers
//!   ├── block      - In-band header/footer encoding (internal)
//!   ├── freelist   - Size classing and free-list insert/unlink (internal)
//!   ├── coalesce   - Boundary-tag neighbor merging (internal)
//!   ├── heap       - HeapProvider trait and the sbrk-backed implementation
//!   └── allocator  - Allocator: init/allocate/free/reallocate
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use segalloc::Allocator;
//!
//! let mut allocator = Allocator::new();
//! assert!(allocator.init());
//!
//! unsafe {
//!     let ptr = allocator.allocate(64);
//!     assert!(!ptr.is_null());
//!     *(ptr as *mut u64) = 42;
//!     allocator.free(ptr);
//! }
//! ```
//!
//! ## How It Works
//!
//! The allocator uses `sbrk(2)` to extend the program's data segment, the
//! same mechanism a bump allocator would use, but unlike a bump allocator
//! it can reclaim and reuse memory freed out of order:
//!
//! ```text
//!   Program Memory Layout:
//!
//!   High Address ┌─────────────────────┐
//!                │       Stack         │ ↓ grows down
//!                │         │           │
//!                │         ▼           │
//!                │                     │
//!                │         ▲           │
//!                │         │           │
//!                │       Heap          │ ↑ grows up (sbrk)
//!                ├─────────────────────┤ ← Program Break
//!                │   Uninitialized     │
//!                │       Data          │
//!                ├─────────────────────┤
//!                │   Initialized       │
//!                │       Data          │
//!                ├─────────────────────┤
//!                │       Text          │
//!   Low Address  └─────────────────────┘
//! ```
//!
//! Each block carries its metadata in-band, immediately around the payload
//! rather than in a separate side structure:
//!
//! ```text
//!   Single Allocated Block:
//!   ┌─────────┬──────────────────────────────┬─────────┐
//!   │ header  │          user payload        │ footer  │
//!   │ 8 bytes │   size - 16 bytes, aligned    │ 8 bytes │
//!   └─────────┴──────────────────────────────┴─────────┘
//!             ▲
//!             └── pointer returned to the caller
//! ```
//!
//! ## Features
//!
//! - **Segregated fits**: nine size classes, first-fit within each
//! - **Split on allocate**: a block larger than needed is split, with the
//!   remainder returned to its class, when the remainder is itself usable
//! - **Boundary-tag coalescing**: adjacent free blocks merge on free
//! - **Direct OS interaction**: uses `sbrk` for memory management
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives; `Allocator`
//!   is neither `Sync` nor intended to be shared across threads
//! - **No OS-level shrink**: freed memory is reused in-process but never
//!   returned to the OS via a negative `sbrk`
//! - **16-byte alignment only**: no support for over-aligned allocations
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management.
//! The public `Allocator` methods are safe to call, but they manipulate raw
//! pointers internally and rely on the caller passing back pointers this
//! allocator itself returned.

pub mod align;
mod allocator;
mod block;
mod coalesce;
mod freelist;
pub mod heap;

pub use allocator::Allocator;
pub use heap::{HeapProvider, SbrkHeap};
