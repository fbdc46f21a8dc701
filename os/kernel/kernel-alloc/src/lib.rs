//! # Kernel Heap Allocator
//!
//! This crate provides the general-purpose heap used by the rest of the kernel
//! core: file handles and filesystem data blocks live here, and the used/free
//! counters feed the diagnostic views.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Heap                            │
//! │    • allocate / free / reallocate / zeroed          │
//! │    • HeapPtr handles, checked payload access        │
//! │    • used / free / total statistics                 │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │                  Block list                         │
//! │    • every block linked in address order            │
//! │    • first-fit search, split on allocate            │
//! │    • coalesce with neighbors on free                │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │                    Arena                            │
//! │    • one fixed, page-aligned byte region            │
//! │    • block headers embedded inline                  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Arena Layout
//!
//! Blocks tile the arena without gaps. Each one starts with a 32-byte header
//! followed by its payload:
//!
//! ```text
//! 0                                                         capacity
//! ├────────┬──────────┬────────┬─────────────┬────────┬──────────┤
//! │ header │ payload  │ header │   payload   │ header │ payload  │
//! │ (used) │          │ (free) │             │ (used) │          │
//! └────────┴──────────┴────────┴─────────────┴────────┴──────────┘
//! ```
//!
//! ## Allocation Strategy
//!
//! * **Alignment**: requests are rounded up to 8 bytes.
//! * **First fit**: the lowest-addressed free block large enough wins.
//! * **Split**: when the leftover can hold a header plus a minimum payload it
//!   becomes a new free block right after the allocation.
//! * **Coalesce**: a freed block absorbs its free successors, then merges into
//!   a free predecessor. Only address-order neighbors are considered.
//!
//! ## Failure Model
//!
//! Exhaustion is reported as [`AllocError::OutOfMemory`], never by aborting.
//! Freeing an unknown or already-freed [`HeapPtr`] is ignored.
//!
//! ## Usage
//!
//! ```rust
//! use kernel_alloc::Heap;
//!
//! let mut heap = Heap::new(64 * 1024);
//! let ptr = heap.allocate(100).unwrap();
//! heap.bytes_mut(ptr).unwrap()[..5].copy_from_slice(b"hello");
//! assert_eq!(&heap.bytes(ptr).unwrap()[..5], b"hello");
//! heap.free(ptr);
//! assert_eq!(heap.used_bytes(), 0);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

mod arena;
mod error;
mod free_list;
pub mod heap;

pub use error::AllocError;
pub use heap::{BlockInfo, Heap, HeapPtr, HeapStats};
