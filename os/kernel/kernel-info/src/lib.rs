//! # Kernel Configuration
//!
//! This crate is the single source of truth for the sizes and capacities that
//! the kernel core is built around. The heap allocator, the in-memory
//! filesystem and the process table all size their fixed tables from the
//! constants defined here, so the resource-exhaustion behavior of each
//! subsystem is determined at compile time and identical on every boot.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Heap arena            HEAP_SIZE (16 MiB)     │
//! │  ├─ file handles      one record per open    │
//! │  └─ data blocks       FS_BLOCK_SIZE each,    │
//! │                       at most FS_MAX_BLOCKS  │
//! ├──────────────────────────────────────────────┤
//! │ Inode table           FS_MAX_FILES slots     │
//! ├──────────────────────────────────────────────┤
//! │ Process table         MAX_PROCESSES slots    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! * [`memory`]: heap arena size and alignment.
//! * [`storage`]: filesystem block pool, inode table and name limits.
//! * [`sched`]: process table capacity and scheduler time slice.
//! * [`config`]: the runtime [`KernelConfig`](config::KernelConfig) handed to
//!   the boot sequence.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod memory;
pub mod sched;
pub mod storage;

pub use config::KernelConfig;
