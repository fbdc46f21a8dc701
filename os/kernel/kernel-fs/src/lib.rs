//! # In-Memory Filesystem
//!
//! A small inode filesystem kept entirely in memory. Directory entries live in
//! a fixed inode table, and each file owns exactly one data block from a fixed
//! pool. Block storage and open-file records are allocated from the kernel
//! [`Heap`](kernel_alloc::Heap).
//!
//! ## Layout
//!
//! ```text
//!   inode table (FS_MAX_FILES)            block pool (FS_MAX_BLOCKS)
//! ┌───┬──────┬──────┬──────┬─────┐      ┌───┬─────┬─────┬─────┬─────┐
//! │ - │ root │ home │ a.txt│ ... │      │ - │  1  │  2  │  3  │ ... │
//! └───┴──────┴──────┴──┬───┴─────┘      └───┴─────┴──▲──┴─────┴─────┘
//!                      │ data_block                  │
//!                      └─────────────────────────────┘
//! ```
//!
//! Slot 0 of both tables is reserved. The tree structure is implied by each
//! inode's parent link; every lookup is a linear scan.
//!
//! ## Limits
//!
//! * Names are 1 to 64 bytes and contain no `/`; paths are at most 256 bytes.
//! * A file holds at most one 512-byte block. Longer writes are truncated.
//! * Permission bits are recorded and reported, never enforced.
//!
//! ## Usage
//!
//! ```rust
//! use kernel_alloc::Heap;
//! use kernel_fs::Filesystem;
//!
//! let mut heap = Heap::new(256 * 1024);
//! let mut fs = Filesystem::new();
//! fs.create_directory("/tmp").unwrap();
//! fs.write_all(&mut heap, "/tmp/a.txt", b"hello").unwrap();
//! assert_eq!(fs.read_to_end(&mut heap, "/tmp/a.txt").unwrap(), b"hello");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod block;
mod error;
mod filesystem;
mod handle;
pub mod inode;
mod path;
mod seed;

pub use error::FsError;
pub use filesystem::{Filesystem, FsStats};
pub use handle::FileHandle;
pub use inode::{BlockId, DirEntry, FileInfo, InodeId, Name, NodeKind, Permissions};
