//! # Open File Handles
//!
//! The state of an open file lives in a small heap record, so opening files
//! consumes heap memory the same way any other transient kernel object does:
//!
//! ```text
//! 0        4          8        12         16
//! ├────────┼──────────┼────────┼──────────┤
//! │ inode  │ position │ flags  │ created  │   (little-endian u32 each)
//! └────────┴──────────┴────────┴──────────┘
//! ```
//!
//! `created` is the inode's creation stamp. Timestamps never repeat, so a
//! handle whose file was deleted does not follow a new file that later reuses
//! the same inode slot.

use crate::inode::InodeId;
use bitfield_struct::bitfield;
use kernel_alloc::{AllocError, Heap, HeapPtr};

const RECORD_SIZE: usize = 16;

#[bitfield(u32)]
struct HandleFlags {
    open: bool,
    write_mode: bool,
    #[bits(30)]
    __: u32,
}

/// An open file. Closing consumes the handle.
///
/// The handle is only meaningful together with the heap and filesystem that
/// produced it.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an unclosed handle keeps its heap record alive"]
pub struct FileHandle {
    ptr: HeapPtr,
}

/// Decoded handle record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct HandleState {
    pub inode: InodeId,
    pub position: u32,
    pub write_mode: bool,
    pub created_at: u32,
}

impl FileHandle {
    pub(crate) fn create(heap: &mut Heap, state: HandleState) -> Result<Self, AllocError> {
        let handle = Self {
            ptr: heap.allocate(RECORD_SIZE)?,
        };
        handle.store(heap, state);
        Ok(handle)
    }

    /// Read the record, `None` if the record is gone or marked closed.
    pub(crate) fn load(&self, heap: &Heap) -> Option<HandleState> {
        let bytes = heap.bytes(self.ptr)?.get(..RECORD_SIZE)?;
        let word = |i: usize| {
            let mut w = [0u8; 4];
            w.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            u32::from_le_bytes(w)
        };
        let flags = HandleFlags::from_bits(word(2));
        flags.open().then(|| HandleState {
            inode: InodeId::from_index(word(0) as usize),
            position: word(1),
            write_mode: flags.write_mode(),
            created_at: word(3),
        })
    }

    pub(crate) fn store(&self, heap: &mut Heap, state: HandleState) {
        let Some(bytes) = heap
            .bytes_mut(self.ptr)
            .and_then(|b| b.get_mut(..RECORD_SIZE))
        else {
            return;
        };
        let flags = HandleFlags::new()
            .with_open(true)
            .with_write_mode(state.write_mode);
        bytes[0..4].copy_from_slice(&state.inode.get().to_le_bytes());
        bytes[4..8].copy_from_slice(&state.position.to_le_bytes());
        bytes[8..12].copy_from_slice(&flags.into_bits().to_le_bytes());
        bytes[12..16].copy_from_slice(&state.created_at.to_le_bytes());
    }

    /// Mark the record closed and give it back to the heap.
    pub(crate) fn release(self, heap: &mut Heap) {
        if let Some(flags) = heap.bytes_mut(self.ptr).and_then(|b| b.get_mut(8..12)) {
            flags.fill(0);
        }
        heap.free(self.ptr);
    }
}
