//! # Data Block Pool
//!
//! A fixed number of pool slots, each backed by one [`FS_BLOCK_SIZE`] heap
//! allocation. The heap storage of a slot is requested the first time the
//! slot is handed out and kept afterwards; freeing a slot only zeroes it and
//! marks it available.

use crate::FsError;
use crate::inode::BlockId;
use alloc::boxed::Box;
use alloc::vec;
use kernel_alloc::{Heap, HeapPtr};
use kernel_info::storage::{FS_BLOCK_SIZE, FS_MAX_BLOCKS};
use log::trace;

#[derive(Debug, Default, Copy, Clone)]
struct Slot {
    allocated: bool,
    storage: Option<HeapPtr>,
}

pub(crate) struct BlockPool {
    slots: Box<[Slot]>,
}

impl BlockPool {
    pub(crate) fn new() -> Self {
        Self {
            slots: vec![Slot::default(); FS_MAX_BLOCKS].into_boxed_slice(),
        }
    }

    /// Claim the lowest free slot, zeroed.
    ///
    /// Slot 0 is reserved so that a block id is never zero.
    pub(crate) fn allocate(&mut self, heap: &mut Heap) -> Result<BlockId, FsError> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .skip(1)
            .find(|(_, s)| !s.allocated)
            .ok_or(FsError::BlockPoolFull)?;

        match slot.storage {
            Some(ptr) => {
                if let Some(bytes) = heap.bytes_mut(ptr) {
                    bytes.fill(0);
                }
            }
            None => slot.storage = Some(heap.allocate_zeroed(1, FS_BLOCK_SIZE)?),
        }
        slot.allocated = true;
        trace!("claimed data block {index}");
        Ok(BlockId::from_index(index))
    }

    /// Return `id` to the pool. Its storage is zeroed and retained.
    pub(crate) fn free(&mut self, heap: &mut Heap, id: BlockId) {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return;
        };
        if let Some(bytes) = slot.storage.and_then(|ptr| heap.bytes_mut(ptr)) {
            bytes.fill(0);
        }
        slot.allocated = false;
        trace!("released data block {}", id.get());
    }

    /// Contents of an allocated block.
    pub(crate) fn data<'h>(&self, heap: &'h Heap, id: BlockId) -> Option<&'h [u8]> {
        let ptr = self.storage(id)?;
        heap.bytes(ptr)?.get(..FS_BLOCK_SIZE)
    }

    /// Mutable contents of an allocated block.
    pub(crate) fn data_mut<'h>(&self, heap: &'h mut Heap, id: BlockId) -> Option<&'h mut [u8]> {
        let ptr = self.storage(id)?;
        heap.bytes_mut(ptr)?.get_mut(..FS_BLOCK_SIZE)
    }

    fn storage(&self, id: BlockId) -> Option<HeapPtr> {
        self.slots
            .get(id.index())
            .filter(|s| s.allocated)
            .and_then(|s| s.storage)
    }

    /// Number of allocated slots, the reserved slot 0 excluded.
    pub(crate) fn used(&self) -> usize {
        self.slots.iter().skip(1).filter(|s| s.allocated).count()
    }

    /// Number of slots that can still be claimed.
    pub(crate) fn available(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Number of claimable slots in total.
    pub(crate) const fn capacity(&self) -> usize {
        self.slots.len() - 1
    }
}
