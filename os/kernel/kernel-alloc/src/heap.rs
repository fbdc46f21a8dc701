//! # Kernel Heap
//!
//! [`Heap`] is the allocator's public face: it owns the arena and its block
//! list, hands out [`HeapPtr`] handles to payloads, and reports usage.

use crate::AllocError;
use crate::free_list::{BlockList, HEADER_SIZE};
use core::num::NonZeroUsize;
use kernel_info::memory::{ALLOCATION_ALIGNMENT, HEAP_SIZE};
use log::{debug, trace};

/// Round `size` up to the allocation alignment.
#[inline]
const fn align_size(size: usize) -> Option<usize> {
    match size.checked_add(ALLOCATION_ALIGNMENT - 1) {
        Some(s) => Some(s & !(ALLOCATION_ALIGNMENT - 1)),
        None => None,
    }
}

/// Handle to the payload of a live allocation.
///
/// The value is the payload's byte offset in the arena; it is never zero
/// because every payload follows a block header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapPtr(NonZeroUsize);

impl HeapPtr {
    /// Offset of the payload from the start of the arena.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.0.get()
    }

    const fn block(self) -> usize {
        self.0.get() - HEADER_SIZE
    }

    fn from_block(block: usize) -> Self {
        Self(NonZeroUsize::MIN.saturating_add(block + HEADER_SIZE - 1))
    }
}

/// Usage counters computed by a full walk of the block list.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Fixed arena capacity.
    pub total_bytes: usize,
    /// Payload plus header bytes of allocated blocks.
    pub used_bytes: usize,
    /// Payload bytes of free blocks.
    pub free_bytes: usize,
    pub block_count: usize,
    pub free_block_count: usize,
    /// Largest single free payload, the biggest request that can succeed.
    pub largest_free_block: usize,
}

/// Snapshot of one block, as reported by [`Heap::blocks`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    /// Offset of the block header.
    pub offset: usize,
    /// Payload size.
    pub size: usize,
    pub allocated: bool,
}

impl BlockInfo {
    /// Byte range of the payload within the arena.
    #[must_use]
    pub const fn payload(&self) -> core::ops::Range<usize> {
        let start = self.offset + HEADER_SIZE;
        start..start + self.size
    }
}

/// A fixed-capacity heap over a single arena.
///
/// Allocation is first-fit from the lowest address; freed blocks merge with
/// free neighbors. Every operation is O(number of blocks).
pub struct Heap {
    list: BlockList,
}

impl Heap {
    /// Per-block bookkeeping overhead in bytes.
    pub const HEADER_SIZE: usize = HEADER_SIZE;

    /// Build a heap over a fresh arena of `capacity` bytes.
    ///
    /// The capacity is rounded down to the allocation alignment. An arena too
    /// small for a single header is valid but every allocation fails.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity & !(ALLOCATION_ALIGNMENT - 1);
        debug!("heap arena initialized with {capacity} bytes");
        Self {
            list: BlockList::new(capacity),
        }
    }

    /// Allocate `size` bytes.
    ///
    /// # Errors
    /// - [`AllocError::ZeroSize`] for `size == 0`.
    /// - [`AllocError::SizeOverflow`] if aligning `size` overflows.
    /// - [`AllocError::OutOfMemory`] if no free block is large enough.
    pub fn allocate(&mut self, size: usize) -> Result<HeapPtr, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }
        let aligned = align_size(size).ok_or(AllocError::SizeOverflow)?;
        let Some(block) = self.list.find_first_fit(aligned) else {
            debug!("heap exhausted: no free block for {aligned} bytes");
            return Err(AllocError::OutOfMemory { requested: size });
        };

        self.list.split(block, aligned);
        let mut header = self.list.header(block);
        header.allocated = true;
        self.list.set_header(block, &header);

        trace!("allocated {} bytes at block {block:#x}", header.size);
        Ok(HeapPtr::from_block(block))
    }

    /// Allocate `count * element_size` bytes and zero them.
    ///
    /// # Errors
    /// As [`allocate`](Self::allocate); a product that overflows yields
    /// [`AllocError::SizeOverflow`].
    pub fn allocate_zeroed(
        &mut self,
        count: usize,
        element_size: usize,
    ) -> Result<HeapPtr, AllocError> {
        let total = count
            .checked_mul(element_size)
            .ok_or(AllocError::SizeOverflow)?;
        let ptr = self.allocate(total)?;
        if let Some(bytes) = self.bytes_mut(ptr) {
            bytes.fill(0);
        }
        Ok(ptr)
    }

    /// Release an allocation.
    ///
    /// Freeing a pointer that is not a live allocation (already freed, or
    /// never handed out by this heap) is a no-op.
    pub fn free(&mut self, ptr: HeapPtr) {
        let Some(block) = self.live_block(ptr) else {
            debug!("ignoring free of {:#x}: not a live allocation", ptr.offset());
            return;
        };
        let mut header = self.list.header(block);
        header.allocated = false;
        self.list.set_header(block, &header);
        self.list.coalesce(block);
        trace!("freed block {block:#x}");
    }

    /// Resize an allocation, moving it if it cannot shrink in place.
    ///
    /// - `ptr == None` behaves as [`allocate`](Self::allocate).
    /// - `new_size == 0` frees `ptr` and returns `Ok(None)`.
    ///
    /// # Errors
    /// - [`AllocError::InvalidPointer`] if `ptr` is not a live allocation.
    /// - Any error of [`allocate`](Self::allocate) when the block has to move;
    ///   the original allocation is then left intact.
    pub fn reallocate(
        &mut self,
        ptr: Option<HeapPtr>,
        new_size: usize,
    ) -> Result<Option<HeapPtr>, AllocError> {
        let Some(ptr) = ptr else {
            return self.allocate(new_size).map(Some);
        };
        if new_size == 0 {
            self.free(ptr);
            return Ok(None);
        }

        let block = self.live_block(ptr).ok_or(AllocError::InvalidPointer)?;
        let aligned = align_size(new_size).ok_or(AllocError::SizeOverflow)?;
        let old_size = self.list.header(block).size;

        if old_size >= aligned {
            if let Some(tail) = self.list.split(block, aligned) {
                self.list.coalesce(tail);
            }
            return Ok(Some(ptr));
        }

        let moved = self.allocate(new_size)?;
        let copy = old_size.min(new_size);
        self.list
            .arena_mut()
            .as_bytes_mut()
            .copy_within(ptr.offset()..ptr.offset() + copy, moved.offset());
        self.free(ptr);
        trace!(
            "moved allocation {:#x} -> {:#x} ({copy} bytes)",
            ptr.offset(),
            moved.offset()
        );
        Ok(Some(moved))
    }

    /// Payload size of a live allocation (the aligned request, or more when
    /// the remainder was too small to split off).
    #[must_use]
    pub fn usable_size(&self, ptr: HeapPtr) -> Option<usize> {
        self.live_block(ptr).map(|b| self.list.header(b).size)
    }

    /// Payload bytes of a live allocation.
    #[must_use]
    pub fn bytes(&self, ptr: HeapPtr) -> Option<&[u8]> {
        let size = self.usable_size(ptr)?;
        Some(self.list.arena().slice(ptr.offset()..ptr.offset() + size))
    }

    /// Mutable payload bytes of a live allocation.
    pub fn bytes_mut(&mut self, ptr: HeapPtr) -> Option<&mut [u8]> {
        let size = self.usable_size(ptr)?;
        Some(
            self.list
                .arena_mut()
                .slice_mut(ptr.offset()..ptr.offset() + size),
        )
    }

    /// Bytes held by allocated blocks, headers included.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.stats().used_bytes
    }

    /// Payload bytes available in free blocks.
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.stats().free_bytes
    }

    /// Fixed arena capacity.
    #[must_use]
    pub const fn total_bytes(&self) -> usize {
        self.list.capacity()
    }

    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats {
            total_bytes: self.total_bytes(),
            ..HeapStats::default()
        };
        for (_, header) in self.list.iter() {
            stats.block_count += 1;
            if header.allocated {
                stats.used_bytes += header.size + HEADER_SIZE;
            } else {
                stats.free_bytes += header.size;
                stats.free_block_count += 1;
                stats.largest_free_block = stats.largest_free_block.max(header.size);
            }
        }
        stats
    }

    /// All blocks in address order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        self.list.iter().map(|(offset, h)| BlockInfo {
            offset,
            size: h.size,
            allocated: h.allocated,
        })
    }

    /// Log every block at `debug` level.
    pub fn dump_info(&self) {
        let stats = self.stats();
        debug!(
            "heap: {} blocks, {} used, {} free of {} bytes",
            stats.block_count, stats.used_bytes, stats.free_bytes, stats.total_bytes
        );
        for block in self.blocks() {
            debug!(
                "  {:#010x} {:>10} bytes {}",
                block.offset,
                block.size,
                if block.allocated { "allocated" } else { "free" }
            );
        }
    }

    /// Resolve `ptr` to its block offset if it names an allocated block.
    fn live_block(&self, ptr: HeapPtr) -> Option<usize> {
        let block = ptr.block();
        if block + HEADER_SIZE > self.list.capacity() || !self.list.contains(block) {
            return None;
        }
        self.list.header(block).allocated.then_some(block)
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(HEAP_SIZE)
    }
}
