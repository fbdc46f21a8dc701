//! # Heap Arena
//!
//! The arena is one contiguous, page-aligned byte region allocated once when
//! the heap is constructed and never resized. Block headers live *inside* the
//! arena, so every access is expressed as a byte offset from its start.

use alloc::boxed::Box;
use alloc::vec;
use core::ops::Range;
use kernel_info::memory::HEAP_ALIGNMENT;

/// One page of backing storage; guarantees the arena's base alignment.
#[repr(C, align(4096))]
#[derive(Copy, Clone)]
struct HeapPage([u8; HEAP_ALIGNMENT]);

const _: () = {
    assert!(size_of::<HeapPage>() == HEAP_ALIGNMENT);
    assert!(align_of::<HeapPage>() == HEAP_ALIGNMENT);
};

/// Fixed-capacity, page-aligned byte storage.
pub(crate) struct Arena {
    pages: Box<[HeapPage]>,
    len: usize,
}

impl Arena {
    /// Reserve `len` zeroed bytes, rounded up to whole pages internally.
    pub(crate) fn new(len: usize) -> Self {
        let pages = vec![HeapPage([0; HEAP_ALIGNMENT]); len.div_ceil(HEAP_ALIGNMENT)];
        Self {
            pages: pages.into_boxed_slice(),
            len,
        }
    }

    /// Usable length in bytes.
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        // SAFETY: `HeapPage` is a `repr(C)` byte array whose size equals its
        // alignment, so the boxed slice is `pages.len() * HEAP_ALIGNMENT`
        // contiguous, initialized bytes, and `len` never exceeds that.
        unsafe { core::slice::from_raw_parts(self.pages.as_ptr().cast::<u8>(), self.len) }
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: see `as_bytes`; `&mut self` guarantees exclusive access.
        unsafe { core::slice::from_raw_parts_mut(self.pages.as_mut_ptr().cast::<u8>(), self.len) }
    }

    pub(crate) fn slice(&self, range: Range<usize>) -> &[u8] {
        &self.as_bytes()[range]
    }

    pub(crate) fn slice_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.as_bytes_mut()[range]
    }

    /// Read the little-endian 64-bit word at `offset`.
    pub(crate) fn read_word(&self, offset: usize) -> u64 {
        let mut word = [0u8; 8];
        word.copy_from_slice(self.slice(offset..offset + 8));
        u64::from_le_bytes(word)
    }

    /// Write `value` as a little-endian 64-bit word at `offset`.
    pub(crate) fn write_word(&mut self, offset: usize, value: u64) {
        self.slice_mut(offset..offset + 8)
            .copy_from_slice(&value.to_le_bytes());
    }

    #[cfg(test)]
    fn base_addr(&self) -> usize {
        self.pages.as_ptr() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_is_page_aligned_and_zeroed() {
        let arena = Arena::new(3 * HEAP_ALIGNMENT + 100);
        assert_eq!(arena.base_addr() % HEAP_ALIGNMENT, 0);
        assert_eq!(arena.len(), 3 * HEAP_ALIGNMENT + 100);
        assert!(arena.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn words_round_trip_little_endian() {
        let mut arena = Arena::new(64);
        arena.write_word(8, 0x0102_0304_0506_0708);
        assert_eq!(arena.read_word(8), 0x0102_0304_0506_0708);
        assert_eq!(arena.slice(8..10), &[0x08, 0x07]);
    }
}
