use crate::arena::Arena;
use kernel_info::memory::ALLOCATION_ALIGNMENT;
use log::trace;

/// Size of the header stored at the beginning of **every** block.
///
/// A block in the arena has the following layout:
///
/// ```text
/// +------+-----------+------+------+-------------------------+
/// | size | allocated | next | prev |      payload (size)     |
/// +------+-----------+------+------+-------------------------+
/// ^ block offset                   ^ block offset + HEADER_SIZE
/// ```
///
/// Each header field is one little-endian 64-bit word. `next` and `prev` are
/// block offsets, or [`NIL`] at either end of the list.
pub(crate) const HEADER_SIZE: usize = 4 * 8;

/// A split only happens when the tail, after its own header, keeps at least
/// this much payload.
pub(crate) const MIN_BLOCK_SIZE: usize = ALLOCATION_ALIGNMENT;

/// Encodes "no neighbor" in a `next`/`prev` link word.
const NIL: u64 = u64::MAX;

const SIZE_WORD: usize = 0;
const ALLOCATED_WORD: usize = 8;
const NEXT_WORD: usize = 16;
const PREV_WORD: usize = 24;

/// Decoded block header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct BlockHeader {
    /// Payload bytes following the header.
    pub size: usize,
    pub allocated: bool,
    /// Next block in address order.
    pub next: Option<usize>,
    /// Previous block in address order.
    pub prev: Option<usize>,
}

const fn encode_link(link: Option<usize>) -> u64 {
    match link {
        Some(offset) => offset as u64,
        None => NIL,
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn decode_link(word: u64) -> Option<usize> {
    if word == NIL { None } else { Some(word as usize) }
}

/// A first-fit, split-and-coalesce block list embedded in an [`Arena`].
///
/// Unlike a pure free list, **every** block (free or allocated) is linked, in
/// address order, so neighbors are found in O(1) when coalescing.
///
/// # Invariants
/// - Blocks are contiguous: `next == offset + HEADER_SIZE + size`.
/// - The blocks tile the arena exactly: the sum of `HEADER_SIZE + size` over
///   all blocks equals the arena length.
/// - `prev`/`next` links are mutually consistent.
pub(crate) struct BlockList {
    arena: Arena,
    /// Offset of the lowest block, `None` if the arena is too small for one.
    first: Option<usize>,
}

impl BlockList {
    /// Create a list with one free block spanning the whole arena.
    pub(crate) fn new(capacity: usize) -> Self {
        let mut arena = Arena::new(capacity);
        let first = if capacity >= HEADER_SIZE {
            let root = BlockHeader {
                size: capacity - HEADER_SIZE,
                allocated: false,
                next: None,
                prev: None,
            };
            Self::store(&mut arena, 0, &root);
            Some(0)
        } else {
            None
        };
        Self { arena, first }
    }

    pub(crate) const fn capacity(&self) -> usize {
        self.arena.len()
    }

    pub(crate) const fn arena(&self) -> &Arena {
        &self.arena
    }

    pub(crate) const fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn header(&self, offset: usize) -> BlockHeader {
        BlockHeader {
            size: self.arena.read_word(offset + SIZE_WORD) as usize,
            allocated: self.arena.read_word(offset + ALLOCATED_WORD) != 0,
            next: decode_link(self.arena.read_word(offset + NEXT_WORD)),
            prev: decode_link(self.arena.read_word(offset + PREV_WORD)),
        }
    }

    pub(crate) fn set_header(&mut self, offset: usize, header: &BlockHeader) {
        Self::store(&mut self.arena, offset, header);
    }

    fn store(arena: &mut Arena, offset: usize, header: &BlockHeader) {
        arena.write_word(offset + SIZE_WORD, header.size as u64);
        arena.write_word(offset + ALLOCATED_WORD, u64::from(header.allocated));
        arena.write_word(offset + NEXT_WORD, encode_link(header.next));
        arena.write_word(offset + PREV_WORD, encode_link(header.prev));
    }

    fn set_prev(&mut self, offset: usize, prev: Option<usize>) {
        self.arena.write_word(offset + PREV_WORD, encode_link(prev));
    }

    /// Walk all blocks in address order.
    pub(crate) fn iter(&self) -> Blocks<'_> {
        Blocks {
            list: self,
            cursor: self.first,
        }
    }

    /// Whether `offset` is the start of a block in this list.
    pub(crate) fn contains(&self, offset: usize) -> bool {
        self.iter().any(|(o, _)| o == offset)
    }

    /// First block, in address order, that is free and holds `size` bytes.
    pub(crate) fn find_first_fit(&self, size: usize) -> Option<usize> {
        self.iter()
            .find(|(_, h)| !h.allocated && h.size >= size)
            .map(|(offset, _)| offset)
    }

    /// Shrink the block at `offset` to `requested` bytes if the tail can form a
    /// block of its own, inserting the tail as a new **free** block directly
    /// after it.
    ///
    /// Returns the offset of the new tail block, if one was created.
    pub(crate) fn split(&mut self, offset: usize, requested: usize) -> Option<usize> {
        let mut block = self.header(offset);
        let remainder = block
            .size
            .checked_sub(requested)
            .and_then(|r| r.checked_sub(HEADER_SIZE))?;
        if remainder < MIN_BLOCK_SIZE {
            return None;
        }

        let tail = offset + HEADER_SIZE + requested;
        self.set_header(
            tail,
            &BlockHeader {
                size: remainder,
                allocated: false,
                next: block.next,
                prev: Some(offset),
            },
        );
        if let Some(next) = block.next {
            self.set_prev(next, Some(tail));
        }
        block.next = Some(tail);
        block.size = requested;
        self.set_header(offset, &block);

        trace!("split block {offset:#x}: {requested} + {remainder} bytes at {tail:#x}");
        Some(tail)
    }

    /// Merge the free block at `offset` with its free neighbors: forward
    /// first, then backward into the previous block.
    ///
    /// Only the address-order neighbors are considered. Returns the offset of
    /// the surviving block.
    pub(crate) fn coalesce(&mut self, offset: usize) -> usize {
        let mut block = self.header(offset);
        if block.allocated {
            return offset;
        }

        while let Some(next_offset) = block.next {
            let next = self.header(next_offset);
            if next.allocated {
                break;
            }
            block.size += HEADER_SIZE + next.size;
            block.next = next.next;
            if let Some(after) = next.next {
                self.set_prev(after, Some(offset));
            }
            trace!("coalesced block {next_offset:#x} into {offset:#x}");
        }
        self.set_header(offset, &block);

        if let Some(prev_offset) = block.prev {
            let mut prev = self.header(prev_offset);
            if !prev.allocated {
                prev.size += HEADER_SIZE + block.size;
                prev.next = block.next;
                if let Some(after) = block.next {
                    self.set_prev(after, Some(prev_offset));
                }
                self.set_header(prev_offset, &prev);
                trace!("coalesced block {offset:#x} into {prev_offset:#x}");
                return prev_offset;
            }
        }
        offset
    }
}

/// Iterator over `(offset, header)` pairs in address order.
pub(crate) struct Blocks<'a> {
    list: &'a BlockList,
    cursor: Option<usize>,
}

impl Iterator for Blocks<'_> {
    type Item = (usize, BlockHeader);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.cursor?;
        let header = self.list.header(offset);
        self.cursor = header.next;
        Some((offset, header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocate(list: &mut BlockList, size: usize) -> usize {
        let offset = list.find_first_fit(size).expect("fit");
        list.split(offset, size);
        let mut h = list.header(offset);
        h.allocated = true;
        list.set_header(offset, &h);
        offset
    }

    fn release(list: &mut BlockList, offset: usize) -> usize {
        let mut h = list.header(offset);
        h.allocated = false;
        list.set_header(offset, &h);
        list.coalesce(offset)
    }

    fn tiles_exactly(list: &BlockList) -> bool {
        let mut expected = 0;
        let mut prev = None;
        for (offset, h) in list.iter() {
            if offset != expected || h.prev != prev {
                return false;
            }
            expected = offset + HEADER_SIZE + h.size;
            prev = Some(offset);
        }
        expected == list.capacity()
    }

    #[test]
    fn new_list_is_one_free_block() {
        let list = BlockList::new(1024);
        let blocks: Vec<_> = list.iter().collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].0, 0);
        assert_eq!(blocks[0].1.size, 1024 - HEADER_SIZE);
        assert!(!blocks[0].1.allocated);
    }

    #[test]
    fn tiny_arena_has_no_blocks() {
        let list = BlockList::new(HEADER_SIZE - 1);
        assert_eq!(list.iter().count(), 0);
        assert_eq!(list.find_first_fit(8), None);
    }

    #[test]
    fn split_inserts_tail_after_block() {
        let mut list = BlockList::new(1024);
        let tail = list.split(0, 64).expect("split");
        assert_eq!(tail, HEADER_SIZE + 64);
        let tail_header = list.header(tail);
        assert_eq!(tail_header.size, 1024 - 2 * HEADER_SIZE - 64);
        assert_eq!(tail_header.prev, Some(0));
        assert!(tiles_exactly(&list));
    }

    #[test]
    fn split_refuses_small_remainder() {
        let mut list = BlockList::new(HEADER_SIZE + 100);
        // tail payload would be 100 - 64 - 32 = 4 < MIN_BLOCK_SIZE
        assert_eq!(list.split(0, 64), None);
        // 100 - 56 - 32 = 12 is enough
        assert_eq!(list.split(0, 56), Some(HEADER_SIZE + 56));
        let mut list = BlockList::new(HEADER_SIZE + 100);
        // requested larger than the block must not underflow
        assert_eq!(list.split(0, 200), None);
        assert_eq!(list.header(0).size, 100);
    }

    #[test]
    fn coalesce_merges_both_neighbors() {
        let mut list = BlockList::new(4096);
        let a = allocate(&mut list, 64);
        let b = allocate(&mut list, 64);
        let c = allocate(&mut list, 64);
        assert_eq!(list.iter().count(), 4);

        release(&mut list, a);
        release(&mut list, c); // merges with the trailing free block
        assert_eq!(list.iter().count(), 3);

        let survivor = release(&mut list, b);
        assert_eq!(survivor, a);
        assert_eq!(list.iter().count(), 1);
        assert_eq!(list.header(0).size, 4096 - HEADER_SIZE);
        assert!(tiles_exactly(&list));
    }

    #[test]
    fn coalesce_leaves_allocated_block_alone() {
        let mut list = BlockList::new(1024);
        let a = allocate(&mut list, 64);
        assert_eq!(list.coalesce(a), a);
        assert!(list.header(a).allocated);
    }
}
