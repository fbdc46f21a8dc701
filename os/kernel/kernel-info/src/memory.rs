//! # Heap Layout

/// Capacity of the heap arena.
pub const HEAP_SIZE: usize = 16 * 1024 * 1024; // 16 MiB

/// Alignment of the arena's backing storage.
pub const HEAP_ALIGNMENT: usize = 4096;

/// Every allocation request is rounded up to a multiple of this.
pub const ALLOCATION_ALIGNMENT: usize = 8;

const _: () = {
    assert!(HEAP_ALIGNMENT.is_power_of_two());
    assert!(ALLOCATION_ALIGNMENT.is_power_of_two());
    assert!(HEAP_SIZE.is_multiple_of(HEAP_ALIGNMENT));
};
