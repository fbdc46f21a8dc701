/// Failure modes of the heap allocator.
///
/// None of these are fatal: the heap is left exactly as it was before the
/// failing call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    #[error("zero-sized allocation requested")]
    ZeroSize,
    #[error("allocation size overflows the address space")]
    SizeOverflow,
    #[error("out of memory ({requested} bytes requested)")]
    OutOfMemory { requested: usize },
    #[error("pointer does not refer to a live allocation")]
    InvalidPointer,
}
