//! # Filesystem Limits

/// Size of a single data block in bytes.
///
/// A file owns at most one block, so this is also the largest file size.
pub const FS_BLOCK_SIZE: usize = 512;

/// Number of slots in the block pool. Slot `0` means "no block".
pub const FS_MAX_BLOCKS: usize = 1024;

/// Number of slots in the inode table. Slot `0` is unused, slot `1` is the root.
pub const FS_MAX_FILES: usize = 256;

/// Longest accepted file or directory name, in bytes.
pub const FS_MAX_NAME_LENGTH: usize = 64;

/// Longest accepted path, in bytes.
pub const FS_MAX_PATH_LENGTH: usize = 256;

/// First value of the filesystem's logical clock.
pub const FS_EPOCH: u32 = 1000;

const _: () = {
    assert!(FS_MAX_BLOCKS >= 2);
    assert!(FS_MAX_FILES >= 2);
    assert!(FS_MAX_NAME_LENGTH < FS_MAX_PATH_LENGTH);
    assert!(FS_BLOCK_SIZE <= u32::MAX as usize);
};
