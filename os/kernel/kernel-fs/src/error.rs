use kernel_alloc::AllocError;

/// Errors reported by filesystem operations.
///
/// Every failing operation leaves the inode table and block pool unchanged,
/// except where an operation documents a partial effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FsError {
    #[error("no such file or directory")]
    NotFound,
    #[error("not a directory")]
    NotADirectory,
    #[error("not a regular file")]
    NotAFile,
    #[error("an entry with that name already exists")]
    AlreadyExists,
    #[error("directory is not empty")]
    DirectoryNotEmpty,
    #[error("the root directory cannot be removed")]
    RootDirectory,
    #[error("invalid name")]
    InvalidName,
    #[error("name exceeds {max} bytes")]
    NameTooLong { max: usize },
    #[error("path exceeds {max} bytes")]
    PathTooLong { max: usize },
    #[error("inode table is full")]
    InodeTableFull,
    #[error("data block pool is exhausted")]
    BlockPoolFull,
    #[error("heap allocation failed")]
    OutOfMemory(#[from] AllocError),
    #[error("buffer too small, {needed} bytes needed")]
    BufferTooSmall { needed: usize },
    #[error("seek position beyond end of file")]
    SeekOutOfRange,
    #[error("invalid or closed file handle")]
    InvalidHandle,
}
