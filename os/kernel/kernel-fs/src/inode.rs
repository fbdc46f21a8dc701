//! # Inodes
//!
//! An inode is one slot of the fixed inode table. Slot 0 is never used so
//! that a zero id can be told apart from a real one, and slot 1 always holds
//! the root directory.

use crate::FsError;
use bitfield_struct::bitfield;
use core::fmt;
use kernel_info::storage::FS_MAX_NAME_LENGTH;

/// Index of an inode in the inode table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InodeId(u32);

impl InodeId {
    /// The root directory. It is its own parent.
    pub const ROOT: Self = Self(1);

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for InodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a data block in the block pool. Block 0 is never handed out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl BlockId {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::File => "file",
            Self::Directory => "dir",
        })
    }
}

/// Recorded access bits. They are reported but never enforced.
///
/// Layout (LSB→MSB):
/// - bit 0: read
/// - bit 1: write
/// - bit 2: execute
/// - bits 3..7: reserved
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
    #[bits(5)]
    __: u8,
}

impl Permissions {
    /// Default for new files.
    pub const READ_WRITE: Self = Self::new().with_read(true).with_write(true);

    /// Default for new directories.
    pub const READ_WRITE_EXECUTE: Self = Self::READ_WRITE.with_execute(true);
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read(), 'r'),
            flag(self.write(), 'w'),
            flag(self.execute(), 'x')
        )
    }
}

/// A validated entry name stored inline.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Name {
    len: u8,
    bytes: [u8; FS_MAX_NAME_LENGTH],
}

impl Name {
    /// Validate `name` for use as a directory entry.
    ///
    /// # Errors
    /// - [`FsError::InvalidName`] if `name` is empty, `.`, `..` or contains `/`.
    /// - [`FsError::NameTooLong`] if `name` exceeds the name limit.
    pub fn new(name: &str) -> Result<Self, FsError> {
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(FsError::InvalidName);
        }
        if name.len() > FS_MAX_NAME_LENGTH {
            return Err(FsError::NameTooLong {
                max: FS_MAX_NAME_LENGTH,
            });
        }
        Ok(Self::from_bytes(name.as_bytes()))
    }

    /// The root directory's name, which no user-created entry can have.
    pub(crate) const fn root() -> Self {
        Self::from_bytes(b"/")
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn from_bytes(src: &[u8]) -> Self {
        let mut bytes = [0; FS_MAX_NAME_LENGTH];
        let mut i = 0;
        while i < src.len() {
            bytes[i] = src[i];
            i += 1;
        }
        Self {
            len: src.len() as u8,
            bytes,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ever built from a `&str` that fits.
        core::str::from_utf8(&self.bytes[..usize::from(self.len)]).unwrap_or_default()
    }
}

const _: () = assert!(FS_MAX_NAME_LENGTH <= u8::MAX as usize);

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One slot of the inode table.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Inode {
    pub name: Name,
    pub kind: NodeKind,
    pub size: u32,
    pub created_at: u32,
    pub modified_at: u32,
    pub permissions: Permissions,
    pub parent: InodeId,
    pub data_block: Option<BlockId>,
    pub valid: bool,
}

impl Inode {
    pub(crate) const EMPTY: Self = Self {
        name: Name::from_bytes(b""),
        kind: NodeKind::File,
        size: 0,
        created_at: 0,
        modified_at: 0,
        permissions: Permissions::new(),
        parent: InodeId::ROOT,
        data_block: None,
        valid: false,
    };

    pub(crate) const fn is_file(&self) -> bool {
        self.valid && matches!(self.kind, NodeKind::File)
    }

    pub(crate) const fn is_directory(&self) -> bool {
        self.valid && matches!(self.kind, NodeKind::Directory)
    }

    pub(crate) const fn info(&self, id: InodeId) -> FileInfo {
        FileInfo {
            id,
            name: self.name,
            kind: self.kind,
            size: self.size,
            created_at: self.created_at,
            modified_at: self.modified_at,
            permissions: self.permissions,
            parent: self.parent,
            data_block: self.data_block,
        }
    }

    pub(crate) const fn entry(&self) -> DirEntry {
        DirEntry {
            name: self.name,
            kind: self.kind,
            size: self.size,
            permissions: self.permissions,
        }
    }
}

/// Everything known about one inode, as returned by `stat`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub id: InodeId,
    pub name: Name,
    pub kind: NodeKind,
    /// Bytes of content; always 0 for directories.
    pub size: u32,
    pub created_at: u32,
    pub modified_at: u32,
    pub permissions: Permissions,
    pub parent: InodeId,
    pub data_block: Option<BlockId>,
}

/// One line of a directory listing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: Name,
    pub kind: NodeKind,
    pub size: u32,
    pub permissions: Permissions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_validated() {
        assert_eq!(Name::new("readme.txt").unwrap().as_str(), "readme.txt");
        assert_eq!(Name::new(""), Err(FsError::InvalidName));
        assert_eq!(Name::new("."), Err(FsError::InvalidName));
        assert_eq!(Name::new(".."), Err(FsError::InvalidName));
        assert_eq!(Name::new("a/b"), Err(FsError::InvalidName));
    }

    #[test]
    fn name_length_boundary() {
        let longest = "n".repeat(FS_MAX_NAME_LENGTH);
        assert_eq!(Name::new(&longest).unwrap().as_str(), longest);
        assert_eq!(
            Name::new(&format!("{longest}n")),
            Err(FsError::NameTooLong {
                max: FS_MAX_NAME_LENGTH
            })
        );
    }

    #[test]
    fn permissions_render_like_ls() {
        assert_eq!(Permissions::READ_WRITE.to_string(), "rw-");
        assert_eq!(Permissions::READ_WRITE_EXECUTE.to_string(), "rwx");
        assert_eq!(Permissions::new().with_execute(true).into_bits(), 0b100);
    }
}
