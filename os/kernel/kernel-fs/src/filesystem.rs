//! # Filesystem
//!
//! [`Filesystem`] owns the inode table, the data block pool and the current
//! directory. Operations that touch file contents or handles borrow the heap
//! the blocks and handle records were allocated from.

use crate::block::BlockPool;
use crate::handle::{FileHandle, HandleState};
use crate::inode::{BlockId, DirEntry, FileInfo, Inode, InodeId, Name, NodeKind, Permissions};
use crate::path::{self, Component};
use crate::{FsError, seed};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use kernel_alloc::Heap;
use kernel_info::storage::{FS_BLOCK_SIZE, FS_EPOCH, FS_MAX_FILES};
use log::{debug, info, trace};

/// Aggregate usage, as shown by `df`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FsStats {
    pub total_files: usize,
    /// Includes the root directory.
    pub total_directories: usize,
    pub used_blocks: usize,
    pub free_blocks: usize,
    /// Capacity of the block pool in bytes.
    pub total_space: usize,
    pub used_space: usize,
    pub free_space: usize,
}

/// Sizes here never exceed one block.
fn narrow(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

pub struct Filesystem {
    inodes: Box<[Inode]>,
    blocks: BlockPool,
    cwd: InodeId,
    /// Logical clock for timestamps; advanced before every stamp.
    clock: u32,
    seeded: bool,
}

impl Filesystem {
    /// A filesystem holding only the root directory.
    #[must_use]
    pub fn new() -> Self {
        let mut fs = Self {
            inodes: vec![Inode::EMPTY; FS_MAX_FILES].into_boxed_slice(),
            blocks: BlockPool::new(),
            cwd: InodeId::ROOT,
            clock: FS_EPOCH,
            seeded: false,
        };
        fs.install_root();
        fs
    }

    /// Format and populate the standard tree. Only the first successful call
    /// has any effect.
    ///
    /// # Errors
    /// Propagates the first failure while populating, typically
    /// [`FsError::OutOfMemory`] when the heap cannot hold the starter files.
    pub fn initialize(&mut self, heap: &mut Heap) -> Result<(), FsError> {
        if self.seeded {
            return Ok(());
        }
        self.format(heap);
        seed::populate(self, heap)?;
        self.seeded = true;

        let stats = self.stats();
        info!(
            "filesystem initialized: {} directories, {} files",
            stats.total_directories, stats.total_files
        );
        Ok(())
    }

    /// Drop everything but the root directory and release every data block.
    ///
    /// Handles opened before the format stop working.
    pub fn format(&mut self, heap: &mut Heap) {
        for inode in &*self.inodes {
            if let Some(block) = inode.data_block.filter(|_| inode.valid) {
                self.blocks.free(heap, block);
            }
        }
        self.inodes.fill(Inode::EMPTY);
        self.install_root();
        info!("filesystem formatted");
    }

    fn install_root(&mut self) {
        let now = self.now();
        self.inodes[InodeId::ROOT.index()] = Inode {
            name: Name::root(),
            kind: NodeKind::Directory,
            size: 0,
            created_at: now,
            modified_at: now,
            permissions: Permissions::READ_WRITE_EXECUTE,
            parent: InodeId::ROOT,
            data_block: None,
            valid: true,
        };
        self.cwd = InodeId::ROOT;
    }

    const fn now(&mut self) -> u32 {
        self.clock = self.clock.wrapping_add(1);
        self.clock
    }

    fn node(&self, id: InodeId) -> Option<&Inode> {
        self.inodes.get(id.index()).filter(|n| n.valid)
    }

    /// Valid entries whose parent is `dir`, in table order.
    ///
    /// The root is its own parent but never its own child.
    fn children(&self, dir: InodeId) -> impl Iterator<Item = (InodeId, &Inode)> + '_ {
        self.inodes
            .iter()
            .enumerate()
            .skip(InodeId::ROOT.index() + 1)
            .filter(move |(_, n)| n.valid && n.parent == dir)
            .map(|(i, n)| (InodeId::from_index(i), n))
    }

    fn find_child(&self, dir: InodeId, name: &str) -> Option<InodeId> {
        self.children(dir)
            .find(|(_, n)| n.name == *name)
            .map(|(id, _)| id)
    }

    /// Resolve `path` to an inode.
    ///
    /// Absolute paths start at the root, all others at the current directory;
    /// an empty path names the current directory. `.` stays put and `..` moves
    /// to the parent, stopping at the root.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> Option<InodeId> {
        path::check_length(path).ok()?;
        let mut current = if path::is_absolute(path) {
            InodeId::ROOT
        } else {
            self.cwd
        };
        for component in path::components(path) {
            current = match component {
                Component::Current => current,
                Component::Parent => self.node(current)?.parent,
                Component::Named(name) => self.find_child(current, name)?,
            };
        }
        Some(current)
    }

    /// Validate a create request and pick the inode slot for it.
    fn prepare_create(&self, path: &str) -> Result<(InodeId, Name, InodeId), FsError> {
        path::check_length(path)?;
        let (parent_path, leaf) = path::split_parent(path);
        let name = Name::new(leaf)?;
        let parent = self.resolve_path(parent_path).ok_or(FsError::NotFound)?;
        if !self.inodes[parent.index()].is_directory() {
            return Err(FsError::NotADirectory);
        }
        if self.find_child(parent, leaf).is_some() {
            return Err(FsError::AlreadyExists);
        }
        let slot = self
            .inodes
            .iter()
            .enumerate()
            .skip(InodeId::ROOT.index() + 1)
            .find(|(_, n)| !n.valid)
            .map(|(i, _)| InodeId::from_index(i))
            .ok_or(FsError::InodeTableFull)?;
        Ok((parent, name, slot))
    }

    fn link(
        &mut self,
        slot: InodeId,
        parent: InodeId,
        name: Name,
        kind: NodeKind,
        data_block: Option<BlockId>,
    ) -> InodeId {
        let now = self.now();
        let permissions = match kind {
            NodeKind::File => Permissions::READ_WRITE,
            NodeKind::Directory => Permissions::READ_WRITE_EXECUTE,
        };
        self.inodes[slot.index()] = Inode {
            name,
            kind,
            size: 0,
            created_at: now,
            modified_at: now,
            permissions,
            parent,
            data_block,
            valid: true,
        };
        trace!("created {kind} {name} as inode {slot} under {parent}");
        slot
    }

    /// Create an empty directory.
    ///
    /// # Errors
    /// - [`FsError::NotFound`] / [`FsError::NotADirectory`] if the parent does
    ///   not exist or is a file.
    /// - [`FsError::AlreadyExists`] if the parent has an entry of that name.
    /// - [`FsError::InodeTableFull`], or a name or path validation error.
    pub fn create_directory(&mut self, path: &str) -> Result<InodeId, FsError> {
        let (parent, name, slot) = self
            .prepare_create(path)
            .inspect_err(|e| debug!("mkdir {path}: {e}"))?;
        Ok(self.link(slot, parent, name, NodeKind::Directory, None))
    }

    /// Create an empty file and reserve its data block.
    ///
    /// # Errors
    /// As [`create_directory`](Self::create_directory), plus
    /// [`FsError::BlockPoolFull`] or [`FsError::OutOfMemory`] when no data
    /// block can be reserved. Nothing is created in that case.
    pub fn create_file(&mut self, heap: &mut Heap, path: &str) -> Result<InodeId, FsError> {
        let created = self.prepare_create(path).and_then(|(parent, name, slot)| {
            let block = self.blocks.allocate(heap)?;
            Ok(self.link(slot, parent, name, NodeKind::File, Some(block)))
        });
        created.inspect_err(|e| debug!("create {path}: {e}"))
    }

    /// Resolve a removal target and check that it may go.
    fn removable(&self, path: &str) -> Result<InodeId, FsError> {
        path::check_length(path)?;
        let id = self.resolve_path(path).ok_or(FsError::NotFound)?;
        if id == InodeId::ROOT {
            return Err(FsError::RootDirectory);
        }
        if self.children(id).next().is_some() {
            return Err(FsError::DirectoryNotEmpty);
        }
        Ok(id)
    }

    fn unlink(&mut self, id: InodeId) -> Option<BlockId> {
        let inode = core::mem::replace(&mut self.inodes[id.index()], Inode::EMPTY);
        if self.cwd == id {
            self.cwd = inode.parent;
        }
        trace!("removed {} {} (inode {id})", inode.kind, inode.name);
        inode.data_block
    }

    /// Remove a file or an empty directory.
    ///
    /// Open handles on a removed file stop working. Removing the current
    /// directory moves the current directory to its parent.
    ///
    /// # Errors
    /// - [`FsError::NotFound`] if nothing is at `path`.
    /// - [`FsError::RootDirectory`] for the root.
    /// - [`FsError::DirectoryNotEmpty`] for a directory with entries.
    pub fn delete_file(&mut self, heap: &mut Heap, path: &str) -> Result<(), FsError> {
        let id = self
            .removable(path)
            .inspect_err(|e| debug!("rm {path}: {e}"))?;
        if let Some(block) = self.unlink(id) {
            self.blocks.free(heap, block);
        }
        Ok(())
    }

    /// Remove an empty directory.
    ///
    /// # Errors
    /// As [`delete_file`](Self::delete_file), plus [`FsError::NotADirectory`]
    /// if `path` names a file.
    pub fn remove_directory(&mut self, path: &str) -> Result<(), FsError> {
        let id = self
            .removable(path)
            .and_then(|id| {
                if self.inodes[id.index()].is_directory() {
                    Ok(id)
                } else {
                    Err(FsError::NotADirectory)
                }
            })
            .inspect_err(|e| debug!("rmdir {path}: {e}"))?;
        self.unlink(id);
        Ok(())
    }

    /// # Errors
    /// [`FsError::NotFound`] or [`FsError::NotADirectory`]; the current
    /// directory is unchanged then.
    pub fn change_directory(&mut self, path: &str) -> Result<(), FsError> {
        let id = self.resolve_path(path).ok_or(FsError::NotFound)?;
        if !self.inodes[id.index()].is_directory() {
            debug!("cd {path}: not a directory");
            return Err(FsError::NotADirectory);
        }
        self.cwd = id;
        Ok(())
    }

    #[must_use]
    pub const fn current_directory_id(&self) -> InodeId {
        self.cwd
    }

    /// Absolute path of the current directory.
    #[must_use]
    pub fn current_directory(&self) -> String {
        self.canonical_path(self.cwd)
            .unwrap_or_else(|| String::from("/"))
    }

    /// Write the absolute path of the current directory into `buffer` and
    /// return its length. No terminator is written.
    ///
    /// # Errors
    /// [`FsError::BufferTooSmall`] if the path does not fit; `buffer` is left
    /// untouched.
    pub fn current_directory_into(&self, buffer: &mut [u8]) -> Result<usize, FsError> {
        let path = self.current_directory();
        let target = buffer
            .get_mut(..path.len())
            .ok_or(FsError::BufferTooSmall { needed: path.len() })?;
        target.copy_from_slice(path.as_bytes());
        Ok(path.len())
    }

    /// Absolute path of a valid inode, built by walking the parent links.
    #[must_use]
    pub fn canonical_path(&self, id: InodeId) -> Option<String> {
        let mut names = Vec::new();
        let mut current = id;
        while current != InodeId::ROOT {
            let inode = self.node(current)?;
            names.push(inode.name);
            if names.len() > FS_MAX_FILES {
                return None;
            }
            current = inode.parent;
        }
        self.node(InodeId::ROOT)?;

        if names.is_empty() {
            return Some(String::from("/"));
        }
        let mut path = String::new();
        for name in names.iter().rev() {
            path.push('/');
            path.push_str(name.as_str());
        }
        Some(path)
    }

    /// Entries of the directory at `path` (the current directory for `None`),
    /// at most `max_entries` of them, in table order.
    ///
    /// # Errors
    /// [`FsError::NotFound`] or [`FsError::NotADirectory`].
    pub fn list_directory(
        &self,
        path: Option<&str>,
        max_entries: usize,
    ) -> Result<Vec<DirEntry>, FsError> {
        let dir = match path {
            Some(path) if !path.is_empty() => {
                self.resolve_path(path).ok_or(FsError::NotFound)?
            }
            _ => self.cwd,
        };
        if !self.inodes[dir.index()].is_directory() {
            return Err(FsError::NotADirectory);
        }
        Ok(self
            .children(dir)
            .take(max_entries)
            .map(|(_, n)| n.entry())
            .collect())
    }

    #[must_use]
    pub fn file_exists(&self, path: &str) -> bool {
        self.resolve_path(path).is_some()
    }

    /// # Errors
    /// [`FsError::NotFound`] if nothing is at `path`.
    pub fn stat(&self, path: &str) -> Result<FileInfo, FsError> {
        let id = self.resolve_path(path).ok_or(FsError::NotFound)?;
        self.node(id)
            .map(|n| n.info(id))
            .ok_or(FsError::NotFound)
    }

    /// Replace the recorded permission bits of an entry.
    ///
    /// # Errors
    /// [`FsError::NotFound`] if nothing is at `path`.
    pub fn set_permissions(
        &mut self,
        path: &str,
        permissions: Permissions,
    ) -> Result<(), FsError> {
        let id = self.resolve_path(path).ok_or(FsError::NotFound)?;
        let now = self.now();
        let inode = &mut self.inodes[id.index()];
        inode.permissions = permissions;
        inode.modified_at = now;
        Ok(())
    }

    /// Open the file at `path`, positioned at its start.
    ///
    /// # Errors
    /// - [`FsError::NotFound`] or [`FsError::NotAFile`].
    /// - [`FsError::OutOfMemory`] if the handle record cannot be allocated.
    pub fn open_file(
        &self,
        heap: &mut Heap,
        path: &str,
        write_mode: bool,
    ) -> Result<FileHandle, FsError> {
        let id = self.resolve_path(path).ok_or(FsError::NotFound)?;
        let inode = &self.inodes[id.index()];
        if !inode.is_file() {
            debug!("open {path}: not a file");
            return Err(FsError::NotAFile);
        }
        let handle = FileHandle::create(
            heap,
            HandleState {
                inode: id,
                position: 0,
                write_mode,
                created_at: inode.created_at,
            },
        )?;
        trace!("opened {path} (inode {id}, write={write_mode})");
        Ok(handle)
    }

    /// Release a handle's record.
    pub fn close_file(&self, heap: &mut Heap, handle: FileHandle) {
        if let Some((state, inode)) = self.handle_target(heap, &handle) {
            trace!("closing {} at position {}", inode.name, state.position);
        }
        handle.release(heap);
    }

    /// The handle's record together with the file it still refers to.
    fn handle_target(&self, heap: &Heap, handle: &FileHandle) -> Option<(HandleState, Inode)> {
        let state = handle.load(heap)?;
        self.node(state.inode)
            .filter(|n| n.is_file() && n.created_at == state.created_at)
            .map(|n| (state, *n))
    }

    /// Read from the handle's position into `buffer`, returning the number of
    /// bytes read. Returns 0 at end of file and for handles that are closed
    /// or whose file is gone.
    pub fn read_file(&self, heap: &mut Heap, handle: &FileHandle, buffer: &mut [u8]) -> usize {
        let Some((mut state, inode)) = self.handle_target(heap, handle) else {
            return 0;
        };
        let position = state.position as usize;
        let count = buffer
            .len()
            .min((inode.size as usize).saturating_sub(position));
        if count == 0 {
            return 0;
        }
        let Some(data) = inode.data_block.and_then(|b| self.blocks.data(heap, b)) else {
            return 0;
        };
        buffer[..count].copy_from_slice(&data[position..position + count]);

        state.position = narrow(position + count);
        handle.store(heap, state);
        trace!("read {count} bytes from {}", inode.name);
        count
    }

    /// Write `buffer` at the handle's position, returning the number of bytes
    /// written.
    ///
    /// A file is a single block: whatever would land past the block is
    /// dropped. Returns 0 for read-only, closed or stale handles.
    pub fn write_file(&mut self, heap: &mut Heap, handle: &FileHandle, buffer: &[u8]) -> usize {
        let Some((mut state, inode)) = self.handle_target(heap, handle) else {
            return 0;
        };
        if !state.write_mode {
            debug!("write to {} rejected: handle is read-only", inode.name);
            return 0;
        }
        let position = state.position as usize;
        let count = buffer.len().min(FS_BLOCK_SIZE.saturating_sub(position));
        if count == 0 {
            return 0;
        }
        let Some(block) = inode.data_block else {
            return 0;
        };
        let Some(data) = self.blocks.data_mut(heap, block) else {
            return 0;
        };
        data[position..position + count].copy_from_slice(&buffer[..count]);

        state.position = narrow(position + count);
        handle.store(heap, state);

        let now = self.now();
        let node = &mut self.inodes[state.inode.index()];
        node.size = node.size.max(state.position);
        node.modified_at = now;
        if count < buffer.len() {
            debug!(
                "write to {} truncated at the block boundary ({count} of {} bytes)",
                inode.name,
                buffer.len()
            );
        }
        count
    }

    /// Move the handle to `position`.
    ///
    /// # Errors
    /// - [`FsError::InvalidHandle`] for a closed or stale handle.
    /// - [`FsError::SeekOutOfRange`] past the end of the file.
    pub fn seek_file(
        &self,
        heap: &mut Heap,
        handle: &FileHandle,
        position: u32,
    ) -> Result<(), FsError> {
        let (mut state, inode) = self
            .handle_target(heap, handle)
            .ok_or(FsError::InvalidHandle)?;
        if position > inode.size {
            return Err(FsError::SeekOutOfRange);
        }
        state.position = position;
        handle.store(heap, state);
        Ok(())
    }

    /// Current position of a live handle.
    #[must_use]
    pub fn tell(&self, heap: &Heap, handle: &FileHandle) -> Option<u32> {
        self.handle_target(heap, handle).map(|(state, _)| state.position)
    }

    /// Whole contents of the file at `path`.
    ///
    /// # Errors
    /// As [`open_file`](Self::open_file).
    pub fn read_to_end(&self, heap: &mut Heap, path: &str) -> Result<Vec<u8>, FsError> {
        let handle = self.open_file(heap, path, false)?;
        let mut contents = vec![0; FS_BLOCK_SIZE];
        let count = self.read_file(heap, &handle, &mut contents);
        contents.truncate(count);
        self.close_file(heap, handle);
        Ok(contents)
    }

    /// Replace the contents of the file at `path`, creating it if needed.
    /// Returns the number of bytes stored, at most one block.
    ///
    /// # Errors
    /// As [`create_file`](Self::create_file) and [`open_file`](Self::open_file).
    pub fn write_all(
        &mut self,
        heap: &mut Heap,
        path: &str,
        contents: &[u8],
    ) -> Result<usize, FsError> {
        if !self.file_exists(path) {
            self.create_file(heap, path)?;
        }
        let handle = self.open_file(heap, path, true)?;
        if let Some((state, inode)) = self.handle_target(heap, &handle) {
            if let Some(block) = inode.data_block
                && let Some(data) = self.blocks.data_mut(heap, block)
            {
                data.fill(0);
            }
            self.inodes[state.inode.index()].size = 0;
        }
        let count = self.write_file(heap, &handle, contents);
        self.close_file(heap, handle);
        Ok(count)
    }

    /// Copy a file's contents into a new file at `destination`.
    ///
    /// # Errors
    /// - [`FsError::NotFound`] / [`FsError::NotAFile`] for the source.
    /// - Any [`create_file`](Self::create_file) error for the destination,
    ///   including [`FsError::AlreadyExists`].
    /// - [`FsError::OutOfMemory`] if the handles cannot be opened; the empty
    ///   destination is left in place.
    pub fn copy_file(
        &mut self,
        heap: &mut Heap,
        source: &str,
        destination: &str,
    ) -> Result<(), FsError> {
        let source_id = self.resolve_path(source).ok_or(FsError::NotFound)?;
        if !self.inodes[source_id.index()].is_file() {
            return Err(FsError::NotAFile);
        }
        self.create_file(heap, destination)?;

        let reader = self.open_file(heap, source, false)?;
        let writer = match self.open_file(heap, destination, true) {
            Ok(writer) => writer,
            Err(e) => {
                self.close_file(heap, reader);
                return Err(e);
            }
        };
        let mut buffer = [0u8; FS_BLOCK_SIZE];
        let read = self.read_file(heap, &reader, &mut buffer);
        let written = self.write_file(heap, &writer, &buffer[..read]);
        self.close_file(heap, reader);
        self.close_file(heap, writer);

        info!("copied {source} to {destination} ({written} bytes)");
        Ok(())
    }

    /// Copy, then delete the source. If the delete fails both files remain.
    ///
    /// # Errors
    /// As [`copy_file`](Self::copy_file) and [`delete_file`](Self::delete_file).
    pub fn move_file(
        &mut self,
        heap: &mut Heap,
        source: &str,
        destination: &str,
    ) -> Result<(), FsError> {
        self.copy_file(heap, source, destination)?;
        self.delete_file(heap, source)
    }

    /// Bytes still available in the block pool.
    #[must_use]
    pub fn free_space(&self) -> usize {
        self.blocks.available() * FS_BLOCK_SIZE
    }

    /// Bytes reserved by allocated blocks.
    #[must_use]
    pub fn used_space(&self) -> usize {
        self.blocks.used() * FS_BLOCK_SIZE
    }

    #[must_use]
    pub fn stats(&self) -> FsStats {
        let mut stats = FsStats::default();
        for inode in self.inodes.iter().filter(|n| n.valid) {
            match inode.kind {
                NodeKind::File => stats.total_files += 1,
                NodeKind::Directory => stats.total_directories += 1,
            }
        }
        stats.used_blocks = self.blocks.used();
        stats.free_blocks = self.blocks.available();
        stats.total_space = self.blocks.capacity() * FS_BLOCK_SIZE;
        stats.used_space = stats.used_blocks * FS_BLOCK_SIZE;
        stats.free_space = stats.free_blocks * FS_BLOCK_SIZE;
        stats
    }
}

impl Default for Filesystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_filesystem_is_just_root() {
        let fs = Filesystem::new();
        assert_eq!(fs.resolve_path("/"), Some(InodeId::ROOT));
        assert_eq!(fs.resolve_path(""), Some(InodeId::ROOT));
        assert_eq!(fs.current_directory(), "/");
        assert!(fs.list_directory(None, 16).unwrap().is_empty());
        let root = fs.stat("/").unwrap();
        assert_eq!(root.name.as_str(), "/");
        assert_eq!(root.parent, InodeId::ROOT);
        assert_eq!(root.created_at, FS_EPOCH + 1);
    }

    #[test]
    fn timestamps_increase() {
        let mut fs = Filesystem::new();
        let a = fs.create_directory("/a").unwrap();
        let b = fs.create_directory("/b").unwrap();
        let a = fs.node(a).unwrap().created_at;
        let b = fs.node(b).unwrap().created_at;
        assert!(b > a);
    }

    #[test]
    fn inode_slots_are_reused_from_the_bottom() {
        let mut fs = Filesystem::new();
        let a = fs.create_directory("/a").unwrap();
        assert_eq!(a.get(), 2);
        fs.create_directory("/b").unwrap();
        fs.remove_directory("/a").unwrap();
        assert_eq!(fs.create_directory("/c").unwrap(), a);
    }

    #[test]
    fn inode_table_fills_up() {
        let mut fs = Filesystem::new();
        for i in 0..FS_MAX_FILES - 2 {
            fs.create_directory(&format!("/d{i}")).unwrap();
        }
        assert_eq!(fs.create_directory("/last"), Err(FsError::InodeTableFull));
    }

    #[test]
    fn removing_the_current_directory_moves_to_parent() {
        let mut fs = Filesystem::new();
        fs.create_directory("/a").unwrap();
        fs.create_directory("/a/b").unwrap();
        fs.change_directory("/a/b").unwrap();
        fs.remove_directory("/a/b").unwrap();
        assert_eq!(fs.current_directory(), "/a");
    }
}
