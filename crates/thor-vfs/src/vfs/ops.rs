//! File system backend trait.
//!
//! Every backend (disk, sysfs, devfs, procfs) implements [`FileSystem`].
//! Paths handed to a backend are always relative to its mount point: the
//! [`MountTable`](super::MountTable) strips the mount prefix first, so the
//! mount point itself arrives as the root path.

use thor_types::StatFsInfo;

use super::path::Path;
use super::types::File;
use super::{VfsError, VfsResult};

/// Capability contract of a mounted file system.
///
/// Backends are called synchronously and may be shared across threads, so
/// mutable state lives behind interior locks.
pub trait FileSystem: Send + Sync {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Finish initialization once the backend is in the mount table.
    fn init(&mut self) -> VfsResult<()> {
        Ok(())
    }

    /// Capacity and free space.
    fn statfs(&self) -> VfsResult<StatFsInfo>;

    // ========================================================================
    // Reading
    // ========================================================================

    /// Metadata of a single entry.
    fn get_file(&self, path: &Path) -> VfsResult<File>;

    /// Entries of a directory.
    fn ls(&self, path: &Path) -> VfsResult<Vec<File>>;

    /// Read into `buffer` starting at `offset`.
    ///
    /// Returns the number of bytes read, fewer than requested at EOF.
    fn read(&self, path: &Path, buffer: &mut [u8], offset: u64) -> VfsResult<usize>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Create an empty file.
    fn touch(&self, path: &Path) -> VfsResult<()>;

    fn mkdir(&self, path: &Path) -> VfsResult<()>;

    /// Remove a file or an empty directory.
    fn rm(&self, path: &Path) -> VfsResult<()>;

    /// Write `buffer` at `offset`, returning the number of bytes written.
    fn write(&self, path: &Path, buffer: &[u8], offset: u64) -> VfsResult<usize>;

    /// Zero `count` bytes at `offset`, returning the number cleared.
    fn clear(&self, path: &Path, count: usize, offset: u64) -> VfsResult<usize>;

    /// Resize a file.
    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    fn exists(&self, path: &Path) -> bool {
        self.get_file(path).is_ok()
    }

    /// Read entire file contents.
    fn read_all(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let file = self.get_file(path)?;
        let mut buffer = zeroed_buffer(file.size)?;
        let read = self.read(path, &mut buffer, 0)?;
        buffer.truncate(read);
        Ok(buffer)
    }
}

/// Zeroed buffer for a file of `size` bytes as reported by a backend.
///
/// A size that does not fit in memory is an `InvalidCount`, never a panic.
pub(crate) fn zeroed_buffer(size: u64) -> VfsResult<Vec<u8>> {
    let len = usize::try_from(size).map_err(|_| VfsError::InvalidCount(size))?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| VfsError::InvalidCount(size))?;
    buffer.resize(len, 0);
    Ok(buffer)
}
