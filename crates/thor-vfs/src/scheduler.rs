//! Scheduler collaborator interface.
//!
//! The VFS does not own file descriptors: the scheduler's per-process
//! handle table binds each descriptor to an absolute [`Path`]. The VFS only
//! asks it to register, look up and release handles, and for the working
//! directory used to resolve relative paths.

use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::vfs::Path;

/// What the VFS needs from the scheduler.
pub trait Scheduler: Send + Sync {
    /// Directory that relative paths are joined to.
    fn working_directory(&self) -> Path;

    fn has_handle(&self, fd: usize) -> bool;

    /// Path bound to `fd`, if any.
    fn get_handle(&self, fd: usize) -> Option<Path>;

    /// Bind a new descriptor to `path` and return it.
    fn register_new_handle(&self, path: Path) -> usize;

    fn release_handle(&self, fd: usize);
}

#[derive(Debug)]
struct Handles {
    next: usize,
    bound: BTreeMap<usize, Path>,
    working_directory: Path,
}

/// Single-process handle table.
///
/// Descriptors are handed out from 0 upward; released ids are not reused.
#[derive(Debug)]
pub struct HandleTable {
    inner: Mutex<Handles>,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    /// Empty table with `/` as working directory.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Handles {
                next: 0,
                bound: BTreeMap::new(),
                working_directory: Path::root(),
            }),
        }
    }

    pub fn set_working_directory(&self, path: Path) {
        self.inner.lock().working_directory = path;
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.inner.lock().bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().bound.is_empty()
    }
}

impl Scheduler for HandleTable {
    fn working_directory(&self) -> Path {
        self.inner.lock().working_directory.clone()
    }

    fn has_handle(&self, fd: usize) -> bool {
        self.inner.lock().bound.contains_key(&fd)
    }

    fn get_handle(&self, fd: usize) -> Option<Path> {
        self.inner.lock().bound.get(&fd).cloned()
    }

    fn register_new_handle(&self, path: Path) -> usize {
        let mut inner = self.inner.lock();
        let fd = inner.next;
        inner.next += 1;
        inner.bound.insert(fd, path);
        fd
    }

    fn release_handle(&self, fd: usize) {
        self.inner.lock().bound.remove(&fd);
    }
}
