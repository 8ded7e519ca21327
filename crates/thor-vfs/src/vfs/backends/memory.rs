//! In-memory file system backend.
//!
//! Stands in for the disk file system when no block device driver is
//! plugged in, and backs most tests. All data is lost when dropped.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use thor_types::{DateTime, StatFsInfo};

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::FileSystem;
use crate::vfs::path::Path;
use crate::vfs::types::{self, File};

/// Default capacity of a memory file system (64 MiB).
pub const DEFAULT_CAPACITY: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
struct Times {
    created: DateTime,
    modified: DateTime,
    accessed: DateTime,
}

impl Times {
    fn now() -> Self {
        let now = types::now();
        Self {
            created: now,
            modified: now,
            accessed: now,
        }
    }
}

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, times: Times },
    Directory { times: Times },
}

impl Entry {
    fn to_file(&self, name: &str) -> File {
        match self {
            Entry::File { data, times } => File {
                file_name: name.to_string(),
                size: data.len() as u64,
                created: times.created,
                modified: times.modified,
                accessed: times.accessed,
                ..Default::default()
            },
            Entry::Directory { times } => File {
                file_name: name.to_string(),
                directory: true,
                created: times.created,
                modified: times.modified,
                accessed: times.accessed,
                ..Default::default()
            },
        }
    }
}

/// In-memory filesystem backend.
///
/// Entries are keyed by their component list; the root (empty key) always
/// exists. Parents must exist before children are created.
#[derive(Debug)]
pub struct MemoryFs {
    device: String,
    capacity: u64,
    entries: RwLock<BTreeMap<Vec<String>, Entry>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        Self::with_device("none")
    }

    /// Create a filesystem standing in for `device`.
    pub fn with_device(device: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(Vec::new(), Entry::Directory { times: Times::now() });
        Self {
            device: device.into(),
            capacity: DEFAULT_CAPACITY,
            entries: RwLock::new(entries),
        }
    }

    /// Limit the total number of file bytes.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    fn used(entries: &BTreeMap<Vec<String>, Entry>) -> u64 {
        entries
            .values()
            .map(|e| match e {
                Entry::File { data, .. } => data.len() as u64,
                Entry::Directory { .. } => 0,
            })
            .sum()
    }

    /// Fail unless the parent of `path` is an existing directory.
    fn check_parent(entries: &BTreeMap<Vec<String>, Entry>, path: &Path) -> VfsResult<()> {
        let parent = path.parent();
        match entries.get(parent.names()) {
            Some(Entry::Directory { .. }) => Ok(()),
            Some(Entry::File { .. }) => Err(VfsError::not_a_directory(parent.to_string())),
            None => Err(VfsError::not_exists(parent.to_string())),
        }
    }

    fn create(&self, path: &Path, entry: Entry) -> VfsResult<()> {
        let mut entries = self.entries.write();
        if entries.contains_key(path.names()) {
            return Err(VfsError::exists(path.to_string()));
        }
        Self::check_parent(&entries, path)?;
        entries.insert(path.names().to_vec(), entry);
        Ok(())
    }

    /// Room left for `extra` more bytes?
    fn check_space(&self, entries: &BTreeMap<Vec<String>, Entry>, extra: u64) -> VfsResult<()> {
        if Self::used(entries).saturating_add(extra) > self.capacity {
            return Err(VfsError::DiskFull);
        }
        Ok(())
    }
}

/// `offset` as an index into a buffer of `len` bytes, pinned at EOF.
fn clamp_offset(offset: u64, len: usize) -> usize {
    usize::try_from(offset).map_or(len, |offset| offset.min(len))
}

impl FileSystem for MemoryFs {
    fn statfs(&self) -> VfsResult<StatFsInfo> {
        let entries = self.entries.read();
        Ok(StatFsInfo {
            total_size: self.capacity,
            free_size: self.capacity.saturating_sub(Self::used(&entries)),
        })
    }

    fn get_file(&self, path: &Path) -> VfsResult<File> {
        let entries = self.entries.read();
        entries
            .get(path.names())
            .map(|e| e.to_file(path.base_name().unwrap_or("")))
            .ok_or_else(|| VfsError::not_exists(path.to_string()))
    }

    fn ls(&self, path: &Path) -> VfsResult<Vec<File>> {
        let entries = self.entries.read();

        match entries.get(path.names()) {
            Some(Entry::Directory { .. }) => {}
            Some(Entry::File { .. }) => return Err(VfsError::not_a_directory(path.to_string())),
            None => return Err(VfsError::not_exists(path.to_string())),
        }

        // Direct children only, in name order
        let depth = path.len();
        Ok(entries
            .iter()
            .filter(|(key, _)| key.len() == depth + 1 && key.starts_with(path.names()))
            .map(|(key, entry)| entry.to_file(&key[depth]))
            .collect())
    }

    fn read(&self, path: &Path, buffer: &mut [u8], offset: u64) -> VfsResult<usize> {
        let mut entries = self.entries.write();

        match entries.get_mut(path.names()) {
            Some(Entry::File { data, times }) => {
                let start = clamp_offset(offset, data.len());
                let end = start + buffer.len().min(data.len() - start);
                buffer[..end - start].copy_from_slice(&data[start..end]);
                times.accessed = types::now();
                Ok(end - start)
            }
            Some(Entry::Directory { .. }) => Err(VfsError::directory(path.to_string())),
            None => Err(VfsError::not_exists(path.to_string())),
        }
    }

    fn touch(&self, path: &Path) -> VfsResult<()> {
        self.create(
            path,
            Entry::File {
                data: Vec::new(),
                times: Times::now(),
            },
        )
    }

    fn mkdir(&self, path: &Path) -> VfsResult<()> {
        self.create(path, Entry::Directory { times: Times::now() })
    }

    fn rm(&self, path: &Path) -> VfsResult<()> {
        if path.is_root() {
            return Err(VfsError::permission_denied("cannot remove root"));
        }

        let mut entries = self.entries.write();
        match entries.get(path.names()) {
            Some(Entry::Directory { .. }) => {
                let has_children = entries
                    .keys()
                    .any(|k| k.len() > path.len() && k.starts_with(path.names()));
                if has_children {
                    return Err(VfsError::directory_not_empty(path.to_string()));
                }
            }
            Some(Entry::File { .. }) => {}
            None => return Err(VfsError::not_exists(path.to_string())),
        }

        entries.remove(path.names());
        Ok(())
    }

    fn write(&self, path: &Path, buffer: &[u8], offset: u64) -> VfsResult<usize> {
        let mut entries = self.entries.write();

        let current = match entries.get(path.names()) {
            Some(Entry::File { data, .. }) => data.len() as u64,
            Some(Entry::Directory { .. }) => return Err(VfsError::directory(path.to_string())),
            None => return Err(VfsError::not_exists(path.to_string())),
        };
        let end = offset
            .checked_add(buffer.len() as u64)
            .ok_or(VfsError::InvalidOffset(offset))?;
        self.check_space(&entries, end.saturating_sub(current))?;
        let (Ok(start), Ok(end)) = (usize::try_from(offset), usize::try_from(end)) else {
            return Err(VfsError::InvalidOffset(offset));
        };

        if let Some(Entry::File { data, times }) = entries.get_mut(path.names()) {
            // Extend if necessary
            if end > data.len() {
                data.resize(end, 0);
            }
            data[start..end].copy_from_slice(buffer);
            times.modified = types::now();
        }
        Ok(buffer.len())
    }

    fn clear(&self, path: &Path, count: usize, offset: u64) -> VfsResult<usize> {
        let mut entries = self.entries.write();

        match entries.get_mut(path.names()) {
            Some(Entry::File { data, times }) => {
                let start = clamp_offset(offset, data.len());
                let end = start + count.min(data.len() - start);
                data[start..end].fill(0);
                times.modified = types::now();
                Ok(end - start)
            }
            Some(Entry::Directory { .. }) => Err(VfsError::directory(path.to_string())),
            None => Err(VfsError::not_exists(path.to_string())),
        }
    }

    fn truncate(&self, path: &Path, size: u64) -> VfsResult<()> {
        let mut entries = self.entries.write();

        let current = match entries.get(path.names()) {
            Some(Entry::File { data, .. }) => data.len() as u64,
            Some(Entry::Directory { .. }) => return Err(VfsError::directory(path.to_string())),
            None => return Err(VfsError::not_exists(path.to_string())),
        };
        self.check_space(&entries, size.saturating_sub(current))?;

        if let Some(Entry::File { data, times }) = entries.get_mut(path.names()) {
            data.resize(size as usize, 0);
            times.modified = types::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::new(s)
    }

    #[test]
    fn test_touch_write_read() {
        let fs = MemoryFs::new();
        fs.touch(&p("/test.txt")).unwrap();
        assert_eq!(fs.write(&p("/test.txt"), b"hello world", 0).unwrap(), 11);

        let mut buf = [0u8; 100];
        let n = fs.read(&p("/test.txt"), &mut buf, 0).unwrap();
        assert_eq!(&buf[..n], b"hello world");
    }

    #[test]
    fn test_partial_read() {
        let fs = MemoryFs::new();
        fs.touch(&p("/test.txt")).unwrap();
        fs.write(&p("/test.txt"), b"hello world", 0).unwrap();

        let mut buf = [0u8; 5];
        assert_eq!(fs.read(&p("/test.txt"), &mut buf, 6).unwrap(), 5);
        assert_eq!(&buf, b"world");
        // Past EOF reads nothing
        assert_eq!(fs.read(&p("/test.txt"), &mut buf, 100).unwrap(), 0);
    }

    #[test]
    fn test_write_at_offset_extends() {
        let fs = MemoryFs::new();
        fs.touch(&p("/f")).unwrap();
        fs.write(&p("/f"), b"xy", 4).unwrap();
        assert_eq!(fs.read_all(&p("/f")).unwrap(), b"\0\0\0\0xy");
        assert_eq!(fs.get_file(&p("/f")).unwrap().size, 6);
    }

    #[test]
    fn test_mkdir_and_ls() {
        let fs = MemoryFs::new();
        fs.mkdir(&p("/subdir")).unwrap();
        fs.touch(&p("/subdir/file.txt")).unwrap();
        fs.touch(&p("/root.txt")).unwrap();

        let names: Vec<_> = fs
            .ls(&Path::root())
            .unwrap()
            .into_iter()
            .map(|f| f.file_name)
            .collect();
        assert_eq!(names, vec!["root.txt", "subdir"]);

        let sub = fs.ls(&p("/subdir")).unwrap();
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0].file_name, "file.txt");
        assert!(!sub[0].directory);
    }

    #[test]
    fn test_parent_must_exist() {
        let fs = MemoryFs::new();
        assert!(matches!(fs.touch(&p("/a/b.txt")), Err(VfsError::NotExists(_))));
        fs.touch(&p("/a")).unwrap();
        assert!(matches!(fs.touch(&p("/a/b.txt")), Err(VfsError::NotADirectory(_))));
    }

    #[test]
    fn test_touch_existing() {
        let fs = MemoryFs::new();
        fs.touch(&p("/x")).unwrap();
        assert!(matches!(fs.touch(&p("/x")), Err(VfsError::Exists(_))));
        assert!(matches!(fs.mkdir(&p("/x")), Err(VfsError::Exists(_))));
    }

    #[test]
    fn test_rm() {
        let fs = MemoryFs::new();
        fs.mkdir(&p("/dir")).unwrap();
        fs.touch(&p("/dir/f")).unwrap();

        assert!(matches!(fs.rm(&p("/dir")), Err(VfsError::DirectoryNotEmpty(_))));
        fs.rm(&p("/dir/f")).unwrap();
        fs.rm(&p("/dir")).unwrap();
        assert!(!fs.exists(&p("/dir")));
        assert!(matches!(fs.rm(&p("/dir")), Err(VfsError::NotExists(_))));
        assert!(matches!(fs.rm(&Path::root()), Err(VfsError::PermissionDenied(_))));
    }

    #[test]
    fn test_read_directory_fails() {
        let fs = MemoryFs::new();
        let mut buf = [0u8; 8];
        assert!(matches!(
            fs.read(&Path::root(), &mut buf, 0),
            Err(VfsError::Directory(_))
        ));
        assert!(fs.get_file(&Path::root()).unwrap().directory);
    }

    #[test]
    fn test_clear_and_truncate() {
        let fs = MemoryFs::new();
        fs.touch(&p("/f")).unwrap();
        fs.write(&p("/f"), b"abcdef", 0).unwrap();

        assert_eq!(fs.clear(&p("/f"), 2, 1).unwrap(), 2);
        assert_eq!(fs.read_all(&p("/f")).unwrap(), b"a\0\0def");
        // Clamped at EOF
        assert_eq!(fs.clear(&p("/f"), 10, 4).unwrap(), 2);

        fs.truncate(&p("/f"), 2).unwrap();
        assert_eq!(fs.read_all(&p("/f")).unwrap(), b"a\0");
        fs.truncate(&p("/f"), 4).unwrap();
        assert_eq!(fs.get_file(&p("/f")).unwrap().size, 4);
    }

    #[test]
    fn test_statfs_and_disk_full() {
        let fs = MemoryFs::new().with_capacity(8);
        fs.touch(&p("/f")).unwrap();
        fs.write(&p("/f"), b"12345", 0).unwrap();

        let info = fs.statfs().unwrap();
        assert_eq!(info.total_size, 8);
        assert_eq!(info.free_size, 3);

        assert!(matches!(fs.write(&p("/f"), b"6789", 5), Err(VfsError::DiskFull)));
        // Overwriting in place needs no space
        fs.write(&p("/f"), b"abc", 0).unwrap();
        assert!(matches!(fs.truncate(&p("/f"), 9), Err(VfsError::DiskFull)));
    }

    #[test]
    fn test_huge_offsets_and_counts() {
        let fs = MemoryFs::new();
        fs.touch(&p("/f")).unwrap();
        fs.write(&p("/f"), b"abcdef", 0).unwrap();

        assert!(matches!(
            fs.write(&p("/f"), b"ab", u64::MAX),
            Err(VfsError::InvalidOffset(u64::MAX))
        ));
        assert!(matches!(
            fs.write(&p("/f"), b"a", u64::MAX - 1),
            Err(VfsError::DiskFull)
        ));
        assert!(matches!(fs.truncate(&p("/f"), u64::MAX), Err(VfsError::DiskFull)));

        assert_eq!(fs.clear(&p("/f"), usize::MAX, 1).unwrap(), 5);
        assert_eq!(fs.clear(&p("/f"), usize::MAX, u64::MAX).unwrap(), 0);
        assert_eq!(fs.read_all(&p("/f")).unwrap(), b"a\0\0\0\0\0");

        let mut buf = [0xAAu8; 4];
        assert_eq!(fs.read(&p("/f"), &mut buf, u64::MAX).unwrap(), 0);
        assert_eq!(buf, [0xAA; 4]);
    }
}
