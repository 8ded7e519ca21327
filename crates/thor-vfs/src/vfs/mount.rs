//! VFS mount table with longest-prefix routing.
//!
//! Routes paths to the backend mounted at their most specific mount point
//! and rewrites them into backend-relative form.

use std::fmt;

use super::error::{VfsError, VfsResult};
use super::ops::FileSystem;
use super::path::Path;
use super::types::PartitionType;

/// One mounted file system.
///
/// The entry owns its backend: dropping the entry disposes of it.
pub struct MountEntry {
    kind: PartitionType,
    device: String,
    mount_point: String,
    components: Vec<String>,
    fs: Box<dyn FileSystem>,
}

impl MountEntry {
    pub fn new(
        kind: PartitionType,
        mount_point: impl Into<String>,
        device: impl Into<String>,
        fs: Box<dyn FileSystem>,
    ) -> Self {
        let mount_point = mount_point.into();
        let components = Path::new(&mount_point).names().to_vec();
        Self {
            kind,
            device: device.into(),
            mount_point,
            components,
            fs,
        }
    }

    pub fn kind(&self) -> PartitionType {
        self.kind
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Mount point exactly as it was given at mount time (e.g. `"/sys/"`).
    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    /// Decomposed mount point used for matching.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub(crate) fn fs_mut(&mut self) -> &mut dyn FileSystem {
        self.fs.as_mut()
    }

    fn is_root(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Debug for MountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountEntry")
            .field("kind", &self.kind)
            .field("device", &self.device)
            .field("mount_point", &self.mount_point)
            .finish_non_exhaustive()
    }
}

/// A path routed to its mount.
#[derive(Debug)]
pub struct Resolved<'a> {
    pub entry: &'a MountEntry,
    /// The path with the mount prefix removed.
    pub path: Path,
}

impl Resolved<'_> {
    pub fn fs(&self) -> &dyn FileSystem {
        self.entry.fs()
    }
}

/// The set of live mounts, in mount order.
///
/// Mount points are matched by longest prefix. If `/` and `/dev/` are both
/// mounted, `/dev/null` is routed to `/dev/` as `/null`, while `/home/a`
/// goes to `/` unchanged.
#[derive(Debug, Default)]
pub struct MountTable {
    entries: Vec<MountEntry>,
}

impl MountTable {
    /// Create a new empty mount table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MountEntry> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, MountEntry> {
        self.entries.iter_mut()
    }

    /// Index of the entry mounted at `mount_point`, compared component-wise.
    fn position(&self, mount_point: &str) -> Option<usize> {
        let components = Path::new(mount_point);
        self.entries
            .iter()
            .position(|e| e.components.as_slice() == components.names())
    }

    pub fn is_mounted(&self, mount_point: &str) -> bool {
        self.position(mount_point).is_some()
    }

    /// Append a mount.
    ///
    /// Fails with `AlreadyMounted` when the mount point is taken.
    pub fn add(&mut self, entry: MountEntry) -> VfsResult<&mut MountEntry> {
        if self.is_mounted(&entry.mount_point) {
            return Err(VfsError::AlreadyMounted(entry.mount_point));
        }
        self.entries.push(entry);
        let index = self.entries.len() - 1;
        Ok(&mut self.entries[index])
    }

    /// Drop the most recent mount, whatever it is. Used to roll back a
    /// mount whose backend failed to initialize.
    pub(crate) fn discard_last(&mut self) -> Option<MountEntry> {
        self.entries.pop()
    }

    /// Remove the mount at `mount_point` and hand back its entry.
    ///
    /// The root mount stays: it is the fallback for every path.
    pub fn remove(&mut self, mount_point: &str) -> VfsResult<MountEntry> {
        let index = self
            .position(mount_point)
            .ok_or(VfsError::NothingMounted)?;
        if self.entries[index].is_root() {
            return Err(VfsError::permission_denied("cannot unmount root"));
        }
        Ok(self.entries.remove(index))
    }

    /// Find the mount for an absolute path.
    ///
    /// Returns the deepest mount whose components prefix the path, along
    /// with the backend-relative remainder. On equal depth the earliest
    /// mount wins. `None` only when nothing at all matches, which cannot
    /// happen once `/` is mounted.
    pub fn resolve(&self, path: &Path) -> Option<Resolved<'_>> {
        if path.is_root() {
            if let Some(entry) = self.entries.iter().find(|e| e.is_root()) {
                return Some(Resolved {
                    entry,
                    path: Path::root(),
                });
            }
        }

        let mut best: Option<&MountEntry> = None;
        for entry in &self.entries {
            if path.starts_with(&entry.components)
                && best.is_none_or(|b| entry.components.len() > b.components.len())
            {
                best = Some(entry);
            }
        }

        let entry = best?;
        let remainder = path.sub_path(entry.components.len());
        tracing::trace!(%path, mount = %entry.mount_point, fs_path = %remainder, "vfs: resolved");
        Some(Resolved {
            entry,
            path: remainder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::backends::MemoryFs;

    fn entry(kind: PartitionType, mount_point: &str) -> MountEntry {
        MountEntry::new(kind, mount_point, "none", Box::new(MemoryFs::new()))
    }

    fn table(mounts: &[&str]) -> MountTable {
        let mut table = MountTable::new();
        for mp in mounts {
            table.add(entry(PartitionType::Fat32, mp)).unwrap();
        }
        table
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = table(&["/", "/dev/"]);
        let resolved = table.resolve(&Path::new("/dev/null")).unwrap();
        assert_eq!(resolved.entry.mount_point(), "/dev/");
        assert_eq!(resolved.path, Path::new("/null"));

        let resolved = table.resolve(&Path::new("/home/a")).unwrap();
        assert_eq!(resolved.entry.mount_point(), "/");
        assert_eq!(resolved.path, Path::new("/home/a"));
    }

    #[test]
    fn test_nested_mounts() {
        let table = table(&["/", "/mnt/", "/mnt/project/"]);

        let resolved = table.resolve(&Path::new("/mnt/outer.txt")).unwrap();
        assert_eq!(resolved.entry.mount_point(), "/mnt/");
        assert_eq!(resolved.path, Path::new("/outer.txt"));

        let resolved = table.resolve(&Path::new("/mnt/project/src/main.rs")).unwrap();
        assert_eq!(resolved.entry.mount_point(), "/mnt/project/");
        assert_eq!(resolved.path, Path::new("/src/main.rs"));
    }

    #[test]
    fn test_mount_point_itself_is_backend_root() {
        let table = table(&["/", "/sys/"]);
        let resolved = table.resolve(&Path::new("/sys")).unwrap();
        assert_eq!(resolved.entry.mount_point(), "/sys/");
        assert!(resolved.path.is_root());
    }

    #[test]
    fn test_root_goes_to_root_mount() {
        // Root mounted last still answers for `/`
        let table = table(&["/sys/", "/"]);
        let resolved = table.resolve(&Path::root()).unwrap();
        assert_eq!(resolved.entry.mount_point(), "/");
        assert!(resolved.path.is_root());
    }

    #[test]
    fn test_deeper_mount_does_not_capture_shorter_path() {
        let table = table(&["/", "/mnt/project/"]);
        let resolved = table.resolve(&Path::new("/mnt")).unwrap();
        assert_eq!(resolved.entry.mount_point(), "/");
        assert_eq!(resolved.path, Path::new("/mnt"));
    }

    #[test]
    fn test_empty_table_resolves_nothing() {
        let table = MountTable::new();
        assert!(table.resolve(&Path::root()).is_none());
        assert!(table.resolve(&Path::new("/a/b")).is_none());
    }

    #[test]
    fn test_no_root_mount() {
        let table = table(&["/dev/"]);
        assert!(table.resolve(&Path::new("/etc/passwd")).is_none());
        assert!(table.resolve(&Path::root()).is_none());
        assert!(table.resolve(&Path::new("/dev/zero")).is_some());
    }

    #[test]
    fn test_duplicate_mount_rejected() {
        let mut table = table(&["/", "/sys/"]);
        let result = table.add(entry(PartitionType::Sysfs, "/sys"));
        assert!(matches!(result, Err(VfsError::AlreadyMounted(_))));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut table = table(&["/", "/mnt/"]);
        assert!(matches!(table.remove("/"), Err(VfsError::PermissionDenied(_))));
        assert!(matches!(table.remove("/nope/"), Err(VfsError::NothingMounted)));

        let removed = table.remove("/mnt").unwrap();
        assert_eq!(removed.mount_point(), "/mnt/");
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.resolve(&Path::new("/mnt/x")).unwrap().entry.mount_point(),
            "/"
        );
    }
}
