//! The VFS context object and its syscall-shaped operations.
//!
//! Every operation follows the same shape: build an absolute [`Path`]
//! (relative strings are joined to the scheduler's working directory),
//! resolve it through the mount table, hand the backend-relative remainder
//! to the backend, and return its result. Validation of paths and
//! descriptors always happens before any backend is called.

use std::sync::Arc;
use thor_types::flags::STAT_FLAG_DIRECTORY;
use thor_types::{OpenFlags, StatFsInfo, StatInfo};

use super::backends::{BackendFactory, DefaultBackends};
use super::codec;
use super::error::{VfsError, VfsResult};
use super::mount::{MountEntry, MountTable, Resolved};
use super::ops::zeroed_buffer;
use super::path::Path;
use super::types::PartitionType;
use crate::config::VfsConfig;
use crate::scheduler::Scheduler;

/// Size reported by `stat` for a mount point.
pub const MOUNT_POINT_STAT_SIZE: u64 = 4096;

/// The virtual file system.
///
/// Dispatch takes `&self`; changing the mount table takes `&mut self`, so
/// no backend can be torn down while an operation is using it. Callers
/// sharing a `Vfs` across threads wrap it in their own lock.
pub struct Vfs {
    mounts: MountTable,
    scheduler: Arc<dyn Scheduler>,
    factory: Box<dyn BackendFactory>,
}

impl std::fmt::Debug for Vfs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vfs")
            .field("mounts", &self.mounts)
            .finish_non_exhaustive()
    }
}

impl Vfs {
    /// A VFS with nothing mounted, using the bundled backends.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_factory(scheduler, Box::new(DefaultBackends::new()))
    }

    /// A VFS with nothing mounted, building backends through `factory`.
    pub fn with_factory(scheduler: Arc<dyn Scheduler>, factory: Box<dyn BackendFactory>) -> Self {
        Self {
            mounts: MountTable::new(),
            scheduler,
            factory,
        }
    }

    pub fn mount_table(&self) -> &MountTable {
        &self.mounts
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    // ========================================================================
    // Mount management
    // ========================================================================

    /// Mount every configured file system, then initialize them in order.
    ///
    /// All mounts are in the table before the first `init` runs, so a
    /// backend may already reach the others while initializing.
    #[tracing::instrument(skip(self, config), name = "vfs.init")]
    pub fn init(&mut self, config: &VfsConfig) -> VfsResult<()> {
        let first_new = self.mounts.len();
        for mount in &config.mounts {
            self.mount_path(mount.kind, &mount.mount_point, &mount.device)?;
        }
        for entry in self.mounts.iter_mut().skip(first_new) {
            entry.fs_mut().init()?;
        }
        tracing::info!(mounts = self.mounts.len(), "vfs: initialized");
        Ok(())
    }

    /// Mount by path strings without running the backend's `init`.
    #[tracing::instrument(skip(self), name = "vfs.mount_path", err(level = "debug"))]
    pub fn mount_path(
        &mut self,
        kind: PartitionType,
        mount_point: &str,
        device: &str,
    ) -> VfsResult<()> {
        let fs = self
            .factory
            .create(kind, mount_point, device)
            .ok_or(VfsError::InvalidFileSystem)?;
        self.mounts
            .add(MountEntry::new(kind, mount_point, device, fs))?;
        tracing::info!(%kind, mount_point, device, "vfs: mounted");
        Ok(())
    }

    /// Mount the device bound to `dev_fd` at the directory bound to
    /// `mp_fd`, then initialize the new backend.
    ///
    /// A backend whose `init` fails is unmounted again.
    #[tracing::instrument(skip(self), name = "vfs.mount", err(level = "debug"))]
    pub fn mount(&mut self, kind: PartitionType, mp_fd: usize, dev_fd: usize) -> VfsResult<()> {
        let mp_path = self
            .scheduler
            .get_handle(mp_fd)
            .ok_or(VfsError::InvalidFileDescriptor(mp_fd))?;
        let dev_path = self
            .scheduler
            .get_handle(dev_fd)
            .ok_or(VfsError::InvalidFileDescriptor(dev_fd))?;

        let mount_point = directory_string(&mp_path);
        let device = directory_string(&dev_path);

        if self.mounts.is_mounted(&mount_point) {
            return Err(VfsError::AlreadyMounted(mount_point));
        }
        let fs = self
            .factory
            .create(kind, &mount_point, &device)
            .ok_or(VfsError::InvalidFileSystem)?;

        let entry = self
            .mounts
            .add(MountEntry::new(kind, mount_point.as_str(), device.as_str(), fs))?;
        let init = entry.fs_mut().init();
        if let Err(err) = init {
            self.mounts.discard_last();
            return Err(err);
        }

        tracing::info!(%kind, %mount_point, %device, "vfs: mounted");
        Ok(())
    }

    /// Remove the mount at `mount_point` and drop its backend.
    #[tracing::instrument(skip(self), name = "vfs.unmount", err(level = "debug"))]
    pub fn unmount(&mut self, mount_point: &str) -> VfsResult<()> {
        if mount_point.is_empty() {
            return Err(VfsError::invalid_path(mount_point));
        }
        let path = Path::join(&self.scheduler.working_directory(), mount_point);
        let entry = self.mounts.remove(&path.to_string())?;
        tracing::info!(mount_point = entry.mount_point(), kind = %entry.kind(), "vfs: unmounted");
        Ok(())
    }

    /// Unmount the directory bound to `fd`.
    pub fn unmount_fd(&mut self, fd: usize) -> VfsResult<()> {
        let path = self
            .scheduler
            .get_handle(fd)
            .ok_or(VfsError::InvalidFileDescriptor(fd))?;
        self.unmount(&directory_string(&path))
    }

    /// Capacity of the file system holding `mount_point`.
    #[tracing::instrument(skip(self), name = "vfs.statfs", err(level = "debug"))]
    pub fn statfs(&self, mount_point: &str) -> VfsResult<StatFsInfo> {
        let path = self.absolute(mount_point)?;
        self.resolve(&path)?.fs().statfs()
    }

    // ========================================================================
    // Handles
    // ========================================================================

    /// Open `file` and bind a new descriptor to it.
    ///
    /// Mount points are always openable without consulting the backend.
    #[tracing::instrument(skip(self), name = "vfs.open", err(level = "debug"))]
    pub fn open(&self, file: &str, flags: OpenFlags) -> VfsResult<usize> {
        let path = self.absolute(file)?;
        let resolved = self.resolve(&path)?;

        if !resolved.path.is_root() {
            match resolved.fs().get_file(&resolved.path) {
                Ok(_) => {}
                Err(VfsError::NotExists(_)) if flags.create => {
                    resolved.fs().touch(&resolved.path)?;
                }
                Err(err) => return Err(err),
            }
        }

        let fd = self.scheduler.register_new_handle(path);
        tracing::debug!(fd, "vfs: opened");
        Ok(fd)
    }

    /// Release `fd`. Unknown descriptors are ignored.
    #[tracing::instrument(skip(self), name = "vfs.close")]
    pub fn close(&self, fd: usize) {
        if self.scheduler.has_handle(fd) {
            self.scheduler.release_handle(fd);
        }
    }

    #[tracing::instrument(skip(self), name = "vfs.stat", err(level = "debug"))]
    pub fn stat(&self, fd: usize) -> VfsResult<StatInfo> {
        let path = self.bound_path(fd)?;
        let resolved = self.resolve(&path)?;

        if resolved.path.is_root() {
            return Ok(StatInfo {
                flags: STAT_FLAG_DIRECTORY,
                size: MOUNT_POINT_STAT_SIZE,
                ..Default::default()
            });
        }
        Ok(resolved.fs().get_file(&resolved.path)?.to_stat_info())
    }

    // ========================================================================
    // Namespace
    // ========================================================================

    #[tracing::instrument(skip(self), name = "vfs.mkdir", err(level = "debug"))]
    pub fn mkdir(&self, directory: &str) -> VfsResult<()> {
        let path = self.absolute(directory)?;
        let resolved = self.resolve(&path)?;
        resolved.fs().mkdir(&resolved.path)
    }

    #[tracing::instrument(skip(self), name = "vfs.rm", err(level = "debug"))]
    pub fn rm(&self, file: &str) -> VfsResult<()> {
        let path = self.absolute(file)?;
        let resolved = self.resolve(&path)?;
        resolved.fs().rm(&resolved.path)
    }

    // ========================================================================
    // Data through descriptors
    // ========================================================================

    #[tracing::instrument(skip(self, buffer), fields(len = buffer.len()), name = "vfs.read", err(level = "debug"))]
    pub fn read(&self, fd: usize, buffer: &mut [u8], offset: u64) -> VfsResult<usize> {
        let path = self.bound_path(fd)?;
        let resolved = self.resolve(&path)?;
        resolved.fs().read(&resolved.path, buffer, offset)
    }

    #[tracing::instrument(skip(self, buffer), fields(len = buffer.len()), name = "vfs.write", err(level = "debug"))]
    pub fn write(&self, fd: usize, buffer: &[u8], offset: u64) -> VfsResult<usize> {
        let path = self.bound_path(fd)?;
        let resolved = self.resolve(&path)?;
        resolved.fs().write(&resolved.path, buffer, offset)
    }

    #[tracing::instrument(skip(self), name = "vfs.clear", err(level = "debug"))]
    pub fn clear(&self, fd: usize, count: usize, offset: u64) -> VfsResult<usize> {
        let path = self.bound_path(fd)?;
        let resolved = self.resolve(&path)?;
        resolved.fs().clear(&resolved.path, count, offset)
    }

    #[tracing::instrument(skip(self), name = "vfs.truncate", err(level = "debug"))]
    pub fn truncate(&self, fd: usize, size: u64) -> VfsResult<()> {
        let path = self.bound_path(fd)?;
        let resolved = self.resolve(&path)?;
        resolved.fs().truncate(&resolved.path, size)
    }

    // ========================================================================
    // Data by path
    // ========================================================================

    #[tracing::instrument(skip(self, buffer), fields(len = buffer.len()), name = "vfs.direct_read", err(level = "debug"))]
    pub fn direct_read(&self, file: &str, buffer: &mut [u8], offset: u64) -> VfsResult<usize> {
        let path = self.absolute(file)?;
        let resolved = self.resolve(&path)?;
        resolved.fs().read(&resolved.path, buffer, offset)
    }

    #[tracing::instrument(skip(self, buffer), fields(len = buffer.len()), name = "vfs.direct_write", err(level = "debug"))]
    pub fn direct_write(&self, file: &str, buffer: &[u8], offset: u64) -> VfsResult<usize> {
        let path = self.absolute(file)?;
        let resolved = self.resolve(&path)?;
        resolved.fs().write(&resolved.path, buffer, offset)
    }

    /// Read a whole file into `content`, replacing what it held.
    ///
    /// Invalid UTF-8 is replaced rather than rejected. Returns the number of
    /// bytes read.
    #[tracing::instrument(skip(self, content), name = "vfs.direct_read_to_string", err(level = "debug"))]
    pub fn direct_read_to_string(&self, file: &str, content: &mut String) -> VfsResult<usize> {
        let path = self.absolute(file)?;
        let resolved = self.resolve(&path)?;

        let size = resolved.fs().get_file(&resolved.path)?.size;
        let mut buffer = zeroed_buffer(size)?;
        let read = resolved.fs().read(&resolved.path, &mut buffer, 0)?;

        content.clear();
        content.push_str(&String::from_utf8_lossy(&buffer[..read]));
        Ok(read)
    }

    // ========================================================================
    // Enumeration
    // ========================================================================

    /// Write the listing of the directory bound to `fd` into `buffer`.
    ///
    /// Returns the listing size charged to the caller; see
    /// [`codec::encode_entries`].
    #[tracing::instrument(skip(self, buffer), fields(len = buffer.len()), name = "vfs.entries", err(level = "debug"))]
    pub fn entries(&self, fd: usize, buffer: &mut [u8]) -> VfsResult<usize> {
        let path = self.bound_path(fd)?;
        let resolved = self.resolve(&path)?;
        let files = resolved.fs().ls(&resolved.path)?;
        codec::encode_entries(&files, buffer)
    }

    /// Write the mount listing into `buffer`.
    #[tracing::instrument(skip(self, buffer), fields(len = buffer.len()), name = "vfs.mounts", err(level = "debug"))]
    pub fn mounts(&self, buffer: &mut [u8]) -> VfsResult<usize> {
        codec::encode_mounts(&self.mounts, buffer)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Absolute path for a user-supplied string.
    fn absolute(&self, path: &str) -> VfsResult<Path> {
        if path.is_empty() {
            return Err(VfsError::invalid_path(path));
        }
        Ok(Path::join(&self.scheduler.working_directory(), path))
    }

    /// Path bound to `fd`, rejecting unbound handles.
    fn bound_path(&self, fd: usize) -> VfsResult<Path> {
        let path = self
            .scheduler
            .get_handle(fd)
            .ok_or(VfsError::InvalidFileDescriptor(fd))?;
        if path.is_empty() {
            return Err(VfsError::invalid_path(format!("fd {fd} is not bound")));
        }
        Ok(path)
    }

    fn resolve(&self, path: &Path) -> VfsResult<Resolved<'_>> {
        self.mounts.resolve(path).ok_or(VfsError::NothingMounted)
    }
}

/// `/` followed by every component and a trailing `/`.
fn directory_string(path: &Path) -> String {
    let mut out = String::from("/");
    for name in path {
        out.push_str(name);
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::HandleTable;
    use crate::vfs::FileSystem;

    fn booted() -> Vfs {
        let mut vfs = Vfs::new(Arc::new(HandleTable::new()));
        vfs.init(&VfsConfig::default()).unwrap();
        vfs
    }

    #[test]
    fn test_directory_string() {
        assert_eq!(directory_string(&Path::root()), "/");
        assert_eq!(directory_string(&Path::new("/mnt/usb")), "/mnt/usb/");
    }

    #[test]
    fn test_init_mounts_in_order() {
        let vfs = booted();
        let points: Vec<_> = vfs.mount_table().iter().map(|m| m.mount_point()).collect();
        assert_eq!(points, vec!["/", "/sys/", "/dev/", "/proc/"]);
        assert_eq!(vfs.mount_table().iter().next().unwrap().device(), "/dev/hda1");
    }

    #[test]
    fn test_open_relative_to_working_directory() {
        let scheduler = Arc::new(HandleTable::new());
        let mut vfs = Vfs::new(scheduler.clone());
        vfs.init(&VfsConfig::default()).unwrap();

        vfs.mkdir("/home").unwrap();
        scheduler.set_working_directory(Path::new("/home"));
        let fd = vfs.open("notes.txt", OpenFlags::create()).unwrap();
        assert_eq!(scheduler.get_handle(fd), Some(Path::new("/home/notes.txt")));
    }

    #[test]
    fn test_empty_path_rejected_before_backend() {
        let vfs = booted();
        assert!(matches!(vfs.open("", OpenFlags::create()), Err(VfsError::InvalidFilePath(_))));
        assert!(matches!(vfs.mkdir(""), Err(VfsError::InvalidFilePath(_))));
        assert!(matches!(vfs.statfs(""), Err(VfsError::InvalidFilePath(_))));
        let mut buf = [0u8; 4];
        assert!(matches!(
            vfs.direct_read("", &mut buf, 0),
            Err(VfsError::InvalidFilePath(_))
        ));
    }

    #[test]
    fn test_unbound_handle_rejected() {
        let scheduler = Arc::new(HandleTable::new());
        let mut vfs = Vfs::new(scheduler.clone());
        vfs.init(&VfsConfig::default()).unwrap();

        let fd = scheduler.register_new_handle(Path::default());
        let mut buf = [0u8; 4];
        assert!(matches!(vfs.read(fd, &mut buf, 0), Err(VfsError::InvalidFilePath(_))));
        assert!(matches!(vfs.write(fd, b"x", 0), Err(VfsError::InvalidFilePath(_))));
        assert!(matches!(vfs.clear(fd, 1, 0), Err(VfsError::InvalidFilePath(_))));
        assert!(matches!(vfs.truncate(fd, 0), Err(VfsError::InvalidFilePath(_))));
    }

    #[test]
    fn test_nothing_mounted() {
        let vfs = Vfs::new(Arc::new(HandleTable::new()));
        assert!(matches!(
            vfs.open("/a", OpenFlags::read()),
            Err(VfsError::NothingMounted)
        ));
        assert_eq!(vfs.mounts(&mut []).unwrap(), 0);
    }

    struct FailingInit;

    impl FileSystem for FailingInit {
        fn init(&mut self) -> VfsResult<()> {
            Err(VfsError::InvalidDevice("no medium".into()))
        }
        fn statfs(&self) -> VfsResult<StatFsInfo> {
            Err(VfsError::Unsupported)
        }
        fn get_file(&self, _: &Path) -> VfsResult<crate::vfs::File> {
            Err(VfsError::Unsupported)
        }
        fn ls(&self, _: &Path) -> VfsResult<Vec<crate::vfs::File>> {
            Err(VfsError::Unsupported)
        }
        fn read(&self, _: &Path, _: &mut [u8], _: u64) -> VfsResult<usize> {
            Err(VfsError::Unsupported)
        }
        fn touch(&self, _: &Path) -> VfsResult<()> {
            Err(VfsError::Unsupported)
        }
        fn mkdir(&self, _: &Path) -> VfsResult<()> {
            Err(VfsError::Unsupported)
        }
        fn rm(&self, _: &Path) -> VfsResult<()> {
            Err(VfsError::Unsupported)
        }
        fn write(&self, _: &Path, _: &[u8], _: u64) -> VfsResult<usize> {
            Err(VfsError::Unsupported)
        }
        fn clear(&self, _: &Path, _: usize, _: u64) -> VfsResult<usize> {
            Err(VfsError::Unsupported)
        }
        fn truncate(&self, _: &Path, _: u64) -> VfsResult<()> {
            Err(VfsError::Unsupported)
        }
    }

    /// Reports a single file far larger than memory.
    struct OversizedFs;

    impl FileSystem for OversizedFs {
        fn statfs(&self) -> VfsResult<StatFsInfo> {
            Err(VfsError::Unsupported)
        }
        fn get_file(&self, path: &Path) -> VfsResult<crate::vfs::File> {
            Ok(crate::vfs::File::file(path.base_name().unwrap_or(""), u64::MAX))
        }
        fn ls(&self, _: &Path) -> VfsResult<Vec<crate::vfs::File>> {
            Ok(Vec::new())
        }
        fn read(&self, _: &Path, _: &mut [u8], _: u64) -> VfsResult<usize> {
            Ok(0)
        }
        fn touch(&self, _: &Path) -> VfsResult<()> {
            Err(VfsError::Unsupported)
        }
        fn mkdir(&self, _: &Path) -> VfsResult<()> {
            Err(VfsError::Unsupported)
        }
        fn rm(&self, _: &Path) -> VfsResult<()> {
            Err(VfsError::Unsupported)
        }
        fn write(&self, _: &Path, _: &[u8], _: u64) -> VfsResult<usize> {
            Err(VfsError::Unsupported)
        }
        fn clear(&self, _: &Path, _: usize, _: u64) -> VfsResult<usize> {
            Err(VfsError::Unsupported)
        }
        fn truncate(&self, _: &Path, _: u64) -> VfsResult<()> {
            Err(VfsError::Unsupported)
        }
    }

    /// Serves FAT32 from memory, procfs as [`OversizedFs`], and fails to
    /// bring up anything else.
    struct FlakyFactory;

    impl BackendFactory for FlakyFactory {
        fn create(
            &self,
            kind: PartitionType,
            _mount_point: &str,
            _device: &str,
        ) -> Option<Box<dyn crate::vfs::FileSystem>> {
            match kind {
                PartitionType::Fat32 => Some(Box::new(crate::vfs::MemoryFs::new())),
                PartitionType::Procfs => Some(Box::new(OversizedFs)),
                PartitionType::Unknown => None,
                _ => Some(Box::new(FailingInit)),
            }
        }
    }

    #[test]
    fn test_failed_init_rolls_back_mount() {
        let scheduler = Arc::new(HandleTable::new());
        let mut vfs = Vfs::with_factory(scheduler.clone(), Box::new(FlakyFactory));
        vfs.mount_path(PartitionType::Fat32, "/", "/dev/hda1").unwrap();
        vfs.mkdir("/mnt").unwrap();

        let mp = vfs.open("/mnt", OpenFlags::read()).unwrap();
        let dev = vfs.open("/", OpenFlags::read()).unwrap();
        let result = vfs.mount(PartitionType::Devfs, mp, dev);
        assert!(matches!(result, Err(VfsError::InvalidDevice(_))));
        assert_eq!(vfs.mount_table().len(), 1);
        assert!(!vfs.mount_table().is_mounted("/mnt/"));
    }

    #[test]
    fn test_oversized_file_is_invalid_count() {
        let mut vfs = Vfs::with_factory(Arc::new(HandleTable::new()), Box::new(FlakyFactory));
        vfs.mount_path(PartitionType::Fat32, "/", "/dev/hda1").unwrap();
        vfs.mount_path(PartitionType::Procfs, "/proc/", "none").unwrap();

        let mut content = String::from("untouched");
        assert_eq!(
            vfs.direct_read_to_string("/proc/huge", &mut content),
            Err(VfsError::InvalidCount(u64::MAX))
        );
        assert_eq!(content, "untouched");
        assert_eq!(
            OversizedFs.read_all(&Path::new("/huge")),
            Err(VfsError::InvalidCount(u64::MAX))
        );
    }
}
