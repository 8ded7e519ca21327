//! # thor-vfs
//!
//! Virtual file system core of the Thor kernel.
//!
//! Several independent file systems (the boot disk, sysfs, devfs, procfs)
//! are grafted into one namespace by a mount table. Syscalls address
//! files by path or by descriptor; the [`Vfs`] resolves them to the most
//! specific mount, rewrites the path for that backend and forwards the
//! call.
//!
//! ```
//! use std::sync::Arc;
//! use thor_types::OpenFlags;
//! use thor_vfs::{HandleTable, Vfs, VfsConfig};
//!
//! let mut vfs = Vfs::new(Arc::new(HandleTable::new()));
//! vfs.init(&VfsConfig::default()).unwrap();
//!
//! let fd = vfs.open("/motd", OpenFlags::create()).unwrap();
//! vfs.write(fd, b"welcome", 0).unwrap();
//!
//! let mut text = String::new();
//! vfs.direct_read_to_string("/motd", &mut text).unwrap();
//! assert_eq!(text, "welcome");
//! ```

pub mod config;
pub mod scheduler;
pub mod syscall;
pub mod vfs;

pub use config::{ConfigError, MountConfig, VfsConfig};
pub use scheduler::{HandleTable, Scheduler};
pub use vfs::{
    BackendFactory, DefaultBackends, File, FileSystem, MemoryFs, MountEntry, MountTable,
    PartitionType, Path, Vfs, VfsError, VfsResult,
};
