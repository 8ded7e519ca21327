//! Virtual file system.
//!
//! Key components:
//!
//! - [`Path`] - Component-wise absolute/relative paths
//! - [`FileSystem`] - Contract every backend implements
//! - [`MountTable`] - Routes paths to backends by longest prefix
//! - [`Vfs`] - Syscall-shaped operations over the mount table
//! - [`codec`] - Byte-exact directory and mount listings
//!
//! ## Design Decisions
//!
//! - **Backend-relative paths**: a backend never sees its mount prefix.
//!   The mount point itself reaches the backend as `/`.
//! - **Errors are values**: backends return [`VfsError`]; its positive code
//!   is negated only at the [`syscall`](crate::syscall) boundary.
//! - **Mutation needs `&mut Vfs`**: mounting and unmounting cannot race
//!   with dispatch, without any lock inside the core.

pub mod backends;
pub mod codec;
mod dispatch;
mod error;
mod mount;
mod ops;
mod path;
mod types;

pub use backends::{
    BackendFactory, DefaultBackends, DevFs, Device, DeviceRegistry, MemoryFs, ProcFs,
    ProcessInfo, ProcessList, ProcessState, SysFs, SysValues,
};
pub use dispatch::{MOUNT_POINT_STAT_SIZE, Vfs};
pub use error::{VfsError, VfsResult};
pub use mount::{MountEntry, MountTable, Resolved};
pub use ops::FileSystem;
pub use path::Path;
pub use types::{File, PartitionType, datetime_from_system, now};
