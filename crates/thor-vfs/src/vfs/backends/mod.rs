//! VFS backends.
//!
//! Backends implement [`FileSystem`] for the four partition kinds. The
//! [`BackendFactory`] decides which concrete backend serves a kind when a
//! file system is mounted.

mod devfs;
mod memory;
mod procfs;
mod sysfs;

pub use devfs::{DevFs, Device, DeviceRegistry, NullDevice, ZeroDevice};
pub use memory::{DEFAULT_CAPACITY, MemoryFs};
pub use procfs::{PROCESS_FILES, ProcFs, ProcessInfo, ProcessList, ProcessState};
pub use sysfs::{SysFs, SysValues};

use super::ops::FileSystem;
use super::types::PartitionType;

/// Builds the backend for a freshly mounted file system.
///
/// Returning `None` means the kind is not supported and the mount fails
/// with `InvalidFileSystem`.
pub trait BackendFactory: Send + Sync {
    fn create(
        &self,
        kind: PartitionType,
        mount_point: &str,
        device: &str,
    ) -> Option<Box<dyn FileSystem>>;
}

/// The bundled backends.
///
/// Synthetic backends read from registries shared with the rest of the
/// kernel, so values published through [`sys_values`](Self::sys_values)
/// show up in every sysfs mount.
#[derive(Debug, Clone, Default)]
pub struct DefaultBackends {
    sys_values: SysValues,
    processes: ProcessList,
    devices: DeviceRegistry,
}

impl DefaultBackends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sys_values(&self) -> &SysValues {
        &self.sys_values
    }

    pub fn processes(&self) -> &ProcessList {
        &self.processes
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }
}

impl BackendFactory for DefaultBackends {
    fn create(
        &self,
        kind: PartitionType,
        mount_point: &str,
        device: &str,
    ) -> Option<Box<dyn FileSystem>> {
        tracing::debug!(%kind, mount_point, device, "vfs: creating backend");
        match kind {
            PartitionType::Fat32 => Some(Box::new(MemoryFs::with_device(device))),
            PartitionType::Sysfs => Some(Box::new(SysFs::new(self.sys_values.clone()))),
            PartitionType::Devfs => Some(Box::new(DevFs::new(self.devices.clone()))),
            PartitionType::Procfs => Some(Box::new(ProcFs::new(self.processes.clone()))),
            PartitionType::Unknown => None,
        }
    }
}
