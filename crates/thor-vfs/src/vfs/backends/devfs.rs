//! Device file system.
//!
//! A flat directory of device nodes. Drivers register a [`Device`] in the
//! shared [`DeviceRegistry`]; reads and writes on `/dev/<name>` go straight
//! to it.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thor_types::StatFsInfo;

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::FileSystem;
use crate::vfs::path::Path;
use crate::vfs::types::File;

/// A character or block device reachable through devfs.
pub trait Device: Send + Sync {
    fn read(&self, buffer: &mut [u8], offset: u64) -> VfsResult<usize>;

    fn write(&self, buffer: &[u8], offset: u64) -> VfsResult<usize>;

    /// Size reported by `stat`. Stream devices report 0.
    fn size(&self) -> u64 {
        0
    }

    /// Zero `count` bytes at `offset`.
    ///
    /// Writes zeros a block at a time and stops at the first short write,
    /// returning how many bytes were cleared.
    fn clear(&self, count: usize, offset: u64) -> VfsResult<usize> {
        let zeros = [0u8; CLEAR_BLOCK];
        let mut cleared = 0;
        while cleared < count {
            let len = (count - cleared).min(CLEAR_BLOCK);
            let at = offset
                .checked_add(cleared as u64)
                .ok_or(VfsError::InvalidOffset(offset))?;
            let written = self.write(&zeros[..len], at)?;
            cleared += written;
            if written < len {
                break;
            }
        }
        Ok(cleared)
    }
}

/// Bytes of zeros handed to [`Device::write`] per step of a clear.
const CLEAR_BLOCK: usize = 4096;

/// `/dev/null`: reads nothing, swallows everything.
#[derive(Debug, Default)]
pub struct NullDevice;

impl Device for NullDevice {
    fn read(&self, _buffer: &mut [u8], _offset: u64) -> VfsResult<usize> {
        Ok(0)
    }

    fn write(&self, buffer: &[u8], _offset: u64) -> VfsResult<usize> {
        Ok(buffer.len())
    }

    fn clear(&self, count: usize, _offset: u64) -> VfsResult<usize> {
        Ok(count)
    }
}

/// `/dev/zero`: reads zeros, swallows everything.
#[derive(Debug, Default)]
pub struct ZeroDevice;

impl Device for ZeroDevice {
    fn read(&self, buffer: &mut [u8], _offset: u64) -> VfsResult<usize> {
        buffer.fill(0);
        Ok(buffer.len())
    }

    fn write(&self, buffer: &[u8], _offset: u64) -> VfsResult<usize> {
        Ok(buffer.len())
    }

    fn clear(&self, count: usize, _offset: u64) -> VfsResult<usize> {
        Ok(count)
    }
}

/// Shared set of registered devices, keyed by node name.
#[derive(Clone)]
pub struct DeviceRegistry {
    devices: Arc<RwLock<BTreeMap<String, Arc<dyn Device>>>>,
}

impl Default for DeviceRegistry {
    /// A registry holding `null` and `zero`.
    fn default() -> Self {
        let registry = Self::empty();
        registry.register_device("null", NullDevice);
        registry.register_device("zero", ZeroDevice);
        registry
    }
}

impl fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.devices.read().keys()).finish()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry without the built-in devices.
    pub fn empty() -> Self {
        Self {
            devices: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Add (or replace) the device node `name`.
    pub fn register_device(&self, name: impl Into<String>, device: impl Device + 'static) {
        let name = name.into();
        tracing::info!(device = %name, "devfs: device registered");
        self.devices.write().insert(name, Arc::new(device));
    }

    /// Remove a device node. Returns whether it existed.
    pub fn unregister_device(&self, name: &str) -> bool {
        self.devices.write().remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Device>> {
        self.devices.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.devices.read().keys().cloned().collect()
    }
}

/// Flat view over a [`DeviceRegistry`].
#[derive(Debug, Clone)]
pub struct DevFs {
    devices: DeviceRegistry,
}

impl DevFs {
    pub fn new(devices: DeviceRegistry) -> Self {
        Self { devices }
    }

    /// Device behind a one-component path.
    fn device(&self, path: &Path) -> VfsResult<Arc<dyn Device>> {
        if path.is_root() {
            return Err(VfsError::directory(path.to_string()));
        }
        match path.names() {
            [name] => self
                .devices
                .get(name)
                .ok_or_else(|| VfsError::not_exists(path.to_string())),
            _ => Err(VfsError::not_exists(path.to_string())),
        }
    }

    fn denied(path: &Path) -> VfsError {
        VfsError::permission_denied(format!("devfs nodes are managed by drivers: {path}"))
    }
}

impl FileSystem for DevFs {
    fn statfs(&self) -> VfsResult<StatFsInfo> {
        Ok(StatFsInfo::default())
    }

    fn get_file(&self, path: &Path) -> VfsResult<File> {
        if path.is_root() {
            return Ok(File::directory("").with_system());
        }
        let device = self.device(path)?;
        let name = path.base_name().unwrap_or("");
        Ok(File::file(name, device.size()).with_system())
    }

    fn ls(&self, path: &Path) -> VfsResult<Vec<File>> {
        if !path.is_root() {
            self.device(path)?;
            return Err(VfsError::not_a_directory(path.to_string()));
        }
        let devices = self.devices.devices.read();
        Ok(devices
            .iter()
            .map(|(name, device)| File::file(name.as_str(), device.size()).with_system())
            .collect())
    }

    fn read(&self, path: &Path, buffer: &mut [u8], offset: u64) -> VfsResult<usize> {
        self.device(path)?.read(buffer, offset)
    }

    fn touch(&self, path: &Path) -> VfsResult<()> {
        Err(Self::denied(path))
    }

    fn mkdir(&self, path: &Path) -> VfsResult<()> {
        Err(Self::denied(path))
    }

    fn rm(&self, path: &Path) -> VfsResult<()> {
        Err(Self::denied(path))
    }

    fn write(&self, path: &Path, buffer: &[u8], offset: u64) -> VfsResult<usize> {
        self.device(path)?.write(buffer, offset)
    }

    fn clear(&self, path: &Path, count: usize, offset: u64) -> VfsResult<usize> {
        self.device(path)?.clear(count, offset)
    }

    fn truncate(&self, path: &Path, _size: u64) -> VfsResult<()> {
        self.device(path)?;
        Err(VfsError::Unsupported)
    }
}
