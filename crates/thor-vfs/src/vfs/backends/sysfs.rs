//! Synthetic system-information file system.
//!
//! Kernel code publishes values into a shared [`SysValues`] registry; the
//! mounted [`SysFs`] exposes them read-only. Directories are implied by the
//! value paths: publishing `/memory/free` makes `/memory` listable.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thor_types::StatFsInfo;

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::FileSystem;
use crate::vfs::path::Path;
use crate::vfs::types::File;

type Generator = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
enum SysValue {
    Constant(String),
    Dynamic(Generator),
}

impl SysValue {
    fn render(&self) -> String {
        match self {
            SysValue::Constant(value) => value.clone(),
            SysValue::Dynamic(generator) => generator(),
        }
    }
}

/// Shared registry of published system values.
///
/// Cheap to clone; all clones see the same values.
#[derive(Clone, Default)]
pub struct SysValues {
    values: Arc<RwLock<BTreeMap<Vec<String>, SysValue>>>,
}

impl fmt::Debug for SysValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SysValues")
            .field("len", &self.values.read().len())
            .finish()
    }
}

impl SysValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a fixed value at `path` (relative to the sysfs mount).
    pub fn set_constant_value(&self, path: &str, value: impl Into<String>) {
        let key = Path::new(path).names().to_vec();
        tracing::debug!(path, "sysfs: constant value set");
        self.values
            .write()
            .insert(key, SysValue::Constant(value.into()));
    }

    /// Publish a value computed every time it is read.
    pub fn set_dynamic_value<F>(&self, path: &str, generator: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        let key = Path::new(path).names().to_vec();
        tracing::debug!(path, "sysfs: dynamic value set");
        self.values
            .write()
            .insert(key, SysValue::Dynamic(Arc::new(generator)));
    }

    /// Remove a published value. Returns whether it existed.
    pub fn delete_value(&self, path: &str) -> bool {
        let key = Path::new(path);
        self.values.write().remove(key.names()).is_some()
    }

    fn get(&self, path: &Path) -> Option<SysValue> {
        self.values.read().get(path.names()).cloned()
    }
}

/// Read-only view over a [`SysValues`] registry.
#[derive(Debug, Clone)]
pub struct SysFs {
    values: SysValues,
}

impl SysFs {
    pub fn new(values: SysValues) -> Self {
        Self { values }
    }

    /// Is `path` a directory, i.e. the root or a strict prefix of a value?
    fn is_directory(&self, path: &Path) -> bool {
        path.is_root()
            || self
                .values
                .values
                .read()
                .keys()
                .any(|k| k.len() > path.len() && k.starts_with(path.names()))
    }

    fn read_only(path: &Path) -> VfsError {
        VfsError::permission_denied(format!("sysfs is read-only: {path}"))
    }
}

impl FileSystem for SysFs {
    fn statfs(&self) -> VfsResult<StatFsInfo> {
        Ok(StatFsInfo::default())
    }

    fn get_file(&self, path: &Path) -> VfsResult<File> {
        let name = path.base_name().unwrap_or("");
        if let Some(value) = self.values.get(path) {
            return Ok(File::file(name, value.render().len() as u64).with_system());
        }
        if self.is_directory(path) {
            return Ok(File::directory(name).with_system());
        }
        Err(VfsError::not_exists(path.to_string()))
    }

    fn ls(&self, path: &Path) -> VfsResult<Vec<File>> {
        let values = self.values.values.read();
        let depth = path.len();

        // name -> is directory
        let mut children: BTreeMap<&str, bool> = BTreeMap::new();
        for key in values.keys() {
            if key.len() > depth && key.starts_with(path.names()) {
                let directory = key.len() > depth + 1;
                *children.entry(key[depth].as_str()).or_default() |= directory;
            }
        }

        if children.is_empty() && !path.is_root() {
            if values.contains_key(path.names()) {
                return Err(VfsError::not_a_directory(path.to_string()));
            }
            return Err(VfsError::not_exists(path.to_string()));
        }

        Ok(children
            .into_iter()
            .map(|(name, directory)| {
                let file = if directory {
                    File::directory(name)
                } else {
                    let mut child = path.names().to_vec();
                    child.push(name.to_string());
                    let size = values
                        .get(&child)
                        .map(|v| v.render().len() as u64)
                        .unwrap_or(0);
                    File::file(name, size)
                };
                file.with_system()
            })
            .collect())
    }

    fn read(&self, path: &Path, buffer: &mut [u8], offset: u64) -> VfsResult<usize> {
        let Some(value) = self.values.get(path) else {
            if self.is_directory(path) {
                return Err(VfsError::directory(path.to_string()));
            }
            return Err(VfsError::not_exists(path.to_string()));
        };

        let data = value.render();
        let data = data.as_bytes();
        let start = (offset as usize).min(data.len());
        let end = (start + buffer.len()).min(data.len());
        buffer[..end - start].copy_from_slice(&data[start..end]);
        Ok(end - start)
    }

    fn touch(&self, path: &Path) -> VfsResult<()> {
        Err(Self::read_only(path))
    }

    fn mkdir(&self, path: &Path) -> VfsResult<()> {
        Err(Self::read_only(path))
    }

    fn rm(&self, path: &Path) -> VfsResult<()> {
        Err(Self::read_only(path))
    }

    fn write(&self, path: &Path, _buffer: &[u8], _offset: u64) -> VfsResult<usize> {
        Err(Self::read_only(path))
    }

    fn clear(&self, path: &Path, _count: usize, _offset: u64) -> VfsResult<usize> {
        Err(Self::read_only(path))
    }

    fn truncate(&self, path: &Path, _size: u64) -> VfsResult<()> {
        Err(Self::read_only(path))
    }
}
