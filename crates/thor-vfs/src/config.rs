//! Boot-time mount configuration.
//!
//! ```toml
//! [[mounts]]
//! kind = "fat32"
//! mount_point = "/"
//! device = "/dev/hda1"
//!
//! [[mounts]]
//! kind = "sysfs"
//! mount_point = "/sys/"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path as StdPath, PathBuf};
use thiserror::Error;

use crate::vfs::{Path, PartitionType};

/// Errors raised while loading a [`VfsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no mounts configured")]
    NoMounts,

    #[error("first mount must be the root, found {0}")]
    RootNotFirst(String),

    #[error("mount point must be absolute: {0}")]
    RelativeMountPoint(String),
}

fn default_device() -> String {
    "none".to_string()
}

/// One boot mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    pub kind: PartitionType,

    pub mount_point: String,

    /// Device path, `none` for synthetic file systems.
    #[serde(default = "default_device")]
    pub device: String,
}

impl MountConfig {
    pub fn new(kind: PartitionType, mount_point: impl Into<String>) -> Self {
        Self {
            kind,
            mount_point: mount_point.into(),
            device: default_device(),
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }
}

/// Mounts established by `Vfs::init`, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfsConfig {
    pub mounts: Vec<MountConfig>,
}

impl Default for VfsConfig {
    /// Root FAT32 on `/dev/hda1`, then sysfs, devfs and procfs.
    fn default() -> Self {
        Self {
            mounts: vec![
                MountConfig::new(PartitionType::Fat32, "/").with_device("/dev/hda1"),
                MountConfig::new(PartitionType::Sysfs, "/sys/"),
                MountConfig::new(PartitionType::Devfs, "/dev/"),
                MountConfig::new(PartitionType::Procfs, "/proc/"),
            ],
        }
    }
}

impl VfsConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<StdPath>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), mounts = config.mounts.len(), "loaded vfs config");
        Ok(config)
    }

    /// The root must come first so every later mount point resolves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let first = self.mounts.first().ok_or(ConfigError::NoMounts)?;
        if !Path::new(&first.mount_point).is_root() {
            return Err(ConfigError::RootNotFirst(first.mount_point.clone()));
        }
        if let Some(relative) = self.mounts.iter().find(|m| !m.mount_point.starts_with('/')) {
            return Err(ConfigError::RelativeMountPoint(relative.mount_point.clone()));
        }
        Ok(())
    }
}
