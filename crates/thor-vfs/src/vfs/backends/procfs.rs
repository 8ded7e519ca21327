//! Process information file system.
//!
//! The scheduler feeds a shared [`ProcessList`]; [`ProcFs`] exposes one
//! directory per pid holding `name`, `state`, `ppid` and `priority`.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::{Display, EnumString};
use thor_types::StatFsInfo;

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::FileSystem;
use crate::vfs::path::Path;
use crate::vfs::types::File;

/// Files present in every process directory.
pub const PROCESS_FILES: [&str; 4] = ["name", "state", "ppid", "priority"];

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    #[default]
    New,
    Ready,
    Running,
    Blocked,
    Sleeping,
    Waiting,
    Killed,
}

/// Snapshot of a process as published by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u64,
    pub ppid: u64,
    pub name: String,
    pub state: ProcessState,
    pub priority: u64,
}

impl ProcessInfo {
    pub fn new(pid: u64, name: impl Into<String>) -> Self {
        Self {
            pid,
            ppid: 0,
            name: name.into(),
            state: ProcessState::default(),
            priority: 0,
        }
    }

    /// Contents of one of the [`PROCESS_FILES`].
    fn field(&self, file: &str) -> Option<String> {
        match file {
            "name" => Some(self.name.clone()),
            "state" => Some(self.state.to_string()),
            "ppid" => Some(self.ppid.to_string()),
            "priority" => Some(self.priority.to_string()),
            _ => None,
        }
    }
}

/// Shared table of live processes, keyed by pid.
#[derive(Debug, Clone, Default)]
pub struct ProcessList {
    processes: Arc<RwLock<BTreeMap<u64, ProcessInfo>>>,
}

impl ProcessList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `info.pid`.
    pub fn update_process(&self, info: ProcessInfo) {
        self.processes.write().insert(info.pid, info);
    }

    /// Returns whether the pid was present.
    pub fn remove_process(&self, pid: u64) -> bool {
        self.processes.write().remove(&pid).is_some()
    }

    pub fn get(&self, pid: u64) -> Option<ProcessInfo> {
        self.processes.read().get(&pid).cloned()
    }

    pub fn len(&self) -> usize {
        self.processes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.read().is_empty()
    }
}

/// What a procfs path points at.
enum Node {
    Root,
    Process(ProcessInfo),
    Field(String),
}

/// Read-only view over a [`ProcessList`].
#[derive(Debug, Clone)]
pub struct ProcFs {
    processes: ProcessList,
}

impl ProcFs {
    pub fn new(processes: ProcessList) -> Self {
        Self { processes }
    }

    fn lookup(&self, path: &Path) -> VfsResult<Node> {
        let missing = || VfsError::not_exists(path.to_string());
        let process = |name: &str| {
            name.parse::<u64>()
                .ok()
                .and_then(|pid| self.processes.get(pid))
                .ok_or_else(missing)
        };

        match path.names() {
            [] => Ok(Node::Root),
            [pid] => Ok(Node::Process(process(pid.as_str())?)),
            [pid, file] => process(pid.as_str())?
                .field(file)
                .map(Node::Field)
                .ok_or_else(missing),
            _ => Err(missing()),
        }
    }

    fn read_only(path: &Path) -> VfsError {
        VfsError::permission_denied(format!("procfs is read-only: {path}"))
    }
}

impl FileSystem for ProcFs {
    fn statfs(&self) -> VfsResult<StatFsInfo> {
        Ok(StatFsInfo::default())
    }

    fn get_file(&self, path: &Path) -> VfsResult<File> {
        let name = path.base_name().unwrap_or("");
        let file = match self.lookup(path)? {
            Node::Root | Node::Process(_) => File::directory(name),
            Node::Field(value) => File::file(name, value.len() as u64),
        };
        Ok(file.with_system())
    }

    fn ls(&self, path: &Path) -> VfsResult<Vec<File>> {
        match self.lookup(path)? {
            Node::Root => Ok(self
                .processes
                .processes
                .read()
                .keys()
                .map(|pid| File::directory(pid.to_string()).with_system())
                .collect()),
            Node::Process(info) => Ok(PROCESS_FILES
                .iter()
                .map(|file| {
                    let size = info.field(file).map_or(0, |v| v.len() as u64);
                    File::file(*file, size).with_system()
                })
                .collect()),
            Node::Field(_) => Err(VfsError::not_a_directory(path.to_string())),
        }
    }

    fn read(&self, path: &Path, buffer: &mut [u8], offset: u64) -> VfsResult<usize> {
        let value = match self.lookup(path)? {
            Node::Field(value) => value,
            Node::Root | Node::Process(_) => return Err(VfsError::directory(path.to_string())),
        };

        let data = value.as_bytes();
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
