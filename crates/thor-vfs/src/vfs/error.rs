//! VFS error types.
//!
//! Every variant maps onto a kernel error code from
//! [`thor_types::errors`]. Backends report failures with these variants
//! (their positive code is what the backend "returns"); the syscall layer
//! negates the code on the way out.

use thiserror::Error;
use thor_types::errors::*;

/// VFS error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    /// File or directory not found.
    #[error("not found: {0}")]
    NotExists(String),

    /// No file system is mounted where one was needed.
    #[error("nothing mounted")]
    NothingMounted,

    /// Empty or malformed path.
    #[error("invalid path: {0}")]
    InvalidFilePath(String),

    /// Expected a file, found a directory.
    #[error("is a directory: {0}")]
    Directory(String),

    /// Handle is not bound to anything.
    #[error("invalid file descriptor: {0}")]
    InvalidFileDescriptor(usize),

    /// Generic backend failure.
    #[error("operation failed")]
    Failed,

    /// Path already exists.
    #[error("already exists: {0}")]
    Exists(String),

    /// Caller buffer cannot hold the result.
    #[error("buffer too small: {needed} bytes needed, {available} available")]
    BufferSmall { needed: usize, available: usize },

    /// No backend for the requested file system kind.
    #[error("invalid file system")]
    InvalidFileSystem,

    #[error("disk full")]
    DiskFull,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid offset: {0}")]
    InvalidOffset(u64),

    #[error("unsupported operation")]
    Unsupported,

    #[error("invalid count: {0}")]
    InvalidCount(u64),

    #[error("invalid request")]
    InvalidRequest,

    #[error("invalid device: {0}")]
    InvalidDevice(String),

    /// Mount point already in use.
    #[error("already mounted: {0}")]
    AlreadyMounted(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Backend specific code, passed through untranslated.
    #[error("backend error {0}")]
    Backend(u64),
}

impl VfsError {
    pub fn not_exists(path: impl Into<String>) -> Self {
        Self::NotExists(path.into())
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidFilePath(path.into())
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self::Directory(path.into())
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Self::Exists(path.into())
    }

    pub fn permission_denied(what: impl Into<String>) -> Self {
        Self::PermissionDenied(what.into())
    }

    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    pub fn directory_not_empty(path: impl Into<String>) -> Self {
        Self::DirectoryNotEmpty(path.into())
    }

    /// Positive kernel error code.
    pub fn code(&self) -> u64 {
        match self {
            VfsError::NotExists(_) => ERROR_NOT_EXISTS,
            VfsError::NothingMounted => ERROR_NOTHING_MOUNTED,
            VfsError::InvalidFilePath(_) => ERROR_INVALID_FILE_PATH,
            VfsError::Directory(_) => ERROR_DIRECTORY,
            VfsError::InvalidFileDescriptor(_) => ERROR_INVALID_FILE_DESCRIPTOR,
            VfsError::Failed => ERROR_FAILED,
            VfsError::Exists(_) => ERROR_EXISTS,
            VfsError::BufferSmall { .. } => ERROR_BUFFER_SMALL,
            VfsError::InvalidFileSystem => ERROR_INVALID_FILE_SYSTEM,
            VfsError::DiskFull => ERROR_DISK_FULL,
            VfsError::PermissionDenied(_) => ERROR_PERMISSION_DENIED,
            VfsError::InvalidOffset(_) => ERROR_INVALID_OFFSET,
            VfsError::Unsupported => ERROR_UNSUPPORTED,
            VfsError::InvalidCount(_) => ERROR_INVALID_COUNT,
            VfsError::InvalidRequest => ERROR_INVALID_REQUEST,
            VfsError::InvalidDevice(_) => ERROR_INVALID_DEVICE,
            VfsError::AlreadyMounted(_) => ERROR_ALREADY_MOUNTED,
            VfsError::NotADirectory(_) => ERROR_NOT_DIRECTORY,
            VfsError::DirectoryNotEmpty(_) => ERROR_DIRECTORY_NOT_EMPTY,
            VfsError::Backend(code) => *code,
        }
    }

    /// Rebuild an error from a positive code, e.g. one reported by a
    /// backend written against the raw convention. Context strings are
    /// lost; unknown codes become [`VfsError::Backend`], while 0 and codes
    /// that cannot be negated into an `i64` become [`VfsError::Failed`].
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => VfsError::Failed,
            code if code > i64::MAX as u64 => VfsError::Failed,
            ERROR_NOT_EXISTS => VfsError::NotExists(String::new()),
            ERROR_NOTHING_MOUNTED => VfsError::NothingMounted,
            ERROR_INVALID_FILE_PATH => VfsError::InvalidFilePath(String::new()),
            ERROR_DIRECTORY => VfsError::Directory(String::new()),
            ERROR_INVALID_FILE_DESCRIPTOR => VfsError::InvalidFileDescriptor(0),
            ERROR_FAILED => VfsError::Failed,
            ERROR_EXISTS => VfsError::Exists(String::new()),
            ERROR_BUFFER_SMALL => VfsError::BufferSmall {
                needed: 0,
                available: 0,
            },
            ERROR_INVALID_FILE_SYSTEM => VfsError::InvalidFileSystem,
            ERROR_DISK_FULL => VfsError::DiskFull,
            ERROR_PERMISSION_DENIED => VfsError::PermissionDenied(String::new()),
            ERROR_INVALID_OFFSET => VfsError::InvalidOffset(0),
            ERROR_UNSUPPORTED => VfsError::Unsupported,
            ERROR_INVALID_COUNT => VfsError::InvalidCount(0),
            ERROR_INVALID_REQUEST => VfsError::InvalidRequest,
            ERROR_INVALID_DEVICE => VfsError::InvalidDevice(String::new()),
            ERROR_ALREADY_MOUNTED => VfsError::AlreadyMounted(String::new()),
            ERROR_NOT_DIRECTORY => VfsError::NotADirectory(String::new()),
            ERROR_DIRECTORY_NOT_EMPTY => VfsError::DirectoryNotEmpty(String::new()),
            other => VfsError::Backend(other),
        }
    }

    /// Convert a raw backend status (0 = success, positive = error code).
    pub fn check(status: u64) -> VfsResult<()> {
        match status {
            0 => Ok(()),
            code => Err(Self::from_code(code)),
        }
    }

    /// The value handed back across the syscall boundary. Always negative.
    pub fn to_syscall(&self) -> i64 {
        match i64::try_from(self.code()) {
            Ok(code) if code > 0 => -code,
            _ => -(ERROR_FAILED as i64),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
