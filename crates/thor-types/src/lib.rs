//! Kernel/user ABI shared by the Thor VFS and the programs that call it.
//!
//! This crate is a pure leaf: no internal dependencies, nothing that needs
//! the kernel to be present. Both sides of the syscall boundary agree on
//! these definitions.
//!
//! # Contents
//!
//! |-----------------------|------------------------------------------------|
//! | Module                | Purpose                                        |
//! |-----------------------|------------------------------------------------|
//! | [`errors`]            | Positive error codes (negated at the syscall)  |
//! | [`flags`]             | `open` flags and `stat` flag bits              |
//! | [`stat`]              | `stat`/`statfs` records and the RTC timestamp  |
//! | [`dirent`]            | Directory listing wire format + decoder        |
//! | [`mount_point`]       | Mount listing wire format + decoder            |
//! |-----------------------|------------------------------------------------|
//!
//! # Wire formats
//!
//! `entries` and `mounts` fill a caller buffer with a chain of variable
//! length records. Every integer field is a 64-bit value in native byte
//! order, and each record carries `offset_next`: the distance in bytes from
//! the start of the record to the start of the next one, or `0` on the last
//! record. Strings follow the fixed header and are NUL-terminated.

pub mod decode;
pub mod dirent;
pub mod errors;
pub mod flags;
pub mod mount_point;
pub mod stat;

pub use decode::DecodeError;
pub use dirent::{DirectoryEntries, DirectoryEntry};
pub use flags::OpenFlags;
pub use mount_point::{MountPointRecord, MountPoints};
pub use stat::{DateTime, StatFsInfo, StatInfo};
