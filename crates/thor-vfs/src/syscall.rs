//! Raw syscall surface.
//!
//! Mirrors [`Vfs`] with the kernel's calling convention: a non-negative
//! `i64` on success, the negated error code on failure. Out-parameters are
//! only written on success.

use thor_types::{OpenFlags, StatFsInfo, StatInfo};

use crate::vfs::{PartitionType, Vfs, VfsError, VfsResult};

/// Collapse a result into the syscall return value.
pub fn to_syscall<T: Into<i64>>(result: VfsResult<T>) -> i64 {
    match result {
        Ok(value) => value.into(),
        Err(err) => err.to_syscall(),
    }
}

fn unit(result: VfsResult<()>) -> i64 {
    to_syscall(result.map(|()| 0))
}

/// Byte counts that do not fit the positive half of an `i64` are
/// reported as `InvalidCount`.
fn count(result: VfsResult<usize>) -> i64 {
    to_syscall(result.and_then(|n| {
        i64::try_from(n).map_err(|_| VfsError::InvalidCount(n as u64))
    }))
}

pub fn init(vfs: &mut Vfs) -> i64 {
    unit(vfs.init(&Default::default()))
}

/// `kind` is the raw partition type; unknown values mount nothing.
pub fn mount(vfs: &mut Vfs, kind: u64, mp_fd: usize, dev_fd: usize) -> i64 {
    unit(vfs.mount(PartitionType::from_raw(kind), mp_fd, dev_fd))
}

pub fn unmount(vfs: &mut Vfs, mount_point: &str) -> i64 {
    unit(vfs.unmount(mount_point))
}

pub fn statfs(vfs: &Vfs, mount_point: &str, info: &mut StatFsInfo) -> i64 {
    unit(vfs.statfs(mount_point).map(|result| *info = result))
}

pub fn open(vfs: &Vfs, file: &str, flags: usize) -> i64 {
    count(vfs.open(file, OpenFlags::from_bits(flags)))
}

pub fn close(vfs: &Vfs, fd: usize) {
    vfs.close(fd);
}

pub fn mkdir(vfs: &Vfs, directory: &str) -> i64 {
    unit(vfs.mkdir(directory))
}

pub fn rm(vfs: &Vfs, file: &str) -> i64 {
    unit(vfs.rm(file))
}

pub fn stat(vfs: &Vfs, fd: usize, info: &mut StatInfo) -> i64 {
    unit(vfs.stat(fd).map(|result| *info = result))
}

pub fn read(vfs: &Vfs, fd: usize, buffer: &mut [u8], offset: u64) -> i64 {
    count(vfs.read(fd, buffer, offset))
}

pub fn write(vfs: &Vfs, fd: usize, buffer: &[u8], offset: u64) -> i64 {
    count(vfs.write(fd, buffer, offset))
}

pub fn clear(vfs: &Vfs, fd: usize, count_bytes: usize, offset: u64) -> i64 {
    count(vfs.clear(fd, count_bytes, offset))
}

pub fn truncate(vfs: &Vfs, fd: usize, size: u64) -> i64 {
    unit(vfs.truncate(fd, size))
}

pub fn direct_read(vfs: &Vfs, file: &str, buffer: &mut [u8], offset: u64) -> i64 {
    count(vfs.direct_read(file, buffer, offset))
}

pub fn direct_write(vfs: &Vfs, file: &str, buffer: &[u8], offset: u64) -> i64 {
    count(vfs.direct_write(file, buffer, offset))
}

pub fn direct_read_to_string(vfs: &Vfs, file: &str, content: &mut String) -> i64 {
    count(vfs.direct_read_to_string(file, content))
}

pub fn entries(vfs: &Vfs, fd: usize, buffer: &mut [u8]) -> i64 {
    count(vfs.entries(fd, buffer))
}

pub fn mounts(vfs: &Vfs, buffer: &mut [u8]) -> i64 {
    count(vfs.mounts(buffer))
}
