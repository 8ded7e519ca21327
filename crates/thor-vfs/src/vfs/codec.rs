//! Encoders for the `entries` and `mounts` record chains.
//!
//! Layouts are defined in [`thor_types::dirent`] and
//! [`thor_types::mount_point`]. The full size is computed up front: if the
//! caller buffer is too small nothing is written at all.

use thor_types::dirent::{directory_entry_charge, directory_entry_size};
use thor_types::mount_point::mount_point_size;

use super::error::{VfsError, VfsResult};
use super::mount::MountTable;
use super::types::File;

/// Sequential writer over a caller buffer that refuses to overflow.
#[derive(Debug)]
pub struct RecordWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> RecordWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn reserve(&mut self, len: usize) -> VfsResult<&mut [u8]> {
        if len > self.remaining() {
            return Err(VfsError::BufferSmall {
                needed: self.pos + len,
                available: self.buf.len(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&mut self.buf[start..start + len])
    }

    /// Native-endian 64-bit field.
    pub fn put_u64(&mut self, value: u64) -> VfsResult<()> {
        self.reserve(8)?.copy_from_slice(&value.to_ne_bytes());
        Ok(())
    }

    /// String bytes followed by a NUL.
    pub fn put_cstr(&mut self, value: &str) -> VfsResult<()> {
        let bytes = value.as_bytes();
        let out = self.reserve(bytes.len() + 1)?;
        out[..bytes.len()].copy_from_slice(bytes);
        out[bytes.len()] = 0;
        Ok(())
    }
}

fn check_capacity(needed: usize, buf: &[u8]) -> VfsResult<()> {
    if buf.len() < needed {
        return Err(VfsError::BufferSmall {
            needed,
            available: buf.len(),
        });
    }
    Ok(())
}

/// Buffer size required for the directory listing of `files`.
///
/// Each entry is charged `32 + name length`, which exceeds its packed
/// record; see [`thor_types::dirent`].
pub fn entries_size(files: &[File]) -> usize {
    files
        .iter()
        .map(|f| directory_entry_charge(f.file_name.len()))
        .sum()
}

/// Write a directory listing, returning [`entries_size`].
///
/// The `type` field carries the entry's `STAT_FLAG_*` bits, so plain files
/// are `0`.
pub fn encode_entries(files: &[File], buf: &mut [u8]) -> VfsResult<usize> {
    let total = entries_size(files);
    check_capacity(total, buf)?;

    let mut writer = RecordWriter::new(buf);
    for (i, file) in files.iter().enumerate() {
        let size = directory_entry_size(file.file_name.len());
        let offset_next = if i + 1 < files.len() { size } else { 0 };

        writer.put_u64(file.stat_flags())?;
        writer.put_u64(file.file_name.len() as u64)?;
        writer.put_u64(offset_next as u64)?;
        writer.put_cstr(&file.file_name)?;
    }

    debug_assert!(writer.position() <= total);
    Ok(total)
}

/// Size of the mount listing for `mounts`.
pub fn mounts_size(mounts: &MountTable) -> usize {
    mounts
        .iter()
        .map(|m| {
            mount_point_size(
                m.mount_point().len(),
                m.device().len(),
                m.kind().to_string().len(),
            )
        })
        .sum()
}

/// Write the mount listing, returning the number of bytes used.
pub fn encode_mounts(mounts: &MountTable, buf: &mut [u8]) -> VfsResult<usize> {
    let total = mounts_size(mounts);
    check_capacity(total, buf)?;

    let mut writer = RecordWriter::new(buf);
    for (i, mount) in mounts.iter().enumerate() {
        let label = mount.kind().to_string();
        let size = mount_point_size(mount.mount_point().len(), mount.device().len(), label.len());
        let offset_next = if i + 1 < mounts.len() { size } else { 0 };

        writer.put_u64(mount.mount_point().len() as u64)?;
        writer.put_u64(mount.device().len() as u64)?;
        writer.put_u64(label.len() as u64)?;
        writer.put_u64(offset_next as u64)?;
        writer.put_cstr(mount.mount_point())?;
        writer.put_cstr(mount.device())?;
        writer.put_cstr(&label)?;
    }

    debug_assert_eq!(writer.position(), total);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::backends::MemoryFs;
    use crate::vfs::mount::MountEntry;
    use crate::vfs::types::PartitionType;
    use thor_types::flags::STAT_FLAG_DIRECTORY;
    use thor_types::{DirectoryEntries, MountPoints};

    fn listing() -> Vec<File> {
        vec![File::file("kernel.bin", 4096), File::directory("bin")]
    }

    #[test]
    fn test_writer_refuses_overflow() {
        let mut buf = [0u8; 10];
        let mut writer = RecordWriter::new(&mut buf);
        writer.put_u64(7).unwrap();
        assert_eq!(writer.remaining(), 2);
        assert!(matches!(
            writer.put_cstr("ab"),
            Err(VfsError::BufferSmall {
                needed: 11,
                available: 10
            })
        ));
        writer.put_cstr("a").unwrap();
        assert_eq!(writer.remaining(), 0);
    }

    #[test]
    fn test_entries_layout() {
        let files = listing();
        let total = entries_size(&files);
        assert_eq!(total, (32 + 10) + (32 + 3));

        let mut buf = vec![0xAAu8; total];
        assert_eq!(encode_entries(&files, &mut buf).unwrap(), total);
        // The chain itself is packed; the tail of the charge is left alone
        assert!(buf[63..].iter().all(|&b| b == 0xAA));

        // First record header
        assert_eq!(&buf[0..8], &0u64.to_ne_bytes());
        assert_eq!(&buf[8..16], &10u64.to_ne_bytes());
        assert_eq!(&buf[16..24], &35u64.to_ne_bytes());
        assert_eq!(&buf[24..35], b"kernel.bin\0");
        // Second record, last in chain
        assert_eq!(&buf[35..43], &STAT_FLAG_DIRECTORY.to_ne_bytes());
        assert_eq!(&buf[43..51], &3u64.to_ne_bytes());
        assert_eq!(&buf[51..59], &0u64.to_ne_bytes());
        assert_eq!(&buf[59..63], b"bin\0");
    }

    #[test]
    fn test_entries_buffer_one_short_writes_nothing() {
        let files = listing();
        let total = entries_size(&files);
        let mut buf = vec![0xAAu8; total - 1];

        let result = encode_entries(&files, &mut buf);
        assert!(matches!(result, Err(VfsError::BufferSmall { .. })));
        assert!(buf.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_entries_decode() {
        let files = listing();
        let mut buf = vec![0u8; 128];
        let written = encode_entries(&files, &mut buf).unwrap();

        let decoded: Vec<_> = DirectoryEntries::new(&buf[..written])
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].name, "kernel.bin");
        assert_eq!(decoded[1].name, "bin");
        assert_eq!(decoded[1].entry_type, STAT_FLAG_DIRECTORY);
    }

    #[test]
    fn test_empty_listing() {
        let mut buf = [0u8; 0];
        assert_eq!(encode_entries(&[], &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_mounts_layout() {
        let mut table = MountTable::new();
        table
            .add(MountEntry::new(
                PartitionType::Fat32,
                "/",
                "/dev/hda1",
                Box::new(MemoryFs::new()),
            ))
            .unwrap();
        table
            .add(MountEntry::new(
                PartitionType::Sysfs,
                "/sys/",
                "none",
                Box::new(MemoryFs::new()),
            ))
            .unwrap();

        let total = mounts_size(&table);
        let first = 32 + 3 + 1 + 9 + 5;
        assert_eq!(total, first + (32 + 3 + 5 + 4 + 5));

        let mut short = vec![0x55u8; total - 1];
        assert!(matches!(
            encode_mounts(&table, &mut short),
            Err(VfsError::BufferSmall { .. })
        ));
        assert!(short.iter().all(|&b| b == 0x55));

        let mut buf = vec![0u8; total];
        assert_eq!(encode_mounts(&table, &mut buf).unwrap(), total);
        assert_eq!(&buf[0..8], &1u64.to_ne_bytes());
        assert_eq!(&buf[8..16], &9u64.to_ne_bytes());
        assert_eq!(&buf[16..24], &5u64.to_ne_bytes());
        assert_eq!(&buf[24..32], &(first as u64).to_ne_bytes());
        assert_eq!(&buf[32..first], b"/\0/dev/hda1\0FAT32\0");
        assert_eq!(&buf[first + 24..first + 32], &0u64.to_ne_bytes());

        let decoded: Vec<_> = MountPoints::new(&buf).map(|m| m.unwrap()).collect();
        assert_eq!(decoded[1].mount_point, "/sys/");
        assert_eq!(decoded[1].device, "none");
        assert_eq!(decoded[1].fs_type, "sysfs");
    }
}
