//! Mount listing wire format.
//!
//! ```text
//! offset  size  field
//! 0       8     length_mp    mount point length, without NUL
//! 8       8     length_dev   device length, without NUL
//! 16      8     length_type  file system label length, without NUL
//! 24      8     offset_next  bytes to the next record, 0 on the last
//! 32      ...   mount point NUL device NUL label NUL
//! ```

use crate::decode::{read_str, read_u64, DecodeError, FIELD_SIZE};

/// Size of the fixed part of a mount point record.
pub const MOUNT_POINT_HEADER: usize = 4 * FIELD_SIZE;

/// Bytes taken by a mount record with the given string lengths.
pub fn mount_point_size(mount_point_len: usize, device_len: usize, type_len: usize) -> usize {
    MOUNT_POINT_HEADER + 3 + mount_point_len + device_len + type_len
}

/// One decoded mount, borrowing its strings from the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountPointRecord<'a> {
    pub mount_point: &'a str,
    pub device: &'a str,
    /// File system label, e.g. `"FAT32"` or `"sysfs"`.
    pub fs_type: &'a str,
}

/// Walks the record chain produced by `mounts`.
#[derive(Debug, Clone)]
pub struct MountPoints<'a> {
    buf: &'a [u8],
    next: Option<usize>,
}

impl<'a> MountPoints<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            next: if buf.is_empty() { None } else { Some(0) },
        }
    }

    fn decode_at(&mut self, at: usize) -> Result<MountPointRecord<'a>, DecodeError> {
        let buf = self.buf;
        if at >= buf.len() {
            return Err(DecodeError::Truncated { offset: at });
        }
        let length_mp = read_u64(buf, at, at)? as usize;
        let length_dev = read_u64(buf, at + FIELD_SIZE, at)? as usize;
        let length_type = read_u64(buf, at + 2 * FIELD_SIZE, at)? as usize;
        let offset_next = read_u64(buf, at + 3 * FIELD_SIZE, at)? as usize;

        let (mount_point, pos) = read_str(buf, at + MOUNT_POINT_HEADER, length_mp, at)?;
        let (device, pos) = read_str(buf, pos, length_dev, at)?;
        let (fs_type, _) = read_str(buf, pos, length_type, at)?;

        self.next = match offset_next {
            0 => None,
            n if n < mount_point_size(length_mp, length_dev, length_type) => {
                return Err(DecodeError::BadOffset {
                    offset: at,
                    offset_next: n,
                });
            }
            n => Some(at.saturating_add(n)),
        };

        Ok(MountPointRecord {
            mount_point,
            device,
            fs_type,
        })
    }
}

impl<'a> Iterator for MountPoints<'a> {
    type Item = Result<MountPointRecord<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next.take()?;
        Some(self.decode_at(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(mp: &str, dev: &str, ty: &str, offset_next: u64) -> Vec<u8> {
        let mut out = Vec::new();
        for len in [mp.len(), dev.len(), ty.len()] {
            out.extend_from_slice(&(len as u64).to_ne_bytes());
        }
        out.extend_from_slice(&offset_next.to_ne_bytes());
        for s in [mp, dev, ty] {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        out
    }

    #[test]
    fn test_walk_chain() {
        let first_size = mount_point_size(1, 9, 5);
        let mut buf = record("/", "/dev/hda1", "FAT32", first_size as u64);
        assert_eq!(buf.len(), first_size);
        buf.extend(record("/sys/", "none", "sysfs", 0));

        let mounts: Vec<_> = MountPoints::new(&buf).map(|m| m.unwrap()).collect();
        assert_eq!(
            mounts,
            vec![
                MountPointRecord {
                    mount_point: "/",
                    device: "/dev/hda1",
                    fs_type: "FAT32"
                },
                MountPointRecord {
                    mount_point: "/sys/",
                    device: "none",
                    fs_type: "sysfs"
                },
            ]
        );
    }

    #[test]
    fn test_missing_terminator() {
        let mut buf = record("/", "none", "devfs", 0);
        // Overwrite the NUL after the mount point
        buf[MOUNT_POINT_HEADER + 1] = b'x';
        let result = MountPoints::new(&buf).next().unwrap();
        assert_eq!(
            result,
            Err(DecodeError::MissingTerminator {
                offset: MOUNT_POINT_HEADER + 1
            })
        );
    }
}
