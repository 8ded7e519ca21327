//! Directory listing wire format.
//!
//! ```text
//! offset  size      field
//! 0       8         type         STAT_FLAG_* bits of the entry (0 = file)
//! 8       8         length       name length in bytes, without NUL
//! 16      8         offset_next  bytes to the next record, 0 on the last
//! 24      length+1  name         NUL-terminated
//! ```
//!
//! Records are packed back to back at `offset_next`, but the size an
//! `entries` call requires and reports charges each record a full 8-byte
//! slot for the name's first byte and terminator: `32 + length`, the size
//! of the C record header. The reported total is therefore a little more
//! than the bytes the chain occupies.

use crate::decode::{read_str, read_u64, DecodeError, FIELD_SIZE};

/// Size of the fixed part of a directory entry record.
pub const DIRECTORY_ENTRY_HEADER: usize = 3 * FIELD_SIZE;

/// Bytes taken by the record of an entry whose name is `name_len` long.
pub fn directory_entry_size(name_len: usize) -> usize {
    DIRECTORY_ENTRY_HEADER + name_len + 1
}

/// Bytes an entry is charged in the listing total.
pub fn directory_entry_charge(name_len: usize) -> usize {
    DIRECTORY_ENTRY_HEADER + FIELD_SIZE + name_len
}

/// One decoded directory entry, borrowing its name from the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry<'a> {
    pub entry_type: u64,
    pub name: &'a str,
}

/// Walks the record chain produced by `entries`.
///
/// Pass exactly the bytes reported by the call; an empty slice is an
/// empty directory. The iterator stops after the first error.
#[derive(Debug, Clone)]
pub struct DirectoryEntries<'a> {
    buf: &'a [u8],
    next: Option<usize>,
}

impl<'a> DirectoryEntries<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            next: if buf.is_empty() { None } else { Some(0) },
        }
    }

    fn decode_at(&mut self, at: usize) -> Result<DirectoryEntry<'a>, DecodeError> {
        let buf = self.buf;
        if at >= buf.len() {
            return Err(DecodeError::Truncated { offset: at });
        }
        let entry_type = read_u64(buf, at, at)?;
        let length = read_u64(buf, at + FIELD_SIZE, at)? as usize;
        let offset_next = read_u64(buf, at + 2 * FIELD_SIZE, at)? as usize;
        let (name, _) = read_str(buf, at + DIRECTORY_ENTRY_HEADER, length, at)?;

        self.next = match offset_next {
            0 => None,
            n if n < directory_entry_size(length) => {
                return Err(DecodeError::BadOffset {
                    offset: at,
                    offset_next: n,
                });
            }
            n => Some(at.saturating_add(n)),
        };

        Ok(DirectoryEntry { entry_type, name })
    }
}

impl<'a> Iterator for DirectoryEntries<'a> {
    type Item = Result<DirectoryEntry<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next.take()?;
        Some(self.decode_at(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entry_type: u64, name: &str, offset_next: u64) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&entry_type.to_ne_bytes());
        out.extend_from_slice(&(name.len() as u64).to_ne_bytes());
        out.extend_from_slice(&offset_next.to_ne_bytes());
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out
    }

    #[test]
    fn test_walk_chain() {
        let mut buf = record(0, "kernel.bin", directory_entry_size(10) as u64);
        buf.extend(record(1, "bin", 0));

        let entries: Vec<_> = DirectoryEntries::new(&buf).map(|e| e.unwrap()).collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "kernel.bin");
        assert_eq!(entries[0].entry_type, 0);
        assert_eq!(entries[1].name, "bin");
        assert_eq!(entries[1].entry_type, 1);
    }

    #[test]
    fn test_charge_covers_record() {
        assert_eq!(directory_entry_charge(0), 32);
        assert_eq!(directory_entry_charge(10), 42);
        for len in 0..16 {
            assert!(directory_entry_charge(len) >= directory_entry_size(len));
        }
    }

    #[test]
    fn test_empty_buffer_is_empty_listing() {
        assert_eq!(DirectoryEntries::new(&[]).count(), 0);
    }

    #[test]
    fn test_offset_inside_record_is_rejected() {
        let buf = record(0, "abc", 4);
        let mut iter = DirectoryEntries::new(&buf);
        assert_eq!(
            iter.next(),
            Some(Err(DecodeError::BadOffset {
                offset: 0,
                offset_next: 4
            }))
        );
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_truncated_chain() {
        let buf = record(0, "abc", directory_entry_size(3) as u64);
        let results: Vec<_> = DirectoryEntries::new(&buf).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1],
            Err(DecodeError::Truncated {
                offset: directory_entry_size(3)
            })
        );
    }
}
