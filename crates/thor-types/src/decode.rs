//! Shared helpers for walking the enumeration record chains.

use thiserror::Error;

/// Width of every integer field in the wire formats.
pub const FIELD_SIZE: usize = 8;

/// A record chain could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A field or string runs past the end of the buffer.
    #[error("record at offset {offset} is truncated")]
    Truncated { offset: usize },

    /// A string is not followed by its NUL terminator.
    #[error("missing NUL terminator at offset {offset}")]
    MissingTerminator { offset: usize },

    /// A string is not valid UTF-8.
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// `offset_next` points back into the current record.
    #[error("record at offset {offset} has offset_next {offset_next} shorter than the record")]
    BadOffset { offset: usize, offset_next: usize },
}

/// Read the native-endian 64-bit field at `at`.
pub(crate) fn read_u64(buf: &[u8], at: usize, record: usize) -> Result<u64, DecodeError> {
    let bytes = at
        .checked_add(FIELD_SIZE)
        .and_then(|end| buf.get(at..end))
        .ok_or(DecodeError::Truncated { offset: record })?;
    let mut raw = [0u8; FIELD_SIZE];
    raw.copy_from_slice(bytes);
    Ok(u64::from_ne_bytes(raw))
}

/// Read `len` bytes of string at `at`, checking the trailing NUL.
///
/// Returns the string and the position just past its terminator.
pub(crate) fn read_str(
    buf: &[u8],
    at: usize,
    len: usize,
    record: usize,
) -> Result<(&str, usize), DecodeError> {
    let end = at
        .checked_add(len)
        .ok_or(DecodeError::Truncated { offset: record })?;
    let bytes = buf
        .get(at..end)
        .ok_or(DecodeError::Truncated { offset: record })?;
    match buf.get(end) {
        Some(0) => {}
        Some(_) => return Err(DecodeError::MissingTerminator { offset: end }),
        None => return Err(DecodeError::Truncated { offset: record }),
    }
    let s = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { offset: at })?;
    Ok((s, end + 1))
}
