//! `open` flags and `stat` flag bits.

use serde::{Deserialize, Serialize};

/// Create the file when it does not exist.
pub const OPEN_CREATE: usize = 0x1;

pub const STAT_FLAG_DIRECTORY: u64 = 0x1;
pub const STAT_FLAG_HIDDEN: u64 = 0x2;
pub const STAT_FLAG_SYSTEM: u64 = 0x4;

/// Decoded `open` flags.
///
/// Only creation is recognized today; unknown bits are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFlags {
    /// Create if not exists.
    pub create: bool,
}

impl OpenFlags {
    /// Open an existing file only.
    pub fn read() -> Self {
        Self::default()
    }

    /// Open, creating the file if missing.
    pub fn create() -> Self {
        Self { create: true }
    }

    /// Decode the raw syscall argument.
    pub fn from_bits(bits: usize) -> Self {
        Self {
            create: bits & OPEN_CREATE != 0,
        }
    }

    /// Encode back into the raw syscall argument.
    pub fn bits(&self) -> usize {
        if self.create { OPEN_CREATE } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_flags_bits() {
        assert!(!OpenFlags::from_bits(0).create);
        assert!(OpenFlags::from_bits(OPEN_CREATE).create);
        // Unknown bits are ignored
        assert!(!OpenFlags::from_bits(0x10).create);
        assert_eq!(OpenFlags::create().bits(), OPEN_CREATE);
        assert_eq!(OpenFlags::read().bits(), 0);
    }

    #[test]
    fn test_stat_flags_are_distinct() {
        assert_eq!(STAT_FLAG_DIRECTORY & STAT_FLAG_HIDDEN, 0);
        assert_eq!(STAT_FLAG_DIRECTORY & STAT_FLAG_SYSTEM, 0);
        assert_eq!(STAT_FLAG_HIDDEN & STAT_FLAG_SYSTEM, 0);
    }
}
