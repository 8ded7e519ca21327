//! `stat` and `statfs` records.

use serde::{Deserialize, Serialize};

use crate::flags::{STAT_FLAG_DIRECTORY, STAT_FLAG_HIDDEN, STAT_FLAG_SYSTEM};

/// Wall-clock timestamp as kept by the kernel RTC.
///
/// All zero means "unknown", which is what synthetic files report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minutes: u8,
    pub seconds: u8,
    /// Sub-second ticks.
    pub precise: u64,
}

impl DateTime {
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minutes: u8, seconds: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minutes,
            seconds,
            precise: 0,
        }
    }
}

/// Result of `stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatInfo {
    /// Combination of the `STAT_FLAG_*` bits.
    pub flags: u64,
    /// Size in bytes.
    pub size: u64,
    pub created: DateTime,
    pub modified: DateTime,
    pub accessed: DateTime,
}

impl StatInfo {
    pub fn is_directory(&self) -> bool {
        self.flags & STAT_FLAG_DIRECTORY != 0
    }

    pub fn is_hidden(&self) -> bool {
        self.flags & STAT_FLAG_HIDDEN != 0
    }

    pub fn is_system(&self) -> bool {
        self.flags & STAT_FLAG_SYSTEM != 0
    }
}

/// Result of `statfs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatFsInfo {
    /// Capacity in bytes.
    pub total_size: u64,
    /// Free space in bytes.
    pub free_size: u64,
}
