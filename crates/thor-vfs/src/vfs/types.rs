//! Core VFS types.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use strum::{Display, EnumIter, EnumString, FromRepr};
use thor_types::flags::{STAT_FLAG_DIRECTORY, STAT_FLAG_HIDDEN, STAT_FLAG_SYSTEM};
use thor_types::{DateTime, StatInfo};

/// Kind of file system behind a mount.
///
/// The numeric value is what the `mount` syscall carries; the display
/// string is the label written into the mount listing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    FromRepr,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum PartitionType {
    #[strum(serialize = "FAT32")]
    Fat32 = 0,
    #[strum(serialize = "sysfs")]
    Sysfs = 1,
    #[strum(serialize = "devfs")]
    Devfs = 2,
    #[strum(serialize = "procfs")]
    Procfs = 3,
    #[strum(serialize = "Unknown")]
    Unknown = 4,
}

impl PartitionType {
    /// Decode the raw syscall argument; anything out of range is `Unknown`.
    pub fn from_raw(raw: u64) -> Self {
        u8::try_from(raw)
            .ok()
            .and_then(Self::from_repr)
            .unwrap_or(Self::Unknown)
    }
}

/// File metadata as reported by a backend.
///
/// Built per call and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Entry name (not full path).
    pub file_name: String,
    /// Size in bytes.
    pub size: u64,
    pub directory: bool,
    pub system: bool,
    pub hidden: bool,
    pub created: DateTime,
    pub modified: DateTime,
    pub accessed: DateTime,
}

impl File {
    /// A regular file entry.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            file_name: name.into(),
            size,
            ..Default::default()
        }
    }

    /// A directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            file_name: name.into(),
            directory: true,
            ..Default::default()
        }
    }

    /// Mark the entry as owned by the system.
    pub fn with_system(mut self) -> Self {
        self.system = true;
        self
    }

    pub fn with_hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Set all three timestamps.
    pub fn with_times(mut self, at: DateTime) -> Self {
        self.created = at;
        self.modified = at;
        self.accessed = at;
        self
    }

    /// `STAT_FLAG_*` bits for this entry.
    pub fn stat_flags(&self) -> u64 {
        let mut flags = 0;
        if self.directory {
            flags |= STAT_FLAG_DIRECTORY;
        }
        if self.system {
            flags |= STAT_FLAG_SYSTEM;
        }
        if self.hidden {
            flags |= STAT_FLAG_HIDDEN;
        }
        flags
    }

    pub fn to_stat_info(&self) -> StatInfo {
        StatInfo {
            flags: self.stat_flags(),
            size: self.size,
            created: self.created,
            modified: self.modified,
            accessed: self.accessed,
        }
    }
}

/// Convert a host timestamp into the kernel's calendar representation (UTC).
pub fn datetime_from_system(time: SystemTime) -> DateTime {
    let Ok(elapsed) = time.duration_since(UNIX_EPOCH) else {
        return DateTime::default();
    };
    let secs = elapsed.as_secs();
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;

    // Civil-from-days over 400-year eras
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    DateTime {
        year: year as u16,
        month: month as u8,
        day: day as u8,
        hour: (rem / 3_600) as u8,
        minutes: (rem % 3_600 / 60) as u8,
        seconds: (rem % 60) as u8,
        precise: u64::from(elapsed.subsec_millis()),
    }
}

/// Current wall-clock time.
pub fn now() -> DateTime {
    datetime_from_system(SystemTime::now())
}
