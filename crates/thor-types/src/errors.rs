//! Kernel error codes.
//!
//! Backends and the VFS work with these as positive values. The syscall
//! boundary negates them, so userspace sees "negative means failure".

pub const ERROR_NOT_EXISTS: u64 = 1;
pub const ERROR_NOT_EXECUTABLE: u64 = 2;
pub const ERROR_FAILED_EXECUTION: u64 = 3;
pub const ERROR_NOTHING_MOUNTED: u64 = 4;
pub const ERROR_INVALID_FILE_PATH: u64 = 5;
/// The target is a directory where a file was expected.
pub const ERROR_DIRECTORY: u64 = 6;
pub const ERROR_INVALID_FILE_DESCRIPTOR: u64 = 7;
pub const ERROR_FAILED: u64 = 8;
pub const ERROR_EXISTS: u64 = 9;
pub const ERROR_BUFFER_SMALL: u64 = 10;
pub const ERROR_INVALID_FILE_SYSTEM: u64 = 11;
pub const ERROR_DISK_FULL: u64 = 12;
pub const ERROR_PERMISSION_DENIED: u64 = 13;
pub const ERROR_INVALID_OFFSET: u64 = 14;
pub const ERROR_UNSUPPORTED: u64 = 15;
pub const ERROR_INVALID_COUNT: u64 = 16;
pub const ERROR_INVALID_REQUEST: u64 = 17;
pub const ERROR_INVALID_DEVICE: u64 = 18;
pub const ERROR_ALREADY_MOUNTED: u64 = 19;
pub const ERROR_NOT_DIRECTORY: u64 = 20;
pub const ERROR_DIRECTORY_NOT_EMPTY: u64 = 21;

/// Human readable message for a code, as printed by userspace tools.
pub fn error_message(code: u64) -> &'static str {
    match code {
        ERROR_NOT_EXISTS => "The file does not exist",
        ERROR_NOT_EXECUTABLE => "The file is not an executable",
        ERROR_FAILED_EXECUTION => "Execution failed",
        ERROR_NOTHING_MOUNTED => "Nothing is mounted",
        ERROR_INVALID_FILE_PATH => "The file path is not valid",
        ERROR_DIRECTORY => "The file is a directory",
        ERROR_INVALID_FILE_DESCRIPTOR => "Invalid file descriptor",
        ERROR_FAILED => "Failed",
        ERROR_EXISTS => "The file exists",
        ERROR_BUFFER_SMALL => "The buffer is too small",
        ERROR_INVALID_FILE_SYSTEM => "Invalid file system",
        ERROR_DISK_FULL => "The disk is full",
        ERROR_PERMISSION_DENIED => "Permission denied",
        ERROR_INVALID_OFFSET => "Invalid offset",
        ERROR_UNSUPPORTED => "Unsupported operation",
        ERROR_INVALID_COUNT => "Invalid count",
        ERROR_INVALID_REQUEST => "Invalid request",
        ERROR_INVALID_DEVICE => "Invalid device",
        ERROR_ALREADY_MOUNTED => "Something is already mounted",
        ERROR_NOT_DIRECTORY => "The file is not a directory",
        ERROR_DIRECTORY_NOT_EMPTY => "The directory is not empty",
        _ => "Unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_cover_table() {
        for code in ERROR_NOT_EXISTS..=ERROR_DIRECTORY_NOT_EMPTY {
            assert_ne!(error_message(code), "Unknown error", "code {code}");
        }
        assert_eq!(error_message(0), "Unknown error");
        assert_eq!(error_message(999), "Unknown error");
    }
}
