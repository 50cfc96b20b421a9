//! Packer configuration.

use std::time::{SystemTime, UNIX_EPOCH};

/// Defaults applied to entries that don't override an attribute, and
/// tuning for the relay.
///
/// # Example
///
/// ```
/// use tarstream::pack::PackerOptions;
///
/// // Use defaults
/// let options = PackerOptions::default();
///
/// // Customize
/// let options = PackerOptions {
///     default_uid: 1000,
///     default_gid: 1000,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackerOptions {
    /// Mode for regular files and any non-directory entry.
    ///
    /// Default: `0o644`.
    pub default_file_mode: u32,

    /// Mode for directory entries.
    ///
    /// Default: `0o755`.
    pub default_dir_mode: u32,

    /// Owner user ID.
    ///
    /// Default: 0.
    pub default_uid: u64,

    /// Owner group ID.
    ///
    /// Default: 0.
    pub default_gid: u64,

    /// Modification time as a Unix timestamp.
    ///
    /// Default: 0 (the epoch), which keeps output reproducible.
    pub default_mtime: u64,

    /// Size of the read buffer used by [`TarPacker::add_reader`].
    ///
    /// This bounds the size of a single chunk forwarded to the sink.
    ///
    /// Default: 64 KiB.
    ///
    /// [`TarPacker::add_reader`]: super::TarPacker::add_reader
    pub chunk_size: usize,
}

impl Default for PackerOptions {
    fn default() -> Self {
        Self {
            default_file_mode: 0o644,
            default_dir_mode: 0o755,
            default_uid: 0,
            default_gid: 0,
            default_mtime: 0,
            chunk_size: 64 * 1024,
        }
    }
}

impl PackerOptions {
    /// Create a new `PackerOptions` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the modification time set to the current time.
    ///
    /// Falls back to the epoch if the system clock is before 1970.
    #[must_use]
    pub fn with_current_mtime() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            default_mtime: now,
            ..Self::default()
        }
    }

    /// Buffer size for reader-backed entries, never less than one byte.
    pub(crate) fn read_buffer_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = PackerOptions::default();
        assert_eq!(options.default_file_mode, 0o644);
        assert_eq!(options.default_dir_mode, 0o755);
        assert_eq!(options.default_uid, 0);
        assert_eq!(options.default_gid, 0);
        assert_eq!(options.default_mtime, 0);
        assert_eq!(options.chunk_size, 64 * 1024);
        assert_eq!(options, PackerOptions::new());
    }

    #[test]
    fn test_current_mtime() {
        let options = PackerOptions::with_current_mtime();
        // 2020-01-01
        assert!(options.default_mtime > 1_577_836_800);
        assert_eq!(options.default_file_mode, 0o644);
    }

    #[test]
    fn test_zero_chunk_size() {
        let options = PackerOptions {
            chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(options.read_buffer_size(), 1);
    }
}
