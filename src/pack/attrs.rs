//! Per-entry attribute overrides.

use crate::header::{self, EntryType, Header};

use super::options::PackerOptions;

/// Optional overrides for the metadata written to an entry's header.
///
/// Every field left as `None` takes its value from the packer's
/// [`PackerOptions`]. The entry type defaults to a regular file for
/// [`TarPacker::add_entry`] and to a directory for [`TarPacker::add_dir`].
///
/// # Example
///
/// ```
/// use tarstream::pack::EntryAttributes;
///
/// let attrs = EntryAttributes::new().mode(0o600).mtime(1_700_000_000);
/// assert_eq!(attrs.mode, Some(0o600));
/// assert_eq!(attrs.uid, None);
/// ```
///
/// [`TarPacker::add_entry`]: super::TarPacker::add_entry
/// [`TarPacker::add_dir`]: super::TarPacker::add_dir
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryAttributes {
    /// Permission bits.
    pub mode: Option<u32>,
    /// Owner user ID.
    pub uid: Option<u64>,
    /// Owner group ID.
    pub gid: Option<u64>,
    /// Modification time, in whole seconds since the Unix epoch.
    pub mtime: Option<u64>,
    /// Type flag written to the header.
    pub entry_type: Option<EntryType>,
}

impl EntryAttributes {
    /// No overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the permission bits.
    #[must_use]
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Override the owner user ID.
    #[must_use]
    pub fn uid(mut self, uid: u64) -> Self {
        self.uid = Some(uid);
        self
    }

    /// Override the owner group ID.
    #[must_use]
    pub fn gid(mut self, gid: u64) -> Self {
        self.gid = Some(gid);
        self
    }

    /// Override the modification time.
    #[must_use]
    pub fn mtime(mut self, mtime: u64) -> Self {
        self.mtime = Some(mtime);
        self
    }

    /// Override the type flag.
    #[must_use]
    pub fn entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    /// Build the complete, checksummed header for an entry.
    ///
    /// `default_type` is used when no type flag override is set. The mode
    /// default depends on the resolved type.
    pub(crate) fn encode(
        &self,
        path: &str,
        size: u64,
        default_type: EntryType,
        options: &PackerOptions,
    ) -> header::Result<Header> {
        let entry_type = self.entry_type.unwrap_or(default_type);
        let default_mode = if entry_type.is_dir() {
            options.default_dir_mode
        } else {
            options.default_file_mode
        };

        let mut header = Header::new_ustar();
        header.set_path(path)?;
        header.set_size(size)?;
        header.set_mode(self.mode.unwrap_or(default_mode))?;
        header.set_uid(self.uid.unwrap_or(options.default_uid))?;
        header.set_gid(self.gid.unwrap_or(options.default_gid))?;
        header.set_mtime(self.mtime.unwrap_or(options.default_mtime))?;
        header.set_entry_type(entry_type);
        header.set_checksum();
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use crate::header::HeaderError;

    use super::*;

    #[test]
    fn test_defaults_for_file() {
        let header = EntryAttributes::new()
            .encode("a.txt", 5, EntryType::Regular, &PackerOptions::default())
            .unwrap();
        assert_eq!(header.entry_type(), EntryType::Regular);
        assert_eq!(header.mode().unwrap(), 0o644);
        assert_eq!(header.uid().unwrap(), 0);
        assert_eq!(header.gid().unwrap(), 0);
        assert_eq!(header.mtime().unwrap(), 0);
        assert_eq!(header.entry_size().unwrap(), 5);
        header.verify_checksum().unwrap();
    }

    #[test]
    fn test_defaults_for_directory() {
        let header = EntryAttributes::new()
            .encode("dir/", 0, EntryType::Directory, &PackerOptions::default())
            .unwrap();
        assert_eq!(header.entry_type(), EntryType::Directory);
        assert_eq!(header.mode().unwrap(), 0o755);
    }

    #[test]
    fn test_overrides_win() {
        let options = PackerOptions {
            default_uid: 1,
            default_gid: 2,
            default_mtime: 3,
            ..Default::default()
        };
        let attrs = EntryAttributes::new()
            .mode(0o600)
            .uid(1000)
            .gid(1001)
            .mtime(1_700_000_000)
            .entry_type(EntryType::Continuous);
        let header = attrs.encode("f", 0, EntryType::Regular, &options).unwrap();
        assert_eq!(header.mode().unwrap(), 0o600);
        assert_eq!(header.uid().unwrap(), 1000);
        assert_eq!(header.gid().unwrap(), 1001);
        assert_eq!(header.mtime().unwrap(), 1_700_000_000);
        assert_eq!(header.entry_type(), EntryType::Continuous);
    }

    #[test]
    fn test_options_fill_unset_fields() {
        let options = PackerOptions {
            default_uid: 42,
            default_mtime: 99,
            ..Default::default()
        };
        let header = EntryAttributes::new()
            .encode("f", 0, EntryType::Regular, &options)
            .unwrap();
        assert_eq!(header.uid().unwrap(), 42);
        assert_eq!(header.mtime().unwrap(), 99);
    }

    #[test]
    fn test_directory_type_override_uses_dir_mode() {
        let header = EntryAttributes::new()
            .entry_type(EntryType::Directory)
            .encode("d", 0, EntryType::Regular, &PackerOptions::default())
            .unwrap();
        assert_eq!(header.mode().unwrap(), 0o755);
    }

    #[test]
    fn test_encode_errors() {
        let options = PackerOptions::default();
        let err = EntryAttributes::new()
            .uid(1 << 40)
            .encode("f", 0, EntryType::Regular, &options)
            .unwrap_err();
        assert!(matches!(err, HeaderError::FieldOverflow { field: "uid", .. }));

        let err = EntryAttributes::new()
            .encode("f", u64::MAX, EntryType::Regular, &options)
            .unwrap_err();
        assert!(matches!(err, HeaderError::SizeOverflow { .. }));
    }
}
