//! Zerocopy-based UStar header block encoding.
//!
//! Every entry in the archive is preceded by one 512-byte header block. This
//! module builds those blocks field by field and computes the checksum that
//! makes them self-consistent. A small set of read accessors is provided so
//! that emitted headers can be inspected and verified.
//!
//! # Header Field Layout
//!
//! | Offset | Size | Field     | Description                              |
//! |--------|------|-----------|------------------------------------------|
//! | 0      | 100  | name      | File path (null-terminated if < 100)     |
//! | 100    | 8    | mode      | File mode in octal ASCII                 |
//! | 108    | 8    | uid       | Owner user ID in octal ASCII             |
//! | 116    | 8    | gid       | Owner group ID in octal ASCII            |
//! | 124    | 12   | size      | File size in octal ASCII                 |
//! | 136    | 12   | mtime     | Modification time (Unix epoch, octal)    |
//! | 148    | 8    | checksum  | Header checksum in octal ASCII           |
//! | 156    | 1    | typeflag  | Entry type (see [`EntryType`])           |
//! | 157    | 100  | linkname  | Link target for hard/symbolic links      |
//! | 257    | 6    | magic     | "ustar\0"                                |
//! | 263    | 2    | version   | "00"                                     |
//! | 265    | 32   | uname     | Owner user name                          |
//! | 297    | 32   | gname     | Owner group name                         |
//! | 329    | 8    | devmajor  | Device major number                      |
//! | 337    | 8    | devminor  | Device minor number                      |
//! | 345    | 155  | prefix    | Path prefix for long names               |
//!
//! # Example
//!
//! ```
//! use tarstream::header::{EntryType, Header};
//!
//! let mut header = Header::new_ustar();
//! header.set_path("a.txt").unwrap();
//! header.set_size(5).unwrap();
//! header.set_mode(0o644).unwrap();
//! header.set_entry_type(EntryType::Regular);
//! header.set_checksum();
//!
//! assert!(header.verify_checksum().is_ok());
//! assert_eq!(header.entry_size().unwrap(), 5);
//! ```

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Size of a tar header block in bytes.
pub const HEADER_SIZE: usize = 512;

/// Size of the blocks that entry content is padded to.
pub const BLOCK_SIZE: u64 = 512;

/// Magic string for UStar format headers ("ustar\0").
pub const USTAR_MAGIC: &[u8; 6] = b"ustar\0";

/// Version field for UStar format headers ("00").
pub const USTAR_VERSION: &[u8; 2] = b"00";

/// Width of the `name` field.
pub const NAME_LEN: usize = 100;

/// Width of the UStar `prefix` field.
pub const PREFIX_LEN: usize = 155;

/// Longest path that can be stored, using a full prefix, a `/` separator and
/// a full name.
pub const MAX_PATH_LEN: usize = PREFIX_LEN + 1 + NAME_LEN;

/// Largest entry size representable in the 12-byte octal size field.
pub const MAX_ENTRY_SIZE: u64 = octal_limit(11);

const CHECKSUM_RANGE: std::ops::Range<usize> = 148..156;

/// Errors that can occur when encoding or inspecting tar headers.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The path does not fit in the name field, and cannot be split across
    /// the prefix and name fields.
    #[error("path too long: {len} bytes cannot be stored in a ustar header (limit {limit})")]
    PathTooLong {
        /// Actual path length.
        len: usize,
        /// Longest path a ustar header can hold.
        limit: usize,
    },

    /// The path is empty or contains a NUL byte.
    #[error("invalid path: {0}")]
    InvalidPath(&'static str),

    /// The declared entry size does not fit in the size field.
    #[error("entry size {size} exceeds the ustar limit of {limit} bytes")]
    SizeOverflow {
        /// Declared size.
        size: u64,
        /// Largest representable size.
        limit: u64,
    },

    /// A numeric attribute does not fit in its octal field.
    #[error("{field} value {value} exceeds field limit {limit}")]
    FieldOverflow {
        /// Name of the header field.
        field: &'static str,
        /// Requested value.
        value: u64,
        /// Largest representable value.
        limit: u64,
    },

    /// The provided data is too short to contain a header.
    #[error("insufficient data: expected {HEADER_SIZE} bytes, got {0}")]
    InsufficientData(usize),

    /// An octal field contains invalid characters.
    #[error("invalid octal field: {0:?}")]
    InvalidOctal(Vec<u8>),

    /// The header checksum does not match the computed value.
    #[error("checksum mismatch: expected {expected}, computed {computed}")]
    ChecksumMismatch {
        /// The checksum value stored in the header.
        expected: u64,
        /// The checksum computed from the header bytes.
        computed: u64,
    },
}

/// Result type for header operations.
pub type Result<T> = std::result::Result<T, HeaderError>;

/// Raw 512-byte tar header block.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct RawHeader {
    /// The raw header bytes.
    pub bytes: [u8; HEADER_SIZE],
}

impl Default for RawHeader {
    fn default() -> Self {
        Self {
            bytes: [0u8; HEADER_SIZE],
        }
    }
}

/// UStar (POSIX.1-1988 "ustar") tar header with named fields.
///
/// See module-level documentation for the field layout table.
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct UstarHeader {
    /// File path name (null-terminated if shorter than 100 bytes).
    pub name: [u8; 100],
    /// File mode in octal ASCII.
    pub mode: [u8; 8],
    /// Owner user ID in octal ASCII.
    pub uid: [u8; 8],
    /// Owner group ID in octal ASCII.
    pub gid: [u8; 8],
    /// File size in octal ASCII.
    pub size: [u8; 12],
    /// Modification time as Unix timestamp in octal ASCII.
    pub mtime: [u8; 12],
    /// Header checksum in octal ASCII.
    pub checksum: [u8; 8],
    /// Entry type flag.
    pub typeflag: u8,
    /// Link target name for hard/symbolic links.
    pub linkname: [u8; 100],
    /// Magic string identifying the format ("ustar\0").
    pub magic: [u8; 6],
    /// Format version ("00").
    pub version: [u8; 2],
    /// Owner user name (null-terminated).
    pub uname: [u8; 32],
    /// Owner group name (null-terminated).
    pub gname: [u8; 32],
    /// Device major number in octal ASCII.
    pub devmajor: [u8; 8],
    /// Device minor number in octal ASCII.
    pub devminor: [u8; 8],
    /// Path prefix for names longer than 100 bytes.
    pub prefix: [u8; 155],
    /// Padding to fill the 512-byte block.
    pub pad: [u8; 12],
}

impl fmt::Debug for UstarHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UstarHeader")
            .field("name", &String::from_utf8_lossy(truncate_null(&self.name)))
            .field("prefix", &String::from_utf8_lossy(truncate_null(&self.prefix)))
            .field("mode", &String::from_utf8_lossy(truncate_null(&self.mode)))
            .field("typeflag", &self.typeflag)
            .finish_non_exhaustive()
    }
}

/// Tar entry type indicating the kind of file system object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file (type '0' or '\0' for old tar compatibility).
    Regular,
    /// Hard link to another file in the archive (type '1').
    Link,
    /// Symbolic link (type '2').
    Symlink,
    /// Character device (type '3').
    Char,
    /// Block device (type '4').
    Block,
    /// Directory (type '5').
    Directory,
    /// FIFO/named pipe (type '6').
    Fifo,
    /// Contiguous file (type '7', rarely used).
    Continuous,
    /// Any other type flag, written verbatim.
    Other(u8),
}

impl EntryType {
    /// Parse an entry type from a raw byte value.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'0' | b'\0' => EntryType::Regular,
            b'1' => EntryType::Link,
            b'2' => EntryType::Symlink,
            b'3' => EntryType::Char,
            b'4' => EntryType::Block,
            b'5' => EntryType::Directory,
            b'6' => EntryType::Fifo,
            b'7' => EntryType::Continuous,
            other => EntryType::Other(other),
        }
    }

    /// Convert an entry type to its raw byte representation.
    ///
    /// Note that `Regular` is encoded as '0', not '\0'.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            EntryType::Regular => b'0',
            EntryType::Link => b'1',
            EntryType::Symlink => b'2',
            EntryType::Char => b'3',
            EntryType::Block => b'4',
            EntryType::Directory => b'5',
            EntryType::Fifo => b'6',
            EntryType::Continuous => b'7',
            EntryType::Other(b) => b,
        }
    }

    /// Returns true if this is a directory entry.
    #[must_use]
    pub fn is_dir(self) -> bool {
        self == EntryType::Directory
    }
}

impl From<u8> for EntryType {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<EntryType> for u8 {
    fn from(entry_type: EntryType) -> Self {
        entry_type.to_byte()
    }
}

/// A single UStar header block being built or inspected.
///
/// Setters validate that their value fits the field and leave the header
/// unchanged on error. The checksum is not kept up to date automatically:
/// call [`Header::set_checksum`] once all other fields are final.
#[derive(Clone, Copy, FromBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct Header {
    raw: RawHeader,
}

impl Header {
    /// Create a new, empty header with UStar format magic and version.
    #[must_use]
    pub fn new_ustar() -> Self {
        let mut header = Self {
            raw: RawHeader::default(),
        };
        header.raw.bytes[257..263].copy_from_slice(USTAR_MAGIC);
        header.raw.bytes[263..265].copy_from_slice(USTAR_VERSION);
        header
    }

    /// Get a reference to the underlying bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.raw.bytes
    }

    /// Get a mutable reference to the underlying bytes.
    pub fn as_mut_bytes(&mut self) -> &mut [u8; HEADER_SIZE] {
        &mut self.raw.bytes
    }

    /// Parse a header from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InsufficientData`] if the slice is too short.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Header> {
        if bytes.len() < HEADER_SIZE {
            return Err(HeaderError::InsufficientData(bytes.len()));
        }
        let raw = RawHeader::ref_from_bytes(&bytes[..HEADER_SIZE])
            .map_err(|_| HeaderError::InsufficientData(bytes.len()))?;
        Ok(zerocopy::transmute_ref!(raw))
    }

    /// View this header as a UStar header.
    #[must_use]
    pub fn as_ustar(&self) -> &UstarHeader {
        UstarHeader::ref_from_bytes(&self.raw.bytes).expect("size is correct")
    }

    /// View this header as a mutable UStar header.
    pub fn as_ustar_mut(&mut self) -> &mut UstarHeader {
        UstarHeader::mut_from_bytes(&mut self.raw.bytes).expect("size is correct")
    }

    /// Check if this header carries the UStar magic and version.
    #[must_use]
    pub fn is_ustar(&self) -> bool {
        self.raw.bytes[257..263] == *USTAR_MAGIC && self.raw.bytes[263..265] == *USTAR_VERSION
    }

    /// Store `path` in the name field, splitting it across the prefix and
    /// name fields if it is longer than 100 bytes.
    ///
    /// A path of exactly 100 bytes fills the name field without a NUL
    /// terminator. Longer paths are split at the leftmost `/` for which the
    /// prefix is at most 155 bytes and the remaining name is 1 to 100 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidPath`] for empty paths or paths with NUL
    /// bytes, and [`HeaderError::PathTooLong`] if no valid split exists.
    pub fn set_path(&mut self, path: &str) -> Result<()> {
        let bytes = path.as_bytes();
        if bytes.is_empty() {
            return Err(HeaderError::InvalidPath("path is empty"));
        }
        if bytes.contains(&0) {
            return Err(HeaderError::InvalidPath("path contains a NUL byte"));
        }

        let (prefix, name) = if bytes.len() <= NAME_LEN {
            (&[][..], bytes)
        } else {
            split_ustar_path(bytes).ok_or(HeaderError::PathTooLong {
                len: bytes.len(),
                limit: MAX_PATH_LEN,
            })?
        };

        let ustar = self.as_ustar_mut();
        ustar.name.fill(0);
        ustar.name[..name.len()].copy_from_slice(name);
        ustar.prefix.fill(0);
        ustar.prefix[..prefix.len()].copy_from_slice(prefix);
        Ok(())
    }

    /// Set the entry size.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::SizeOverflow`] if `size` exceeds
    /// [`MAX_ENTRY_SIZE`].
    pub fn set_size(&mut self, size: u64) -> Result<()> {
        if size > MAX_ENTRY_SIZE {
            return Err(HeaderError::SizeOverflow {
                size,
                limit: MAX_ENTRY_SIZE,
            });
        }
        encode_octal(&mut self.as_ustar_mut().size, size, "size")
    }

    /// Set the file mode (permission bits).
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::FieldOverflow`] if the mode exceeds `0o7777777`.
    pub fn set_mode(&mut self, mode: u32) -> Result<()> {
        encode_octal(&mut self.as_ustar_mut().mode, u64::from(mode), "mode")
    }

    /// Set the owner user ID.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::FieldOverflow`] if the uid exceeds `0o7777777`.
    pub fn set_uid(&mut self, uid: u64) -> Result<()> {
        encode_octal(&mut self.as_ustar_mut().uid, uid, "uid")
    }

    /// Set the owner group ID.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::FieldOverflow`] if the gid exceeds `0o7777777`.
    pub fn set_gid(&mut self, gid: u64) -> Result<()> {
        encode_octal(&mut self.as_ustar_mut().gid, gid, "gid")
    }

    /// Set the modification time as a Unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::FieldOverflow`] if the timestamp needs more
    /// than 11 octal digits.
    pub fn set_mtime(&mut self, mtime: u64) -> Result<()> {
        encode_octal(&mut self.as_ustar_mut().mtime, mtime, "mtime")
    }

    /// Set the entry type flag.
    pub fn set_entry_type(&mut self, entry_type: EntryType) {
        self.as_ustar_mut().typeflag = entry_type.to_byte();
    }

    /// Compute the checksum over the current contents and store it.
    ///
    /// The value is written as six octal digits followed by a NUL and a
    /// space, the layout produced by most tar implementations.
    pub fn set_checksum(&mut self) {
        let checksum = self.compute_checksum();
        let field = &mut self.as_ustar_mut().checksum;
        write_octal_digits(&mut field[..6], checksum);
        field[6] = 0;
        field[7] = b' ';
    }

    /// Get the entry type.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        EntryType::from_byte(self.raw.bytes[156])
    }

    /// Get the entry size (file content length) in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the size field is not valid.
    pub fn entry_size(&self) -> Result<u64> {
        parse_octal(&self.raw.bytes[124..136])
    }

    /// Get the file mode (permissions).
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the mode field is not valid.
    pub fn mode(&self) -> Result<u32> {
        parse_octal(&self.raw.bytes[100..108]).map(|v| v as u32)
    }

    /// Get the owner user ID.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the uid field is not valid.
    pub fn uid(&self) -> Result<u64> {
        parse_octal(&self.raw.bytes[108..116])
    }

    /// Get the owner group ID.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the gid field is not valid.
    pub fn gid(&self) -> Result<u64> {
        parse_octal(&self.raw.bytes[116..124])
    }

    /// Get the modification time as a Unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::InvalidOctal`] if the mtime field is not valid.
    pub fn mtime(&self) -> Result<u64> {
        parse_octal(&self.raw.bytes[136..148])
    }

    /// Get the raw bytes of the name field, without the prefix.
    #[must_use]
    pub fn path_bytes(&self) -> &[u8] {
        truncate_null(&self.raw.bytes[0..100])
    }

    /// Get the UStar prefix field.
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        truncate_null(&self.raw.bytes[345..500])
    }

    /// Get the full path, joining the prefix and name fields with `/`.
    #[must_use]
    pub fn full_path(&self) -> Cow<'_, [u8]> {
        let prefix = self.prefix();
        if prefix.is_empty() {
            return Cow::Borrowed(self.path_bytes());
        }
        let mut path = Vec::with_capacity(prefix.len() + 1 + NAME_LEN);
        path.extend_from_slice(prefix);
        path.push(b'/');
        path.extend_from_slice(self.path_bytes());
        Cow::Owned(path)
    }

    /// Verify the header checksum.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::ChecksumMismatch`] if the checksum is invalid,
    /// or [`HeaderError::InvalidOctal`] if the stored checksum cannot be parsed.
    pub fn verify_checksum(&self) -> Result<()> {
        let expected = parse_octal(&self.raw.bytes[CHECKSUM_RANGE])?;
        let computed = self.compute_checksum();
        if expected == computed {
            Ok(())
        } else {
            Err(HeaderError::ChecksumMismatch { expected, computed })
        }
    }

    /// Compute the header checksum.
    ///
    /// This computes the unsigned sum of all header bytes, treating the
    /// checksum field (bytes 148..156) as spaces (0x20).
    #[must_use]
    pub fn compute_checksum(&self) -> u64 {
        self.raw
            .bytes
            .iter()
            .enumerate()
            .map(|(i, &byte)| {
                if CHECKSUM_RANGE.contains(&i) {
                    u64::from(b' ')
                } else {
                    u64::from(byte)
                }
            })
            .sum()
    }

    /// Check if this header represents an empty block (all zeros).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.bytes.iter().all(|&b| b == 0)
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new_ustar()
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("path", &String::from_utf8_lossy(&self.full_path()))
            .field("entry_type", &self.entry_type())
            .field("size", &self.entry_size().ok())
            .field("mode", &self.mode().ok().map(|m| format!("{m:04o}")))
            .finish()
    }
}

/// Largest value that fits in `digits` octal digits.
const fn octal_limit(digits: usize) -> u64 {
    (1u64 << (3 * digits)) - 1
}

/// Split a long path into UStar `(prefix, name)` halves.
fn split_ustar_path(path: &[u8]) -> Option<(&[u8], &[u8])> {
    if path.len() > MAX_PATH_LEN {
        return None;
    }
    path.iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'/')
        .map(|(i, _)| (&path[..i], &path[i + 1..]))
        .find(|(prefix, name)| {
            !prefix.is_empty()
                && prefix.len() <= PREFIX_LEN
                && !name.is_empty()
                && name.len() <= NAME_LEN
        })
}

/// Encode `value` as zero-padded octal digits followed by a NUL, filling the
/// whole field.
fn encode_octal(dst: &mut [u8], value: u64, field: &'static str) -> Result<()> {
    let digits = dst.len() - 1;
    let limit = octal_limit(digits);
    if value > limit {
        return Err(HeaderError::FieldOverflow {
            field,
            value,
            limit,
        });
    }
    write_octal_digits(&mut dst[..digits], value);
    dst[digits] = 0;
    Ok(())
}

fn write_octal_digits(dst: &mut [u8], mut value: u64) {
    for slot in dst.iter_mut().rev() {
        *slot = b'0' + (value & 0o7) as u8;
        value >>= 3;
    }
}

/// Parse an octal ASCII field into a u64.
///
/// Octal fields in tar headers are ASCII strings with optional leading
/// spaces and trailing spaces or null bytes. For example:
/// - `"0000644\0"` -> 420 (file mode 0644)
/// - `"     123 "` -> 83
///
/// # Errors
///
/// Returns [`HeaderError::InvalidOctal`] if the field contains invalid
/// characters (anything other than spaces, digits 0-7, or null bytes).
pub fn parse_octal(bytes: &[u8]) -> Result<u64> {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b' ' || b == b'\0')
        .map_or(bytes.len(), |i| start + i);

    let trimmed = &bytes[start..end];

    let mut value: u64 = 0;
    for &byte in trimmed {
        if !(b'0'..=b'7').contains(&byte) {
            return Err(HeaderError::InvalidOctal(bytes.to_vec()));
        }
        value = value
            .checked_mul(8)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or_else(|| HeaderError::InvalidOctal(bytes.to_vec()))?;
    }

    Ok(value)
}

/// Truncate a byte slice at the first null byte.
///
/// ```
/// use tarstream::header::truncate_null;
///
/// assert_eq!(truncate_null(b"hello\0world"), b"hello");
/// assert_eq!(truncate_null(b"no null here"), b"no null here");
/// ```
#[must_use]
pub fn truncate_null(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(size_of::<RawHeader>(), HEADER_SIZE);
        assert_eq!(size_of::<UstarHeader>(), HEADER_SIZE);
        assert_eq!(size_of::<Header>(), HEADER_SIZE);
    }

    #[test]
    fn test_new_ustar() {
        let header = Header::new_ustar();
        assert!(header.is_ustar());
        assert!(!header.is_empty());
        assert_eq!(&header.as_ustar().magic, USTAR_MAGIC);
        assert_eq!(&header.as_ustar().version, USTAR_VERSION);
    }

    #[test]
    fn test_short_path() {
        let mut header = Header::new_ustar();
        header.set_path("a.txt").unwrap();
        assert_eq!(header.path_bytes(), b"a.txt");
        assert_eq!(header.prefix(), b"");
        assert_eq!(header.full_path().as_ref(), b"a.txt");
    }

    #[test]
    fn test_path_exactly_name_width() {
        let path = "n".repeat(NAME_LEN);
        let mut header = Header::new_ustar();
        header.set_path(&path).unwrap();
        assert_eq!(header.path_bytes(), path.as_bytes());
        assert_eq!(header.prefix(), b"");
    }

    #[test]
    fn test_path_one_past_name_width_without_slash() {
        let path = "n".repeat(NAME_LEN + 1);
        let mut header = Header::new_ustar();
        let err = header.set_path(&path).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::PathTooLong { len, limit: MAX_PATH_LEN } if len == NAME_LEN + 1
        ));
        // rejected paths leave the header untouched
        assert_eq!(header.path_bytes(), b"");
    }

    #[test]
    fn test_path_split_into_prefix() {
        let dir = "d".repeat(60);
        let file = "f".repeat(60);
        let path = format!("{dir}/{file}");
        let mut header = Header::new_ustar();
        header.set_path(&path).unwrap();
        assert_eq!(header.prefix(), dir.as_bytes());
        assert_eq!(header.path_bytes(), file.as_bytes());
        assert_eq!(header.full_path().as_ref(), path.as_bytes());
    }

    #[test]
    fn test_path_split_prefers_leftmost_slash() {
        let path = format!("a/b/{}", "f".repeat(98));
        let mut header = Header::new_ustar();
        header.set_path(&path).unwrap();
        assert_eq!(header.prefix(), b"a");
        assert_eq!(header.path_bytes(), format!("b/{}", "f".repeat(98)).as_bytes());
    }

    #[test]
    fn test_path_at_max_length() {
        let path = format!("{}/{}", "p".repeat(PREFIX_LEN), "n".repeat(NAME_LEN));
        assert_eq!(path.len(), MAX_PATH_LEN);
        let mut header = Header::new_ustar();
        header.set_path(&path).unwrap();
        assert_eq!(header.full_path().as_ref(), path.as_bytes());

        let too_long = format!("{}/{}", "p".repeat(PREFIX_LEN), "n".repeat(NAME_LEN + 1));
        assert!(matches!(
            header.set_path(&too_long),
            Err(HeaderError::PathTooLong { len, .. }) if len == MAX_PATH_LEN + 1
        ));
    }

    #[test]
    fn test_path_prefix_too_long() {
        let path = format!("{}/{}", "p".repeat(PREFIX_LEN + 1), "n".repeat(10));
        let mut header = Header::new_ustar();
        assert!(matches!(
            header.set_path(&path),
            Err(HeaderError::PathTooLong { .. })
        ));
    }

    #[test]
    fn test_invalid_paths() {
        let mut header = Header::new_ustar();
        assert!(matches!(
            header.set_path(""),
            Err(HeaderError::InvalidPath(_))
        ));
        assert!(matches!(
            header.set_path("a\0b"),
            Err(HeaderError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_numeric_fields() {
        let mut header = Header::new_ustar();
        header.set_mode(0o644).unwrap();
        header.set_uid(1000).unwrap();
        header.set_gid(100).unwrap();
        header.set_mtime(1_234_567_890).unwrap();
        header.set_size(5).unwrap();

        assert_eq!(&header.as_ustar().mode, b"0000644\0");
        assert_eq!(&header.as_ustar().size, b"00000000005\0");
        assert_eq!(header.mode().unwrap(), 0o644);
        assert_eq!(header.uid().unwrap(), 1000);
        assert_eq!(header.gid().unwrap(), 100);
        assert_eq!(header.mtime().unwrap(), 1_234_567_890);
        assert_eq!(header.entry_size().unwrap(), 5);
    }

    #[test]
    fn test_size_limits() {
        let mut header = Header::new_ustar();
        header.set_size(MAX_ENTRY_SIZE).unwrap();
        assert_eq!(&header.as_ustar().size, b"77777777777\0");
        assert_eq!(header.entry_size().unwrap(), MAX_ENTRY_SIZE);

        let err = header.set_size(MAX_ENTRY_SIZE + 1).unwrap_err();
        assert!(matches!(err, HeaderError::SizeOverflow { limit: MAX_ENTRY_SIZE, .. }));
    }

    #[test]
    fn test_field_overflow() {
        let mut header = Header::new_ustar();
        header.set_uid(0o7777777).unwrap();
        assert!(matches!(
            header.set_uid(0o10000000),
            Err(HeaderError::FieldOverflow { field: "uid", .. })
        ));
        assert!(matches!(
            header.set_mtime(1 << 33),
            Err(HeaderError::FieldOverflow { field: "mtime", .. })
        ));
    }

    #[test]
    fn test_checksum_roundtrip() {
        let mut header = Header::new_ustar();
        header.set_path("dir/file.bin").unwrap();
        header.set_size(12345).unwrap();
        header.set_mode(0o600).unwrap();
        header.set_entry_type(EntryType::Regular);
        header.set_checksum();

        header.verify_checksum().unwrap();
        assert_eq!(header.as_ustar().checksum[6], 0);
        assert_eq!(header.as_ustar().checksum[7], b' ');

        // any change after the fact breaks the checksum
        header.as_mut_bytes()[0] = b'X';
        assert!(matches!(
            header.verify_checksum(),
            Err(HeaderError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_checksum_ignores_stored_value() {
        let mut header = Header::new_ustar();
        let before = header.compute_checksum();
        header.as_mut_bytes()[CHECKSUM_RANGE].fill(b'7');
        assert_eq!(header.compute_checksum(), before);
    }

    #[test]
    fn test_parse_octal() {
        assert_eq!(parse_octal(b"0000644\0").unwrap(), 0o644);
        assert_eq!(parse_octal(b"     123 ").unwrap(), 0o123);
        assert_eq!(parse_octal(b"").unwrap(), 0);
        assert_eq!(parse_octal(b"   \0\0\0").unwrap(), 0);
        assert!(parse_octal(b"128").is_err());
    }

    #[test]
    fn test_entry_type_bytes() {
        assert_eq!(EntryType::from_byte(b'\0'), EntryType::Regular);
        assert_eq!(EntryType::Regular.to_byte(), b'0');
        assert_eq!(EntryType::from(b'5'), EntryType::Directory);
        assert_eq!(u8::from(EntryType::Other(b'Z')), b'Z');
        assert!(EntryType::Directory.is_dir());
    }

    #[test]
    fn test_from_bytes() {
        let mut header = Header::new_ustar();
        header.set_path("x").unwrap();
        let parsed = Header::from_bytes(header.as_bytes()).unwrap();
        assert_eq!(parsed.path_bytes(), b"x");
        assert!(matches!(
            Header::from_bytes(&[0u8; 10]),
            Err(HeaderError::InsufficientData(10))
        ));
    }
}
