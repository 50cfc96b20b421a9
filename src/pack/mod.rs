//! Streaming tar packer.
//!
//! [`TarPacker`] turns a sequence of entries, each backed by an incrementally
//! arriving byte stream of known length, into a tar byte stream written to
//! an async sink. Neither a whole file nor the whole archive is ever held in
//! memory.
//!
//! # Overview
//!
//! Every entry goes through the same three steps, strictly in order:
//!
//! 1. A 512-byte UStar header is encoded and written.
//! 2. Content chunks are relayed from the input to the sink, one at a time,
//!    until exactly the declared size has been forwarded.
//! 3. Zero padding brings the content up to the next 512-byte boundary.
//!
//! After the last entry, [`TarPacker::finish`] writes two zero blocks and
//! closes the sink.
//!
//! # Example
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tarstream::pack::Result<()> {
//! use tarstream::pack::{EntryAttributes, TarPacker};
//!
//! let mut out = Vec::new();
//! let mut packer = TarPacker::new(&mut out);
//!
//! packer.add_dir("docs", &EntryAttributes::new()).await?;
//! let readme = &b"# hello\n"[..];
//! packer
//!     .add_reader("docs/README.md", &EntryAttributes::new().mode(0o600), 8, readme)
//!     .await?;
//! packer.finish().await?;
//!
//! assert_eq!(out.len(), 512 + (512 + 512) + 1024);
//! # Ok(())
//! # }
//! ```

mod attrs;
mod error;
mod options;
mod packer;

pub use attrs::EntryAttributes;
pub use error::{PackError, Result};
pub use options::PackerOptions;
pub use packer::{TarPacker, END_OF_ARCHIVE_BLOCKS};
