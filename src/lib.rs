//! Streaming TAR archive packer.
//!
//! This crate writes UStar tar archives incrementally to any
//! [`tokio::io::AsyncWrite`] sink. Entry content is relayed chunk by chunk
//! from a [`futures::Stream`] or a [`tokio::io::AsyncRead`], with each chunk
//! accepted by the sink before the next one is pulled, so the archive is
//! never buffered in memory.
//!
//! - [`header`]: encoding of the 512-byte header blocks.
//! - [`pack`]: the [`TarPacker`] that sequences headers, content, padding and
//!   the end-of-archive marker.

pub mod header;
pub mod pack;

pub use header::{EntryType, Header, HeaderError};
pub use pack::{EntryAttributes, PackError, PackerOptions, TarPacker};
