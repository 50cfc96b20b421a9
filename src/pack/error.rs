//! Error types for streaming tar packing.

use thiserror::Error;

use crate::header::HeaderError;

/// Errors that can occur while packing a tar stream.
#[derive(Debug, Error)]
pub enum PackError {
    /// The entry could not be encoded (path too long, size overflow, ...).
    ///
    /// Raised before any byte of the entry reaches the sink, so the packer
    /// stays usable.
    #[error("header error: {0}")]
    Header(#[from] HeaderError),

    /// The input stream ended before the declared size was reached.
    #[error("input ended after {written} of {declared} declared bytes")]
    StreamUnderrun {
        /// Declared entry size.
        declared: u64,
        /// Content bytes forwarded before the input ended.
        written: u64,
    },

    /// The input stream produced more bytes than declared.
    #[error("input produced at least {received} bytes for an entry declared as {declared}")]
    StreamOverrun {
        /// Declared entry size.
        declared: u64,
        /// Bytes received from the input, including the rejected chunk.
        received: u64,
    },

    /// The input stream reported an error mid-entry.
    #[error("input stream error: {0}")]
    Input(#[source] std::io::Error),

    /// The output sink failed to accept data or to close.
    #[error("sink error: {0}")]
    Sink(#[source] std::io::Error),

    /// The operation is not allowed in the packer's current state.
    #[error("invalid packer state: {0}")]
    InvalidState(&'static str),

    /// A new entry was started while a previous entry was still mid-stream.
    #[error("another entry is still being streamed")]
    ConcurrentEntry,

    /// `finish` was called on an already finalized archive.
    #[error("archive already finalized")]
    AlreadyFinalized,
}

impl PackError {
    /// Whether this error left a partial entry in the sink.
    ///
    /// After a fatal error the output is not a valid archive and the packer
    /// rejects every further operation. Header errors and state errors
    /// write nothing.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PackError::StreamUnderrun { .. }
                | PackError::StreamOverrun { .. }
                | PackError::Input(_)
                | PackError::Sink(_)
        )
    }
}

/// Result type for packing operations.
pub type Result<T> = std::result::Result<T, PackError>;
