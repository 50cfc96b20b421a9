//! Streaming tar packer with backpressure.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::pin::pin;

use futures::{Stream, StreamExt};
use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::header::{EntryType, BLOCK_SIZE, HEADER_SIZE};

use super::attrs::EntryAttributes;
use super::error::{PackError, Result};
use super::options::PackerOptions;

/// Number of all-zero blocks that terminate an archive.
pub const END_OF_ARCHIVE_BLOCKS: usize = 2;

const ZERO_BLOCK: [u8; HEADER_SIZE] = [0u8; HEADER_SIZE];

/// Content accounting for the entry currently being streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Progress {
    declared: u64,
    written: u64,
}

impl Progress {
    fn new(declared: u64) -> Self {
        Self {
            declared,
            written: 0,
        }
    }

    fn remaining(&self) -> u64 {
        self.declared - self.written
    }

    /// Zero bytes needed after the content to reach the next block boundary.
    fn padding(&self) -> u64 {
        self.declared.next_multiple_of(BLOCK_SIZE) - self.declared
    }
}

/// Where the packer is in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Between entries; a new entry or finalization may start.
    Idle,
    /// A header has been emitted and content is being relayed.
    Streaming(Progress),
    /// End-of-archive markers are being written.
    Closing,
    /// A fatal error left a partial archive in the sink.
    Failed,
    /// Markers written and the sink closed.
    Finished,
}

/// Streaming tar packer writing to an [`AsyncWrite`] sink.
///
/// Entries are added one at a time. Each call emits a header block, relays
/// the content chunk by chunk and pads it to the next 512-byte boundary.
/// Every chunk is fully accepted by the sink before the next one is pulled
/// from the input, so a slow sink throttles the producer and at most one
/// chunk is held in memory.
///
/// The sink can be borrowed (`TarPacker::new(&mut sink)`) so that the caller
/// keeps ownership of it.
///
/// # Example
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use futures::stream;
/// use tarstream::pack::{EntryAttributes, TarPacker};
///
/// let mut out = Vec::new();
/// let mut packer = TarPacker::new(&mut out);
/// let body = stream::iter([Ok::<_, std::io::Error>(&b"hello"[..])]);
/// packer
///     .add_entry("a.txt", &EntryAttributes::new(), 5, body)
///     .await
///     .unwrap();
/// packer.finish().await.unwrap();
///
/// assert_eq!(out.len(), 512 + 512 + 1024);
/// # }
/// ```
///
/// # Errors and cancellation
///
/// Header encoding errors are reported before anything is written and leave
/// the packer usable. Any later error (input failure, size mismatch, sink
/// failure) leaves a partial entry in the sink; the packer then rejects all
/// further operations. Dropping an `add_*` future mid-entry has the same
/// effect: later entries fail with [`PackError::ConcurrentEntry`] and
/// [`finish`] fails with [`PackError::InvalidState`].
///
/// [`finish`]: TarPacker::finish
#[derive(Debug)]
pub struct TarPacker<W> {
    sink: W,
    options: PackerOptions,
    cursor: Cursor,
    bytes_written: u64,
    entries: u64,
}

impl<W: AsyncWrite + Unpin> TarPacker<W> {
    /// Create a packer with default options.
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, PackerOptions::default())
    }

    /// Create a packer with the given options.
    pub fn with_options(sink: W, options: PackerOptions) -> Self {
        Self {
            sink,
            options,
            cursor: Cursor::Idle,
            bytes_written: 0,
            entries: 0,
        }
    }

    /// Add a regular file whose content arrives as a stream of chunks.
    ///
    /// Resolves once the header, exactly `size` content bytes and the
    /// padding have been accepted by the sink. Chunks of any size are
    /// accepted; empty chunks are skipped.
    ///
    /// # Errors
    ///
    /// - [`PackError::Header`] if the path, size or attributes cannot be
    ///   encoded. Nothing is written.
    /// - [`PackError::StreamUnderrun`] if the stream ends early.
    /// - [`PackError::StreamOverrun`] if the stream yields more than `size`
    ///   bytes. The offending chunk is not forwarded.
    /// - [`PackError::Input`] if the stream yields an error.
    /// - [`PackError::Sink`] if the sink fails.
    pub async fn add_entry<S, B>(
        &mut self,
        path: &str,
        attrs: &EntryAttributes,
        size: u64,
        input: S,
    ) -> Result<()>
    where
        S: Stream<Item = std::io::Result<B>>,
        B: AsRef<[u8]>,
    {
        let mut progress = self.begin_entry(path, attrs, size, EntryType::Regular).await?;
        let mut input = pin!(input);

        let result = async {
            while let Some(chunk) = input.next().await {
                let chunk = chunk.map_err(PackError::Input)?;
                self.forward(&mut progress, chunk.as_ref()).await?;
            }
            self.end_entry(path, progress).await
        }
        .await;
        self.settle(result)
    }

    /// Add a regular file whose content is read from an [`AsyncRead`].
    ///
    /// The reader is drained through a buffer of at most
    /// [`PackerOptions::chunk_size`] bytes. Errors are the same as for
    /// [`TarPacker::add_entry`].
    pub async fn add_reader<R: AsyncRead>(
        &mut self,
        path: &str,
        attrs: &EntryAttributes,
        size: u64,
        reader: R,
    ) -> Result<()> {
        let mut progress = self.begin_entry(path, attrs, size, EntryType::Regular).await?;
        let mut reader = pin!(reader);
        // one byte past the declared size is enough to detect an overrun
        let buflen = usize::try_from(size.saturating_add(1))
            .unwrap_or(usize::MAX)
            .min(self.options.read_buffer_size());
        let mut buf = vec![0u8; buflen];

        let result = async {
            loop {
                let n = match reader.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(PackError::Input(e)),
                };
                self.forward(&mut progress, &buf[..n]).await?;
            }
            self.end_entry(path, progress).await
        }
        .await;
        self.settle(result)
    }

    /// Add a directory entry.
    ///
    /// A trailing `/` is appended to `path` if it is missing. Directories
    /// carry no content, so only the header block is written.
    pub async fn add_dir(&mut self, path: &str, attrs: &EntryAttributes) -> Result<()> {
        let path = if path.ends_with('/') {
            Cow::Borrowed(path)
        } else {
            Cow::Owned(format!("{path}/"))
        };
        let progress = self
            .begin_entry(&path, attrs, 0, EntryType::Directory)
            .await?;
        let result = self.end_entry(&path, progress).await;
        self.settle(result)
    }

    /// Write the end-of-archive marker and close the sink.
    ///
    /// # Errors
    ///
    /// - [`PackError::AlreadyFinalized`] on a second call.
    /// - [`PackError::InvalidState`] if an entry is mid-stream or a previous
    ///   error left the archive incomplete. Nothing is written.
    /// - [`PackError::Sink`] if writing the markers or closing fails.
    pub async fn finish(&mut self) -> Result<()> {
        match self.cursor {
            Cursor::Idle => {}
            Cursor::Finished => return Err(PackError::AlreadyFinalized),
            Cursor::Streaming(_) => {
                return Err(PackError::InvalidState(
                    "cannot finalize while an entry is mid-stream",
                ))
            }
            Cursor::Closing => {
                return Err(PackError::InvalidState("finalization was interrupted"))
            }
            Cursor::Failed => {
                return Err(PackError::InvalidState(
                    "a previous error left the archive incomplete",
                ))
            }
        }

        self.cursor = Cursor::Closing;
        let result = async {
            for _ in 0..END_OF_ARCHIVE_BLOCKS {
                self.emit(&ZERO_BLOCK).await?;
            }
            self.sink.shutdown().await.map_err(PackError::Sink)
        }
        .await;
        self.settle(result)?;

        self.cursor = Cursor::Finished;
        debug!(
            "finalized archive: {} entries, {} bytes",
            self.entries, self.bytes_written
        );
        Ok(())
    }

    /// Validate the cursor, encode the header and write it.
    async fn begin_entry(
        &mut self,
        path: &str,
        attrs: &EntryAttributes,
        size: u64,
        default_type: EntryType,
    ) -> Result<Progress> {
        match self.cursor {
            Cursor::Idle => {}
            Cursor::Streaming(_) => return Err(PackError::ConcurrentEntry),
            Cursor::Closing | Cursor::Finished => {
                return Err(PackError::InvalidState("archive already finalized"))
            }
            Cursor::Failed => {
                return Err(PackError::InvalidState(
                    "a previous error left the archive incomplete",
                ))
            }
        }

        let header = attrs.encode(path, size, default_type, &self.options)?;
        let progress = Progress::new(size);
        self.cursor = Cursor::Streaming(progress);
        debug!("adding {path:?} ({size} bytes)");

        let result = self.emit(header.as_bytes()).await;
        self.settle(result)?;
        Ok(progress)
    }

    /// Relay one content chunk, refusing anything past the declared size.
    async fn forward(&mut self, progress: &mut Progress, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        let len = chunk.len() as u64;
        if len > progress.remaining() {
            return Err(PackError::StreamOverrun {
                declared: progress.declared,
                received: progress.written + len,
            });
        }

        self.emit(chunk).await?;
        progress.written += len;
        self.cursor = Cursor::Streaming(*progress);
        trace!(
            "streamed {len} bytes ({}/{})",
            progress.written,
            progress.declared
        );
        Ok(())
    }

    /// Check the byte count, pad to the block boundary and go idle.
    async fn end_entry(&mut self, path: &str, progress: Progress) -> Result<()> {
        if progress.written < progress.declared {
            return Err(PackError::StreamUnderrun {
                declared: progress.declared,
                written: progress.written,
            });
        }

        let padding = progress.padding() as usize;
        if padding > 0 {
            self.emit(&ZERO_BLOCK[..padding]).await?;
        }

        self.cursor = Cursor::Idle;
        self.entries += 1;
        debug!("added {path:?} ({} bytes, {padding} padding)", progress.written);
        Ok(())
    }

    async fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write_all(bytes).await.map_err(PackError::Sink)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Poison the packer if `result` is a fatal error.
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if err.is_fatal() {
                debug!("packer failed: {err}");
                self.cursor = Cursor::Failed;
            }
        }
        result
    }
}

impl<W> TarPacker<W> {
    /// Total number of bytes accepted by the sink so far.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Number of entries completely written.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Whether [`TarPacker::finish`] has completed successfully.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor == Cursor::Finished
    }

    /// Whether a fatal error or an interrupted operation left the archive
    /// incomplete.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(
            self.cursor,
            Cursor::Failed | Cursor::Closing | Cursor::Streaming(_)
        )
    }

    /// Get the packer options.
    #[must_use]
    pub fn options(&self) -> &PackerOptions {
        &self.options
    }

    /// Get a reference to the sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Consume the packer and return the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}
