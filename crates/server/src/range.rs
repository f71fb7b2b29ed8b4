//! Positioned, range-limited reads over an upload's backing bytes.

use bytes::Bytes;
use scatter_node::store::ByteStream;
use std::io;
use std::sync::Arc;

/// Frame size for range reads (64 KiB).
const RANGE_FRAME_SIZE: u64 = 64 * 1024;

/// The backing bytes of one multipart upload.
///
/// Small payloads stay in memory; payloads over the in-memory budget are
/// spilled to an unlinked temporary file by the multipart reader. Both
/// variants support positioned reads, so the concurrent chunk uploaders
/// share no cursor.
#[derive(Clone)]
pub struct UploadSource {
    inner: Source,
    len: u64,
}

#[derive(Clone)]
enum Source {
    Memory(Bytes),
    Spilled(Arc<std::fs::File>),
}

impl UploadSource {
    /// An in-memory source.
    pub fn from_bytes(data: Bytes) -> Self {
        let len = data.len() as u64;
        Self {
            inner: Source::Memory(data),
            len,
        }
    }

    /// A source spilled to a temporary file of `len` bytes.
    pub fn from_spilled(file: std::fs::File, len: u64) -> Self {
        Self {
            inner: Source::Spilled(Arc::new(file)),
            len,
        }
    }

    /// Total payload length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A reader over `[offset, offset + len)` of this source.
    pub fn range_reader(&self, offset: u64, len: u64) -> RangeReader {
        debug_assert!(offset + len <= self.len);
        RangeReader {
            source: self.inner.clone(),
            offset,
            remaining: len,
        }
    }
}

impl Source {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        match self {
            Source::Memory(bytes) => {
                let len = bytes.len() as u64;
                if offset >= len {
                    return Ok(0);
                }
                let start = offset as usize;
                let end = len.min(offset + buf.len() as u64) as usize;
                buf[..end - start].copy_from_slice(&bytes[start..end]);
                Ok(end - start)
            }
            #[cfg(unix)]
            Source::Spilled(file) => {
                use std::os::unix::fs::FileExt;
                file.read_at(buf, offset)
            }
            #[cfg(windows)]
            Source::Spilled(file) => {
                use std::os::windows::fs::FileExt;
                file.seek_read(buf, offset)
            }
        }
    }

    fn is_memory(&self) -> bool {
        matches!(self, Source::Memory(_))
    }
}

/// A reader that yields exactly `remaining` bytes of its source starting at
/// `offset`, then reports end-of-stream.
///
/// Not safe for concurrent use; each concurrent chunk uploader holds its own
/// instance pointing at the same underlying source.
pub struct RangeReader {
    source: Source,
    offset: u64,
    remaining: u64,
}

impl RangeReader {
    /// Read up to `min(buf.len(), remaining)` bytes from the current offset,
    /// advancing the reader. Returns 0 once the range is exhausted.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let max = (buf.len() as u64).min(self.remaining) as usize;
        let n = self.source.read_at(&mut buf[..max], self.offset)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "upload source truncated",
            ));
        }
        self.offset += n as u64;
        self.remaining -= n as u64;
        Ok(n)
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    fn next_frame(&mut self) -> io::Result<Option<Bytes>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let mut buf = vec![0u8; self.remaining.min(RANGE_FRAME_SIZE) as usize];
        let mut filled = 0;
        while filled < buf.len() {
            filled += self.read(&mut buf[filled..])?;
        }
        Ok(Some(buf.into()))
    }

    /// Convert into a byte stream suitable for an HTTP request body.
    ///
    /// In-memory sources are iterated directly; spilled sources read on the
    /// blocking pool so disk reads never block the runtime.
    pub fn into_stream(self) -> ByteStream {
        if self.source.is_memory() {
            let mut reader = self;
            Box::pin(futures::stream::iter(std::iter::from_fn(move || {
                reader.next_frame().transpose()
            })))
        } else {
            Box::pin(futures::stream::try_unfold(self, |mut reader| async move {
                let (frame, reader) = tokio::task::spawn_blocking(move || {
                    let frame = reader.next_frame();
                    (frame, reader)
                })
                .await
                .map_err(io::Error::other)?;
                Ok(frame?.map(|bytes| (bytes, reader)))
            }))
        }
    }
}
