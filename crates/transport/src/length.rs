//! Exact-byte-count framing for file-segment transfer sockets (§4.1, §4.9).
//!
//! Once a C-C connection has negotiated a segment via `ADCGET`/`ADCSND`
//! (or NMDC's `$ADCGET`/`$ADCSND`), the remaining bytes on the wire are
//! raw file content of a known length - there is no line terminator to
//! scan for, just a byte count to read or write.

use crate::limiter::RateLimiter;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A rate-limited, exact-byte-count socket wrapper for one file segment.
pub struct LengthSocket<S> {
    stream: S,
    limiter: RateLimiter,
}

impl<S> LengthSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps `stream` for length-framed transfer, rate-limited by
    /// `limiter`.
    #[must_use]
    pub fn new(stream: S, limiter: RateLimiter) -> Self {
        Self { stream, limiter }
    }

    /// Reads exactly `len` bytes, in rate-limiter-sized chunks, invoking
    /// `on_chunk` with each chunk as it arrives (e.g. to feed a TTH
    /// leaf hasher or advance a progress counter) before the next chunk
    /// is requested.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::UnexpectedEof`] if the stream closes
    /// before `len` bytes have been read.
    pub async fn read_exact_with(
        &mut self,
        len: u64,
        mut on_chunk: impl FnMut(&[u8]),
    ) -> io::Result<()> {
        let mut remaining = len;
        let mut buf = vec![0u8; 64 * 1024];
        while remaining > 0 {
            let want = self.limiter.recommended_read_size(buf.len()).await.max(1) as u64;
            let want = want.min(remaining).min(buf.len() as u64) as usize;
            self.stream.read_exact(&mut buf[..want]).await?;
            self.limiter.register(want).await;
            on_chunk(&buf[..want]);
            remaining -= want as u64;
        }
        Ok(())
    }

    /// Writes all of `data`, rate-limited according to the configured
    /// [`RateLimiter`].
    pub async fn write_all(&mut self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            let chunk_len = self.limiter.recommended_read_size(data.len()).await.max(1);
            let chunk_len = chunk_len.min(data.len());
            let (chunk, rest) = data.split_at(chunk_len);
            self.stream.write_all(chunk).await?;
            self.limiter.register(chunk.len()).await;
            data = rest;
        }
        self.stream.flush().await
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Unwraps the socket back into its underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}
