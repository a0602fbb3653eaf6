//! A buffered-prefix sniffer that reads just enough of a new connection to
//! classify it, then hands the buffered bytes back so the chosen codec can
//! replay them.

#![cfg(feature = "async")]

use super::detect::{detect_prologue, Detection};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};

/// The longest prologue this sniffer will buffer before giving up and
/// reporting [`Detection::Invalid`]. Four bytes is all ADC detection ever
/// needs; this bounds a slow-loris peer that never sends a `$` or a
/// complete ADC header from growing the buffer unboundedly.
const MAX_PROLOGUE_LEN: usize = 4;

/// Wraps an [`AsyncRead`] socket and classifies its first bytes as ADC or
/// NMDC without consuming them from the caller's point of view - bytes read
/// during detection are retained in [`PrologueSniffer::take_buffered`] so
/// they can be fed back into whichever line reader takes over.
pub struct PrologueSniffer<R> {
    inner: R,
    buffered: Vec<u8>,
}

impl<R: AsyncRead + Unpin> PrologueSniffer<R> {
    /// Wraps `inner` for prologue detection.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffered: Vec::with_capacity(MAX_PROLOGUE_LEN),
        }
    }

    /// Reads one byte at a time until [`detect_prologue`] resolves to
    /// something other than [`Detection::Incomplete`], or the prologue
    /// budget is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from the underlying socket.
    pub async fn detect(&mut self) -> std::io::Result<Detection> {
        loop {
            let detection = detect_prologue(&self.buffered);
            if detection != Detection::Incomplete {
                return Ok(detection);
            }
            if self.buffered.len() >= MAX_PROLOGUE_LEN {
                return Ok(Detection::Invalid);
            }
            let mut byte = [0u8; 1];
            let n = self.inner.read(&mut byte).await?;
            if n == 0 {
                return Ok(Detection::Invalid);
            }
            self.buffered.push(byte[0]);
        }
    }

    /// Consumes the sniffer, returning the bytes it buffered during
    /// detection and the underlying socket so a caller can splice them
    /// back in front of further reads.
    pub fn take_buffered(self) -> (Vec<u8>, R) {
        (self.buffered, self.inner)
    }
}

/// A full-duplex stream that replays a buffered prefix of already-read
/// bytes in front of further reads from `inner`, while writes pass
/// through untouched.
///
/// Built from [`PrologueSniffer::take_buffered`] so a line codec can be
/// handed a single stream that reads as if detection never happened.
pub struct Prefixed<R> {
    prefix: Vec<u8>,
    pos: usize,
    inner: R,
}

impl<R> Prefixed<R> {
    /// Wraps `inner` so reads see `prefix` first, then `inner`'s own bytes.
    #[must_use]
    pub fn new(prefix: Vec<u8>, inner: R) -> Self {
        Self { prefix, pos: 0, inner }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for Prefixed<R> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        if self.pos < self.prefix.len() {
            let remaining = &self.prefix[self.pos..];
            let n = remaining.len().min(buf.remaining());
            buf.put_slice(&remaining[..n]);
            self.pos += n;
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<R: AsyncWrite + Unpin> AsyncWrite for Prefixed<R> {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
