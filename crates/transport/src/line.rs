//! Line-framed sockets for hub and C-C command channels (§4.1, §4.2).
//!
//! NMDC lines are terminated with `|`; ADC lines are terminated with
//! `\n`. Either way framing is "read until terminator, strip it", so one
//! generic type serves both once the caller has picked a terminator byte
//! (typically from [`protocol::negotiation::detect_prologue`]).

use crate::limiter::RateLimiter;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// A buffered, rate-limited, line-framed socket over any async stream.
pub struct LineSocket<S> {
    reader: BufReader<S>,
    terminator: u8,
    limiter: RateLimiter,
    read_buf: Vec<u8>,
}

impl<S> LineSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps `stream` for line framing on `terminator`, rate-limited by
    /// `limiter`.
    #[must_use]
    pub fn new(stream: S, terminator: u8, limiter: RateLimiter) -> Self {
        Self {
            reader: BufReader::new(stream),
            terminator,
            limiter,
            read_buf: Vec::with_capacity(256),
        }
    }

    /// Reads one terminator-delimited line, with the terminator stripped.
    ///
    /// Returns `Ok(None)` if the stream reached EOF with no pending
    /// partial line; an EOF mid-line is reported as
    /// [`io::ErrorKind::UnexpectedEof`].
    pub async fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.read_buf.clear();
        let mut byte = [0u8; 1];
        let mut read_any = false;
        loop {
            let n = self.reader.read(&mut byte).await?;
            if n == 0 {
                if read_any {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed mid-line",
                    ));
                }
                return Ok(None);
            }
            read_any = true;
            if byte[0] == self.terminator {
                return Ok(Some(std::mem::take(&mut self.read_buf)));
            }
            self.read_buf.push(byte[0]);
        }
    }

    /// Writes `line` followed by the terminator byte, rate-limited
    /// according to the configured [`RateLimiter`].
    pub async fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        let mut framed = Vec::with_capacity(line.len() + 1);
        framed.extend_from_slice(line);
        framed.push(self.terminator);
        self.write_throttled(&framed).await
    }

    async fn write_throttled(&mut self, mut bytes: &[u8]) -> io::Result<()> {
        while !bytes.is_empty() {
            let chunk_len = self.limiter.recommended_read_size(bytes.len()).await.max(1);
            let chunk_len = chunk_len.min(bytes.len());
            let (chunk, rest) = bytes.split_at(chunk_len);
            self.reader.get_mut().write_all(chunk).await?;
            self.limiter.register(chunk.len()).await;
            bytes = rest;
        }
        self.reader.get_mut().flush().await
    }

    /// Returns a reference to the underlying stream, e.g. to read its
    /// peer address.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Unwraps the socket back into its underlying stream, discarding any
    /// buffered-but-unread bytes.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU64;
    use tokio::io::duplex;

    fn limiter() -> RateLimiter {
        RateLimiter::new(NonZeroU64::new(64 * 1024 * 1024).unwrap())
    }

    #[tokio::test]
    async fn reads_and_strips_nmdc_terminated_lines() {
        let (client, mut server) = duplex(4096);
        server.write_all(b"$MyNick Foo|$Lock EXTENDEDPROTOCOL|").await.unwrap();
        drop(server);

        let mut socket = LineSocket::new(client, b'|', limiter());
        let first = socket.read_line().await.unwrap().unwrap();
        assert_eq!(first, b"$MyNick Foo");
        let second = socket.read_line().await.unwrap().unwrap();
        assert_eq!(second, b"$Lock EXTENDEDPROTOCOL");
        assert_eq!(socket.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn writes_append_exactly_one_terminator() {
        let (client, mut server) = duplex(4096);
        let mut socket = LineSocket::new(client, b'\n', limiter());
        socket.write_line(b"BINF AAAA").await.unwrap();

        let mut buf = vec![0u8; 32];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"BINF AAAA\n");
    }

    #[tokio::test]
    async fn eof_mid_line_is_unexpected_eof() {
        let (client, mut server) = duplex(4096);
        server.write_all(b"partial-no-terminator").await.unwrap();
        drop(server);

        let mut socket = LineSocket::new(client, b'|', limiter());
        let error = socket.read_line().await.unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
    }
}
