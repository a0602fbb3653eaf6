//! The process-wide UDP search-result socket (§4.1, §4.7).
//!
//! There is exactly one UDP socket per process: search requests that ask
//! for UDP replies advertise this socket's `ip:port`, and `search`
//! ingests every datagram that arrives on it, SUDP-decrypting where the
//! sender's CID has a known key (§6.5).

use std::io;
use std::net::SocketAddr;
use tokio::net::ToSocketAddrs;

/// The maximum UDP datagram this socket will accept; larger datagrams
/// are truncated by the kernel before recvfrom returns, so results past
/// this size are simply absent rather than corrupt.
pub const MAX_DATAGRAM: usize = 64 * 1024;

/// A thin wrapper over [`tokio::net::UdpSocket`] for search-result
/// traffic. Unlike the line/length sockets this is not rate-limited -
/// search result volume is self-limiting (one reply per search per
/// peer) and the spec does not ask for UDP pacing.
pub struct UdpSocket {
    inner: tokio::net::UdpSocket,
}

impl UdpSocket {
    /// Binds a new UDP socket at `addr`.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from binding the underlying socket.
    pub async fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let inner = tokio::net::UdpSocket::bind(addr).await?;
        Ok(Self { inner })
    }

    /// Returns the socket's locally bound address, e.g. to advertise in
    /// outgoing searches.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Receives one datagram, returning its bytes and the sender's
    /// address.
    pub async fn recv(&self) -> io::Result<(Vec<u8>, SocketAddr)> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (n, from) = self.inner.recv_from(&mut buf).await?;
        buf.truncate(n);
        Ok((buf, from))
    }

    /// Sends `data` to `addr` as a single datagram.
    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> io::Result<()> {
        self.inner.send_to(data, addr).await?;
        Ok(())
    }
}
