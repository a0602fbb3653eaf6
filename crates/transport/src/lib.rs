#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `transport` is the L1 layer (§2, §4.1): buffered TCP (optionally TLS)
//! and UDP sockets, line-framed or length-framed, each with its own
//! per-connection [`bandwidth::BandwidthLimiter`].
//!
//! # Design
//!
//! Everything here is a thin wrapper over `tokio`'s async I/O traits
//! rather than raw OS sockets or dedicated reader threads - hub sessions,
//! C-C connections and the UDP search listener all run as `tokio` tasks
//! (see the workspace's async-runtime note), so L1 just needs to plug a
//! rate limiter and a framing convention into `AsyncRead`/`AsyncWrite`.
//!
//! [`limiter::RateLimiter`] wraps [`bandwidth::BandwidthLimiter`], whose
//! `register` call sleeps synchronously to enforce pacing; that sleep is
//! pushed onto the blocking thread pool with `tokio::task::spawn_blocking`
//! so it never stalls the runtime's async worker threads.
//!
//! [`line::LineSocket`] frames a byte stream into NMDC `|`-terminated or
//! ADC `\n`-terminated lines (the caller picks the terminator once
//! [`negotiation::detect_prologue`][protocol::negotiation::detect_prologue]
//! has run) for the hub and C-C command channels. [`length::LengthSocket`]
//! instead reads or writes an exact byte count for file-segment transfer,
//! where framing is implicit in the negotiated length.
//!
//! [`udp::UdpSocket`] wraps the single process-wide search-result
//! listener socket. [`tls`] builds the `rustls` acceptor/connector used
//! for ADCS/NMDCS (§4.2.4) when the `tls` feature is enabled (the
//! default).
//!
//! # Invariants
//!
//! - A line produced by [`line::LineSocket::read_line`] never includes the
//!   terminator byte; writes always append exactly one.
//! - [`length::LengthSocket`] never reads or writes more than the byte
//!   count it was constructed with, even if the caller's buffer is
//!   larger.
//! - Every byte written through a rate-limited socket passes through
//!   [`limiter::RateLimiter::register`] exactly once, so the configured
//!   `BandwidthLimiter` sees the true write volume.
//!
//! # Examples
//!
//! ```no_run
//! # async fn run() -> std::io::Result<()> {
//! use transport::limiter::RateLimiter;
//! use transport::line::LineSocket;
//! use tokio::net::TcpStream;
//! use std::num::NonZeroU64;
//!
//! let stream = TcpStream::connect("127.0.0.1:411").await?;
//! let limiter = RateLimiter::new(NonZeroU64::new(1 << 20).unwrap());
//! let mut socket = LineSocket::new(stream, b'|', limiter);
//! socket.write_line(b"$MyNick Foo|").await?;
//! let line = socket.read_line().await?;
//! # let _ = line;
//! # Ok(())
//! # }
//! ```
//!
//! # See also
//!
//! - [`protocol`](../protocol/index.html), which turns framed lines into
//!   parsed `Command`/`Line` values.
//! - [`bandwidth`](../bandwidth/index.html), the leaky-bucket pacing rule
//!   this crate's limiter wraps.

/// Exact-byte-count framing for file-segment transfer sockets.
pub mod length;
/// Line framing (`|`- or `\n`-terminated) for hub and C-C command sockets.
pub mod line;
/// Async-friendly wrapper around [`bandwidth::BandwidthLimiter`].
pub mod limiter;
/// TLS acceptor/connector setup for ADCS/NMDCS (feature `tls`).
#[cfg(feature = "tls")]
pub mod tls;
/// The process-wide UDP search-result socket.
pub mod udp;

pub use length::LengthSocket;
pub use line::LineSocket;
pub use limiter::RateLimiter;
pub use udp::UdpSocket;
