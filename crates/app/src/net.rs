//! Scheme detection and the boxed duplex stream hub/C-C sockets are
//! driven over, so [`crate::hub_task`] and [`crate::connect`] can treat a
//! plain or TLS-wrapped connection uniformly (§4.2.4).

use std::io;
use std::num::NonZeroU64;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use transport::RateLimiter;

/// Any duplex byte stream a [`transport::LineSocket`] can frame lines
/// over, boxed so a hub socket's concrete type (plain `TcpStream` or a
/// `rustls` `TlsStream`) doesn't leak into every function signature that
/// drives one.
pub trait AsyncDuplex: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncDuplex for T {}

/// A boxed hub or C-C socket, see [`AsyncDuplex`].
pub type BoxedStream = Box<dyn AsyncDuplex>;

/// Which wire dialect and transport security a hub URL scheme selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// `adc://`: ADC over plain TCP.
    Adc,
    /// `adcs://`: ADC over TLS.
    AdcTls,
    /// `dchub://`/`nmdc://`: NMDC over plain TCP.
    Nmdc,
    /// `nmdcs://`: NMDC over TLS.
    NmdcTls,
}

impl Scheme {
    /// Detects the scheme from a hub URL's prefix, or `None` if
    /// unrecognised.
    #[must_use]
    pub fn detect(hub_url: &str) -> Option<Self> {
        if let Some(rest) = hub_url.strip_prefix("adcs://") {
            let _ = rest;
            Some(Self::AdcTls)
        } else if hub_url.starts_with("adc://") {
            Some(Self::Adc)
        } else if hub_url.starts_with("nmdcs://") {
            Some(Self::NmdcTls)
        } else if hub_url.starts_with("dchub://") || hub_url.starts_with("nmdc://") {
            Some(Self::Nmdc)
        } else {
            None
        }
    }

    /// The ADC line terminator (`\n`) or NMDC's (`|`) for this dialect.
    #[must_use]
    pub const fn line_terminator(self) -> u8 {
        match self {
            Self::Adc | Self::AdcTls => b'\n',
            Self::Nmdc | Self::NmdcTls => b'|',
        }
    }

    /// Whether this scheme dials over TLS.
    #[must_use]
    pub const fn is_tls(self) -> bool {
        matches!(self, Self::AdcTls | Self::NmdcTls)
    }
}

/// Splits a hub URL into its bare `host:port` authority, stripping the
/// scheme prefix.
#[must_use]
pub fn authority(hub_url: &str) -> Option<&str> {
    hub_url.split_once("://").map(|(_, rest)| rest)
}

/// Opens a TCP connection to `hub_url`'s authority, wrapping it in TLS
/// when the scheme calls for it (§4.2.4). `install_default_crypto_provider`
/// must already have run once process-wide before the first TLS dial.
///
/// # Errors
///
/// Returns an I/O error if the scheme is unrecognised, the authority is
/// malformed, the TCP connect fails, or the TLS handshake fails.
pub async fn dial(hub_url: &str) -> io::Result<(Scheme, BoxedStream)> {
    let scheme = Scheme::detect(hub_url).ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("unrecognised hub scheme: {hub_url}")))?;
    let authority = authority(hub_url).ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("malformed hub URL: {hub_url}")))?;
    let tcp = TcpStream::connect(authority).await?;
    tcp.set_nodelay(true).ok();

    if scheme.is_tls() {
        let host = authority.rsplit_once(':').map_or(authority, |(host, _)| host);
        let server_name = rustls::pki_types::ServerName::try_from(host.to_string()).map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
        let stream = transport::tls::connector().connect(server_name, tcp).await?;
        Ok((scheme, Box::new(stream)))
    } else {
        Ok((scheme, Box::new(tcp)))
    }
}

/// Builds a [`RateLimiter`] for `bps` bytes/sec, treating a configured
/// `0` as unlimited rather than a zero-byte-per-second deadlock.
#[must_use]
pub fn rate_limiter(bps: u64) -> RateLimiter {
    RateLimiter::new(NonZeroU64::new(bps).unwrap_or(NonZeroU64::MAX))
}
