//! Accepting and negotiating freshly opened C-C sockets (§4.4).
//!
//! A new connection arrives either inbound (a peer answering our `RCM`/
//! `CTM`) or as the local end of an outbound connect the download/upload
//! engines asked for. Either way it passes through the same sequence:
//! flood admission, protocol sniffing, and the ADC handshake state
//! machine in [`crate::handshake`].

use crate::handshake::{Handshake, HandshakeError, Role};
use crate::token::TokenStore;
use identity::cid::Cid;
use protocol::adc::{Command, CommandType, FourCc};
use protocol::negotiation::{Detection, Prefixed, PrologueSniffer};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use transport::{LineSocket, RateLimiter};

/// Everything that can go wrong negotiating a new C-C connection.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// The socket failed before a protocol could be determined.
    #[error("I/O error during negotiation: {0}")]
    Io(#[from] io::Error),
    /// Neither ADC nor NMDC framing was recognised in the prologue.
    #[error("unrecognised protocol prologue")]
    UnrecognisedProtocol,
    /// The connection spoke NMDC, which this manager doesn't handshake
    /// directly; the caller should hand the socket to the NMDC C-C codec.
    #[error("connection uses NMDC framing, not handled by the ADC handshake")]
    IsNmdc,
    /// The first line didn't parse as a well-formed ADC command.
    #[error("malformed ADC command: {0}")]
    MalformedCommand(#[from] protocol::adc::ParseError),
    /// The first command wasn't `CSUP`, or the second wasn't `CINF`.
    #[error("expected {expected}, got {got}")]
    UnexpectedCommand {
        /// What was expected at this point in the handshake.
        expected: &'static str,
        /// The command code actually received.
        got: String,
    },
    /// `CINF` lacked a required `ID` parameter.
    #[error("CINF is missing its ID parameter")]
    MissingId,
    /// `CINF`'s `ID` wasn't a valid base32 CID.
    #[error("CINF ID is not a valid CID")]
    InvalidId,
    /// `CINF` lacked a `TO` token parameter.
    #[error("CINF is missing its TO parameter")]
    MissingToken,
    /// The handshake state machine rejected the exchange.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
    /// The socket closed before the handshake completed.
    #[error("connection closed before the handshake completed")]
    ClosedEarly,
}

/// A C-C connection whose ADC handshake has resolved to a role, ready to
/// hand off to the download or upload engine.
pub struct NegotiatedConnection<S> {
    /// The peer's verified CID.
    pub peer_cid: Cid,
    /// Which side of the transfer this connection will carry.
    pub role: Role,
    /// The line-framed socket, with the handshake bytes already consumed.
    pub socket: LineSocket<S>,
}

/// Runs the ADC handshake (`CSUP` then `CINF`) over a freshly accepted or
/// connected socket, resolving its role from `tokens`.
///
/// `expected_cid` should be set for outbound connections (we know who we
/// dialed) and left `None` for inbound accepts.
///
/// # Errors
///
/// See [`NegotiationError`].
pub async fn negotiate<S>(
    stream: S,
    expected_cid: Option<Cid>,
    limiter: RateLimiter,
    tokens: &TokenStore,
) -> Result<NegotiatedConnection<S>, NegotiationError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut sniffer = PrologueSniffer::new(stream);
    let detection = sniffer.detect().await?;
    let (buffered, stream) = sniffer.take_buffered();
    match detection {
        Detection::Adc => {}
        Detection::Nmdc => return Err(NegotiationError::IsNmdc),
        Detection::Incomplete | Detection::Invalid => return Err(NegotiationError::UnrecognisedProtocol),
    }

    let stream = Prefixed::new(buffered, stream);
    let mut socket = LineSocket::new(stream, b'\n', limiter);

    let sup_line = socket.read_line().await?.ok_or(NegotiationError::ClosedEarly)?;
    let sup = Command::parse(&String::from_utf8_lossy(&sup_line))?;
    if sup.kind() != CommandType::Client || sup.code() != FourCc::SUP {
        return Err(NegotiationError::UnexpectedCommand { expected: "CSUP", got: sup.code().to_string() });
    }
    let mut handshake = match expected_cid {
        Some(cid) => Handshake::outbound(cid, None),
        None => Handshake::inbound(),
    };
    handshake.on_csup(sup.named_params("AD"))?;

    let inf_line = socket.read_line().await?.ok_or(NegotiationError::ClosedEarly)?;
    let inf = Command::parse(&String::from_utf8_lossy(&inf_line))?;
    if inf.kind() != CommandType::Client || inf.code() != FourCc::INF {
        return Err(NegotiationError::UnexpectedCommand { expected: "CINF", got: inf.code().to_string() });
    }
    let id_param = inf.named_param("ID").ok_or(NegotiationError::MissingId)?;
    let peer_cid = Cid::from_base32(&id_param).map_err(|_| NegotiationError::InvalidId)?;
    let to_token = inf.named_param("TO").ok_or(NegotiationError::MissingToken)?;
    let pm_requested = inf.has_flag("PM");

    let role = handshake.on_cinf(peer_cid, &to_token, pm_requested, None, tokens)?;
    logging::debug_log(|f| f.token > 0, || format!("C-C handshake resolved role {role:?} for token {to_token}"));

    Ok(NegotiatedConnection { peer_cid, role, socket })
}
