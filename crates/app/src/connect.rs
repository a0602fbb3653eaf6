//! Establishing C-C connections: dialing out in response to a
//! [`hub::HubEffect::ConnectOut`]/[`hub::HubEffect::NatTraversal`], and
//! accepting inbound peers on the listen port (§4.4).
//!
//! Both paths converge on [`connmgr::listener::negotiate`], which already
//! drives the ADC handshake to a resolved [`connmgr::Role`]; what's left
//! here is address resolution for the outbound side and flood admission
//! for the inbound side, plus sending our own `CSUP`/`CINF` before an
//! outbound dial reads the peer's reply (`negotiate` only ever reads -
//! mirroring the symmetry `connmgr::handshake`'s own doc comment
//! describes, the dialing side still has to write first).

use crate::net::{self, BoxedStream};
use crate::state::App;
use connmgr::{negotiate, FloodVerdict, NegotiatedConnection, NegotiationError};
use core::Clock;
use identity::Cid;
use protocol::adc::{Command, CommandType, FourCc};
use std::io;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

/// A peer address resolved from a hub's roster or, for NMDC, smuggled in
/// a `ConnectOut`/`NatTraversal` effect's `protocol` field (§4.2.3,
/// §4.2.4).
#[derive(Clone, Debug)]
pub struct PeerAddress {
    /// Host or literal IP to dial.
    pub host: String,
    /// Port to dial.
    pub port: u16,
}

/// Resolves the dial address for a `ConnectOut`/`NatTraversal` effect
/// raised on `hub_url` for `peer_sid`, carrying `port` and ADC's
/// `protocol` token.
///
/// NMDC sessions have no SID-keyed roster (`HubSession::find_by_sid`
/// always returns `None` there) and instead smuggle the peer's address
/// into `protocol` as `"NMDC/<ip>"` (see `hub::nmdc`'s `handle_connect_to_me`);
/// ADC sessions resolve it from the roster's `I4`/`I6` INF fields.
#[must_use]
pub fn resolve_peer_address<C: Clock>(app: &App<C>, hub_url: &str, peer_sid: identity::Sid, protocol: &str, port: u16) -> Option<PeerAddress> {
    if let Some(ip) = protocol.strip_prefix("NMDC/") {
        return Some(PeerAddress { host: ip.to_string(), port });
    }
    app.hubs.with_hub(hub_url, |session| {
        let user = session.find_by_sid(peer_sid)?;
        let identity = user.identity();
        let host = identity.field("I4").or_else(|| identity.field("I6"))?;
        Some(PeerAddress { host: host.to_string(), port })
    })?
}

/// Dials `address` for a C-C connection expected to carry `token`, for
/// peer `expected_cid`, sends our own `CSUP`+`CINF`, then negotiates the
/// peer's reply. `token` must already be registered with
/// [`connmgr::TokenStore`] - the hub session registers it itself before
/// queuing the `ConnectOut`/`NatTraversal` effect this dial answers.
///
/// # Errors
///
/// Returns an I/O or handshake error; see [`NegotiationError`].
pub async fn dial_out<C: Clock>(app: &App<C>, address: &PeerAddress, expected_cid: Cid, token: &str) -> Result<NegotiatedConnection<BoxedStream>, NegotiationError> {
    let tcp = TcpStream::connect((address.host.as_str(), address.port)).await?;
    tcp.set_nodelay(true).ok();
    let mut stream: BoxedStream = Box::new(tcp);
    send_csup_cinf(&mut stream, app, token).await?;
    let limiter = net::rate_limiter(app.config.download_rate_limit_bps.max(app.config.upload_rate_limit_bps));
    negotiate(stream, Some(expected_cid), limiter, &app.tokens).await
}

async fn send_csup_cinf<C: Clock>(stream: &mut BoxedStream, app: &App<C>, token: &str) -> io::Result<()> {
    let mut sup = Command::new(CommandType::Client, FourCc::SUP);
    for feature in &app.config.features {
        sup = sup.with_param(format!("AD{feature}"));
    }
    let inf = Command::new(CommandType::Client, FourCc::INF).with_named_param("ID", &app.config.my_cid.to_base32()).with_named_param("TO", token);
    stream.write_all(sup.to_wire_string().as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.write_all(inf.to_wire_string().as_bytes()).await?;
    stream.write_all(b"\n").await
}


/// Accepts inbound C-C connections on `app.config.listen_port` until the
/// listener errors, running flood admission then [`negotiate`] on each.
///
/// # Errors
///
/// Returns an I/O error if the listener itself can't be bound.
pub async fn accept_loop<C: Clock>(app: Arc<App<C>>) -> io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", app.config.listen_port)).await?;
    loop {
        let (tcp, peer_addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(error) => {
                logging::info_log(|f| f.conn > 0, || format!("C-C accept failed: {error}"));
                continue;
            }
        };
        match app.flood.record(peer_addr.ip()) {
            FloodVerdict::Severe => {
                logging::info_log(|f| f.conn > 0, || format!("rejecting inbound C-C from {peer_addr}: flood threshold exceeded"));
                continue;
            }
            FloodVerdict::Minor => {
                logging::info_log(|f| f.conn > 0, || format!("inbound C-C from {peer_addr} near the flood threshold"));
            }
            FloodVerdict::Admit => {}
        }
        tcp.set_nodelay(true).ok();
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            let limiter = net::rate_limiter(app.config.upload_rate_limit_bps);
            match negotiate(tcp, None, limiter, &app.tokens).await {
                Ok(connection) => {
                    logging::debug_log(|f| f.token > 0, || format!("inbound C-C from {peer_addr} resolved role {:?}", connection.role));
                }
                Err(error) => {
                    logging::info_log(|f| f.conn > 0, || format!("inbound C-C handshake from {peer_addr} failed: {error}"));
                }
            }
        });
    }
}
