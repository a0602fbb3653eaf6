//! Drives one hub session's socket: reads lines, feeds them through
//! [`hub::HubSession::dispatch_line`], and performs the
//! [`hub::HubEffect`]s it queues in response (§4.2, §5's "driven from a
//! single task" rule).

use crate::net;
use crate::state::App;
use core::Clock;
use hub::{HubConfig, HubEffect};
use std::io;
use std::sync::Arc;
use transport::LineSocket;

/// Connects `hub_config.hub_url`, begins the session, and pumps its
/// socket until the peer closes it, the session disconnects, or an I/O
/// error occurs. Returns once the hub is no longer being driven; the
/// caller (see [`crate::startup::join_configured_hubs`]) is responsible
/// for reconnecting or removing the registry entry.
///
/// # Errors
///
/// Returns an I/O error from the socket; a hub-level protocol failure is
/// absorbed by the session itself and surfaces as a `Disconnect` effect.
pub async fn run<C: Clock>(app: Arc<App<C>>, hub_config: HubConfig) -> io::Result<()> {
    let hub_url = hub_config.hub_url.clone();
    let (scheme, stream) = net::dial(&hub_url).await?;
    let limiter = net::rate_limiter(app.config.download_rate_limit_bps);
    let mut socket = LineSocket::new(stream, scheme.line_terminator(), limiter);

    app.hubs.with_hub(&hub_url, |session| session.connect());
    if execute_pending(&app, &hub_url, &mut socket).await? {
        return Ok(());
    }

    loop {
        let line = match socket.read_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                logging::info_log(|f| f.hub > 0, || format!("hub socket for {hub_url} closed: {error}"));
                break;
            }
        };
        let line = String::from_utf8_lossy(&line).into_owned();
        app.hubs.with_hub(&hub_url, |session| session.dispatch_line(&line));
        if execute_pending(&app, &hub_url, &mut socket).await? {
            break;
        }
    }
    Ok(())
}

/// Drains and performs every effect queued by the last `connect`/
/// `dispatch_line` call. Returns `true` once a [`HubEffect::Disconnect`]
/// has been performed, meaning the caller's read loop should stop.
async fn execute_pending<C: Clock, S>(app: &Arc<App<C>>, hub_url: &str, socket: &mut LineSocket<S>) -> io::Result<bool>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let effects = app.hubs.with_hub(hub_url, |session| session.take_outbox()).unwrap_or_default();
    for effect in effects {
        match effect {
            HubEffect::Send(line) => {
                socket.write_line(line.as_bytes()).await?;
            }
            HubEffect::ConnectOut { peer_sid, protocol, port, token } | HubEffect::NatTraversal { peer_sid, protocol, port, token } => {
                spawn_dial(app, hub_url, peer_sid, &protocol, port, &token);
            }
            HubEffect::OpenHbriProbe { address, port, token } => {
                logging::info_log(|f| f.conn > 0, || format!("HBRI probe for {hub_url} to {address}:{port} (token {token}) requested; UDP probing is not carried by this driver"));
            }
            HubEffect::Redirect { target } => {
                logging::info_log(|f| f.hub > 0, || format!("hub {hub_url} redirected to {target}"));
            }
            HubEffect::Disconnect => {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn spawn_dial<C: Clock>(app: &Arc<App<C>>, hub_url: &str, peer_sid: identity::Sid, protocol: &str, port: u16, token: &str) {
    let Some(address) = crate::connect::resolve_peer_address(app, hub_url, peer_sid, protocol, port) else {
        logging::info_log(|f| f.conn > 0, || format!("no dial address resolved for SID {} on {hub_url}", peer_sid.as_str()));
        return;
    };
    let Some(expected_cid) = app.hubs.with_hub(hub_url, |session| session.find_by_sid(peer_sid).map(|user| user.identity().user().cid())).flatten() else {
        logging::info_log(|f| f.conn > 0, || format!("no CID on roster for SID {} on {hub_url}, dial abandoned", peer_sid.as_str()));
        return;
    };
    let app = Arc::clone(app);
    let token = token.to_string();
    tokio::spawn(async move {
        match crate::connect::dial_out(&app, &address, expected_cid, &token).await {
            Ok(connection) => {
                logging::debug_log(|f| f.token > 0, || format!("C-C dial to {}:{} resolved role {:?}", address.host, address.port, connection.role));
            }
            Err(error) => {
                logging::info_log(|f| f.conn > 0, || format!("C-C dial to {}:{} failed: {error}", address.host, address.port));
            }
        }
    });
}
