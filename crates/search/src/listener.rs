//! The process-wide UDP search-result listener loop (§4.7, §6.5).

use crate::manager::{IncomingSearchEvent, SearchManager};
use core::clock::Clock;
use std::sync::Arc;
use transport::UdpSocket;

/// Plaintext ADC UDP commands are addressed `U` + a three-letter code;
/// `URES` and `USCH` are the only two this layer routes (§4.7).
const PLAINTEXT_URES_PREFIX: &[u8] = b"URES";
const PLAINTEXT_USCH_PREFIX: &[u8] = b"USCH";

/// Classifies and routes one received UDP datagram.
///
/// Plaintext `URES`/`USCH` packets are parsed directly; anything else is
/// tried against the manager's cached SUDP keys, newest first. A packet
/// that decrypts under no cached key is dropped silently (§9).
pub fn ingest_datagram<C: Clock>(manager: &SearchManager<C>, datagram: &[u8]) -> Option<IncomingSearchEvent> {
    if datagram.starts_with(PLAINTEXT_URES_PREFIX) {
        let token = extract_to_token(datagram);
        return Some(manager.route_result(token, datagram.to_vec()));
    }
    if datagram.starts_with(PLAINTEXT_USCH_PREFIX) {
        return Some(IncomingSearchEvent::IncomingRequest { payload: datagram.to_vec() });
    }

    let plaintext = manager.key_store().try_decrypt(datagram).ok()?;
    if plaintext.starts_with(PLAINTEXT_URES_PREFIX) {
        let token = extract_to_token(&plaintext);
        Some(manager.route_result(token, plaintext))
    } else if plaintext.starts_with(PLAINTEXT_USCH_PREFIX) {
        Some(IncomingSearchEvent::IncomingRequest { payload: plaintext })
    } else {
        None
    }
}

fn extract_to_token(command_bytes: &[u8]) -> Option<u32> {
    let text = std::str::from_utf8(command_bytes).ok()?;
    text.split(' ').find_map(|token| token.strip_prefix("TO").and_then(|value| value.parse().ok()))
}

/// Runs the UDP receive loop against `socket` forever, handing each
/// routed event to `on_event`. Intended to run as its own `tokio` task
/// (§5: the UDP search listener is a task, not a dedicated OS thread).
pub async fn run<C: Clock>(
    socket: &UdpSocket,
    manager: Arc<SearchManager<C>>,
    mut on_event: impl FnMut(IncomingSearchEvent),
) -> std::io::Result<()> {
    loop {
        let (datagram, _from) = socket.recv().await?;
        if let Some(event) = ingest_datagram(&manager, &datagram) {
            on_event(event);
        }
    }
}
