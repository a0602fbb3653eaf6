//! The `connect_to_user` negotiation (§4.2.4): deciding how to ask a
//! roster peer to open a C-C connection, independent of whether the wire
//! encoding is ADC (`CTM`/`RCM`/`NAT`) or NMDC (`$ConnectToMe`/
//! `$RevConnectToMe`).

use crate::config::HubConfig;
use crate::error::ConnectError;
use crate::state::HubState;
use identity::ConnectMode;

/// What we know about the peer and the requested connection, gathered
/// from their roster entry and the caller's intent.
#[derive(Clone, Copy, Debug)]
pub struct PeerConnectFacts {
    /// The peer's derived connectivity mode (§4.3).
    pub connect_mode: ConnectMode,
    /// Whether the peer advertises ADCS (secure ADC) support.
    pub supports_adcs: bool,
    /// Whether NAT-T is mutually supported (both sides advertise `NAT0`).
    pub mutual_nat_t: bool,
    /// Whether the caller asked for a secure connection specifically.
    pub want_secure: bool,
    /// Whether this request is for a CCPM (PM-over-C-C) channel rather
    /// than a transfer connection.
    pub ccpm_required: bool,
    /// Whether the peer advertises `CPMI` (CCPM support).
    pub peer_supports_cpmi: bool,
    /// Whether the peer has presented a keyprint/hash the hub requires.
    pub peer_presented_hub_hash: bool,
}

/// The concrete action `connect_to_user` resolved to, still abstract over
/// ADC vs. NMDC wire rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectDecision {
    /// We can dial out or the peer can dial in directly: ask them to
    /// connect to our port (`CTM`/`$ConnectToMe`).
    Direct {
        /// The protocol string to announce, e.g. `"ADC/1.0"`.
        protocol: String,
        /// Our port the peer should dial.
        port: u16,
        /// The token the resulting connection will present.
        token: String,
    },
    /// Neither side is active but both support NAT-T: start a
    /// traversal attempt (`NAT`).
    NatTraversal {
        /// The protocol string to announce.
        protocol: String,
        /// Our port, for the traversal attempt.
        port: u16,
        /// The token the resulting connection will present.
        token: String,
    },
    /// We can't accept inbound and NAT-T isn't available, but the peer
    /// might still be able to dial us through a route we can't derive
    /// (e.g. their own active mode just wasn't advertised yet): ask them
    /// to connect to us anyway (`RCM`/`$RevConnectToMe`).
    RequestReverse {
        /// The protocol string to announce.
        protocol: String,
        /// The token the resulting connection will present.
        token: String,
    },
}

/// Resolves a `connect_to_user` request into a wire-agnostic
/// [`ConnectDecision`], per the five-step check in §4.2.4: state, hub
/// hash, CCPM support, protocol, then connectivity mode.
///
/// # Errors
///
/// Returns [`ConnectError`] if any precondition fails.
pub fn decide_connect(
    state: HubState,
    config: &HubConfig,
    facts: &PeerConnectFacts,
    token: impl Into<String>,
) -> Result<ConnectDecision, ConnectError> {
    if !state.is_normal() {
        return Err(ConnectError::BadState);
    }
    if config.hub_hash_required && !facts.peer_presented_hub_hash {
        return Err(ConnectError::NoHubHash);
    }
    if facts.ccpm_required && !facts.peer_supports_cpmi {
        return Err(ConnectError::CcpmUnsupported);
    }
    let protocol = if facts.want_secure {
        if facts.supports_adcs && config.tls_loaded {
            "ADCS/1.0"
        } else {
            return Err(ConnectError::TlsRequired);
        }
    } else {
        "ADC/1.0"
    };
    let token = token.into();

    match facts.connect_mode {
        ConnectMode::ActiveV4 | ConnectMode::ActiveV6 | ConnectMode::ActiveDual => {
            Ok(ConnectDecision::Direct { protocol: protocol.to_string(), port: config.my_port, token })
        }
        ConnectMode::PassiveV4 | ConnectMode::PassiveV6 if facts.mutual_nat_t => {
            Ok(ConnectDecision::NatTraversal { protocol: protocol.to_string(), port: config.my_port, token })
        }
        ConnectMode::PassiveV4
        | ConnectMode::PassiveV6
        | ConnectMode::PassiveV4Unknown
        | ConnectMode::PassiveV6Unknown => Ok(ConnectDecision::RequestReverse { protocol: protocol.to_string(), token }),
        ConnectMode::NoconnectIp | ConnectMode::NoconnectPassive | ConnectMode::Undefined => Err(ConnectError::NoNatt),
    }
}
