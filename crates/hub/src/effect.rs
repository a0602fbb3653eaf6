//! Effects a hub session asks its driver to carry out (§5): hub sessions
//! themselves never touch a socket or spawn a task - they consume wire
//! lines via `dispatch_line` and emit [`HubEffect`]s a thin async driver
//! (in `app`) drains with [`crate::session::HubSession::take_outbox`]
//! and actually performs, the same separation [`connmgr::handshake`]
//! keeps between protocol state and I/O.

use identity::Sid;

/// One action the driver owning a hub session's socket should perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HubEffect {
    /// Write this already-framed line to the hub socket.
    Send(String),
    /// A peer asked us to dial them, or we decided to dial a peer,
    /// directly (both sides already active, or we resolved to connect
    /// out ourselves).
    ConnectOut {
        /// The peer's SID on this hub.
        peer_sid: Sid,
        /// The wire protocol string to announce (`"ADC/1.0"` or
        /// `"ADCS/1.0"`).
        protocol: String,
        /// The peer's advertised port.
        port: u16,
        /// The token the resulting connection must present in `CINF`.
        token: String,
    },
    /// A peer asked us to connect to them via NAT traversal; the driver
    /// should start the NAT-T handshake on `port` using `token`.
    NatTraversal {
        /// The peer's SID on this hub.
        peer_sid: Sid,
        /// The wire protocol string to announce.
        protocol: String,
        /// The port advertised for the traversal attempt.
        port: u16,
        /// The token the resulting connection must present.
        token: String,
    },
    /// The hub's `HBRI` data block instructed us to probe an auxiliary
    /// TCP port before completing login (§4.2's HBRI hybrid
    /// connectivity check).
    OpenHbriProbe {
        /// The address to dial.
        address: String,
        /// The port to dial.
        port: u16,
        /// The token to echo back once connected.
        token: String,
    },
    /// The hub is redirecting us elsewhere (`IQUI`'s `RD` field or
    /// NMDC's `$ForceMove`); the driver should tear this session down and
    /// open a new one at `target`.
    Redirect {
        /// The address to reconnect to.
        target: String,
    },
    /// The session has ended; the driver should close the socket.
    Disconnect,
}
