//! Outcomes of `connect_to_user` (§4.2.4): the five-step negotiation that
//! turns a roster entry into a C-C connect attempt.

/// Why a `connect_to_user` request could not be carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// Neither side shares a usable protocol ADC/NMDC or TLS variant.
    #[error("no protocol in common with the peer")]
    ProtocolUnsupported,
    /// A secure connection was required but TLS isn't loaded locally or
    /// unsupported by the peer.
    #[error("TLS is required but unavailable")]
    TlsRequired,
    /// Neither side can accept an inbound connection and NAT-T isn't
    /// mutually supported.
    #[error("no connectivity path to the peer")]
    NoNatt,
    /// The hub requires a keyprint/hash verification this peer hasn't
    /// presented.
    #[error("hub requires a keyprint this peer has not presented")]
    NoHubHash,
    /// The session isn't in [`crate::state::HubState::Normal`].
    #[error("hub session is not in a connectable state")]
    BadState,
    /// A CCPM (PM-over-C-C) channel was requested but the peer doesn't
    /// support `CPMI`.
    #[error("peer does not support CCPM")]
    CcpmUnsupported,
}
