//! Connectivity-mode derivation (§4.3): for each peer, and separately for
//! TCP and UDP, compute how we would need to connect to them.

/// The derived connectivity relationship to a peer, recomputed whenever
/// either side's INF changes (§4.3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectMode {
    /// The peer is reachable by connecting to their IPv4 address.
    ActiveV4,
    /// The peer is reachable by connecting to their IPv6 address.
    ActiveV6,
    /// The peer is reachable on both IPv4 and IPv6 (dual-stack active).
    ActiveDual,
    /// We connect to the peer using our own IPv4 active address or mutual
    /// NAT-T, after the peer asks us to (`RCM`).
    PassiveV4,
    /// As [`Self::PassiveV4`] but over IPv6.
    PassiveV6,
    /// Passive and IPv4, but we don't yet know whether they can accept a
    /// reverse connection (no IP advertised).
    PassiveV4Unknown,
    /// As [`Self::PassiveV4Unknown`] but over IPv6.
    PassiveV6Unknown,
    /// Neither side has a usable IP for this address family.
    NoconnectIp,
    /// Both sides are passive and NAT-T isn't mutually available - no
    /// connection is possible in either direction.
    NoconnectPassive,
    /// Connectivity hasn't been computed yet.
    #[default]
    Undefined,
}

/// What we know about one side's reachability for one IP family, as
/// advertised by `I4`/`I6`/`U4`/`U6` (TCP) or their UDP analogues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddressInfo {
    /// Whether this side has an address of this family at all.
    pub has_address: bool,
    /// Whether this side is reachable actively (listens on a public port)
    /// for this family, as opposed to needing a reverse connect.
    pub active: bool,
}

/// Inputs to [`derive`]: both sides' per-family reachability plus the two
/// session-level facts (mutual NAT-T support, and whether the *local* hub
/// allows inbound connections of each family) that only make sense read
/// together with the per-peer address facts.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeriveInput {
    /// Our own IPv4 reachability.
    pub our_v4: AddressInfo,
    /// Our own IPv6 reachability.
    pub our_v6: AddressInfo,
    /// The peer's IPv4 reachability.
    pub peer_v4: AddressInfo,
    /// The peer's IPv6 reachability.
    pub peer_v6: AddressInfo,
    /// Both sides advertise `NAT0` support.
    pub nat_t_mutual: bool,
    /// The current hub explicitly allows inbound IPv4 C-C connections
    /// (relevant to the `NOCONNECT_IP` fallback step).
    pub hub_allows_v4_in: bool,
    /// The current hub explicitly allows inbound IPv6 C-C connections.
    pub hub_allows_v6_in: bool,
    /// We are fully passive (no active address on either family) and do
    /// not support NAT-T.
    pub we_are_fully_passive_no_natt: bool,
}

/// Derives the [`ConnectMode`] for one peer, following the precedence in
/// §4.3: try IPv6 first, then IPv4, then the `NOCONNECT_IP` fallback chain.
#[must_use]
pub fn derive(input: DeriveInput) -> ConnectMode {
    if input.our_v6.has_address && input.peer_v6.has_address {
        if input.peer_v6.active {
            return promote_dual(ConnectMode::ActiveV6, input);
        }
        if input.our_v6.active || input.nat_t_mutual {
            return ConnectMode::PassiveV6;
        }
    }

    if input.our_v4.has_address && input.peer_v4.has_address {
        if input.peer_v4.active {
            return promote_dual(ConnectMode::ActiveV4, input);
        }
        if input.our_v4.active || input.nat_t_mutual {
            return ConnectMode::PassiveV4;
        }
    }

    if input.peer_v4.active && input.hub_allows_v4_in {
        return ConnectMode::ActiveV4;
    }
    if input.peer_v6.active && input.hub_allows_v6_in {
        return ConnectMode::ActiveV6;
    }
    if input.we_are_fully_passive_no_natt {
        return ConnectMode::NoconnectPassive;
    }
    if input.peer_v4.has_address {
        return ConnectMode::PassiveV4Unknown;
    }
    if input.peer_v6.has_address {
        return ConnectMode::PassiveV6Unknown;
    }
    ConnectMode::NoconnectIp
}

/// An `ActiveV6` result is upgraded to `ActiveDual` when IPv4 is also
/// mutually active, matching the reference behavior of treating dual-stack
/// active peers as a distinct, strictly-better mode.
fn promote_dual(mode: ConnectMode, input: DeriveInput) -> ConnectMode {
    if matches!(mode, ConnectMode::ActiveV6)
        && input.our_v4.has_address
        && input.peer_v4.has_address
        && input.peer_v4.active
    {
        return ConnectMode::ActiveDual;
    }
    mode
}
