//! The hub session state machine's states (§4.2: `PROTOCOL` → `IDENTIFY`
//! → `VERIFY` → `NORMAL`).

/// Where a hub session sits in its connection lifecycle.
///
/// Both [`crate::adc::AdcHubSession`] and [`crate::nmdc::NmdcHubSession`]
/// drive the same four states, even though the wire commands that move
/// between them differ (`HSUP`/`ISID`/`IGPA` vs. `$Lock`/`$ValidateNick`/
/// `$GetPass`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HubState {
    /// Just connected; feature/lock negotiation in flight.
    #[default]
    Protocol,
    /// Negotiation settled; waiting to learn our SID/nick is accepted.
    Identify,
    /// A password was requested; waiting on its verdict.
    Verify,
    /// Fully joined: the roster is live and we may chat, search, and
    /// request connections.
    Normal,
    /// The session has ended, by our request or the hub's.
    Disconnected,
}

impl HubState {
    /// Whether the session has progressed far enough to act as a normal
    /// hub member (chat, search, connect requests).
    #[must_use]
    pub const fn is_normal(self) -> bool {
        matches!(self, Self::Normal)
    }
}
