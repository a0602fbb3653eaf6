//! The shared interface both wire dialects present to the rest of the
//! workspace (§4.2: "Both implementations present the same operations").

use crate::effect::HubEffect;
use crate::state::HubState;
use identity::{Cid, OnlineUser, Sid};
use search::SearchQuery;

/// The operations every hub session - ADC or NMDC - exposes uniformly, so
/// `hub-registry` and `app` can hold a `Box<dyn HubSession>` without
/// caring which wire dialect a given hub speaks.
///
/// Sessions never touch a socket themselves: `dispatch_line` consumes one
/// already-framed line read off the wire and `take_outbox` drains the
/// [`HubEffect`]s queued in response, which a thin async driver is
/// expected to actually perform (write a line, open a C-C connection,
/// tear the socket down).
///
/// `Send` so a registry can hold sessions behind a lock shared across the
/// tokio tasks that drive each hub's socket.
pub trait HubSession: Send {
    /// The session's current position in the `PROTOCOL` → `IDENTIFY` →
    /// `VERIFY` → `NORMAL` state machine (§4.2).
    fn state(&self) -> HubState;

    /// The hub address this session was configured for.
    fn hub_url(&self) -> &str;

    /// Finds a roster entry by CID, regardless of whether the session
    /// addresses its roster by SID (ADC) or nick (NMDC).
    fn find_by_cid(&self, cid: Cid) -> Option<&OnlineUser>;

    /// Finds a roster entry by SID, to resolve a peer's advertised
    /// address (`I4`/`I6` INF fields) when executing
    /// [`HubEffect::ConnectOut`]/[`HubEffect::NatTraversal`].
    ///
    /// NMDC has no SID-keyed roster - its own `ConnectOut`/`NatTraversal`
    /// effects carry the dial address inline in the `protocol` field
    /// instead, so an `NmdcHubSession` always returns `None` here.
    fn find_by_sid(&self, sid: Sid) -> Option<&OnlineUser>;

    /// Begins the session: sends the protocol's opening negotiation line
    /// (`HSUP` for ADC, `$MyNick`+`$Lock` for NMDC).
    fn connect(&mut self);

    /// Tears the session down from our side, optionally announcing it to
    /// the hub first (`QUI`/`$Quit`) when the session is still live.
    fn disconnect(&mut self, graceful: bool);

    /// Feeds one line read from the hub socket through the session's
    /// command dispatcher.
    fn dispatch_line(&mut self, line: &str);

    /// Sends a hub-wide chat message, if the session is `Normal`.
    fn hub_message(&mut self, text: &str);

    /// Re-announces our own presence (`BINF`/`$MyINFO`) if the configured
    /// throttle interval has elapsed, or unconditionally when `force` is
    /// set (e.g. our share size changed).
    fn refresh_info(&mut self, force: bool);

    /// Drains every effect queued since the last call.
    fn take_outbox(&mut self) -> Vec<HubEffect>;

    /// Issues `query` on this hub, correlated to `token` (§4.5.9,
    /// §4.7), if the session is `Normal`.
    fn queue_search(&mut self, query: &SearchQuery, token: &str);
}
