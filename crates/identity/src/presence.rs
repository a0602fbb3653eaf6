//! Per-session presence: [`Identity`] (the INF field map and derived
//! connect modes) and [`OnlineUser`] (an [`Identity`] paired with the hub
//! it was observed on, §3.2).

use crate::connect_mode::ConnectMode;
use crate::sid::Sid;
use crate::user::User;
use std::collections::HashMap;
use std::sync::Arc;

/// One user's live presence on one hub: the ADC `INF`/NMDC `$MyINFO` field
/// set, the session SID, and the connectivity modes derived against our
/// own identity.
///
/// Kept separate from [`User`] because the same [`User`] can hold a
/// different [`Identity`] per hub it's online on simultaneously - share
/// size, slot count, and connect mode are all hub-session-scoped, not
/// global facts about the person.
#[derive(Debug)]
pub struct Identity {
    user: Arc<User>,
    sid: Sid,
    fields: HashMap<String, String>,
    tcp_mode: ConnectMode,
    udp_mode: ConnectMode,
}

impl Identity {
    /// Creates a fresh identity for `user` at `sid`, with no INF fields
    /// populated yet.
    #[must_use]
    pub fn new(user: Arc<User>, sid: Sid) -> Self {
        Self {
            user,
            sid,
            fields: HashMap::new(),
            tcp_mode: ConnectMode::Undefined,
            udp_mode: ConnectMode::Undefined,
        }
    }

    /// The underlying, hub-independent user.
    #[must_use]
    pub fn user(&self) -> &Arc<User> {
        &self.user
    }

    /// The session identifier this identity was assigned on its hub.
    #[must_use]
    pub const fn sid(&self) -> Sid {
        self.sid
    }

    /// Merges one field (e.g. from a `BINF` token or an NMDC `$MyINFO`
    /// sub-field translated to the same two-letter vocabulary) into the
    /// field set, replacing any previous value.
    pub fn set_field(&mut self, code: &str, value: impl Into<String>) {
        self.fields.insert(code.to_string(), value.into());
    }

    /// Reads a field by its two-letter ADC code (`NI`, `SS`, `SL`, `VE`, …).
    #[must_use]
    pub fn field(&self, code: &str) -> Option<&str> {
        self.fields.get(code).map(String::as_str)
    }

    /// The display nickname (`NI`), or an empty string if never set - an
    /// `INF` without `NI` is malformed but shouldn't be a panic.
    #[must_use]
    pub fn nick(&self) -> &str {
        self.field("NI").unwrap_or_default()
    }

    /// The advertised share size in bytes (`SS`), if present and numeric.
    #[must_use]
    pub fn share_size(&self) -> Option<u64> {
        self.field("SS").and_then(|s| s.parse().ok())
    }

    /// The advertised slot count (`SL`), if present and numeric.
    #[must_use]
    pub fn slot_count(&self) -> Option<u32> {
        self.field("SL").and_then(|s| s.parse().ok())
    }

    /// The current derived TCP [`ConnectMode`].
    #[must_use]
    pub const fn tcp_mode(&self) -> ConnectMode {
        self.tcp_mode
    }

    /// The current derived UDP [`ConnectMode`].
    #[must_use]
    pub const fn udp_mode(&self) -> ConnectMode {
        self.udp_mode
    }

    /// Replaces the derived connect modes - called by the hub session after
    /// every INF merge, ours or the peer's (§4.3).
    pub fn set_connect_modes(&mut self, tcp: ConnectMode, udp: ConnectMode) {
        self.tcp_mode = tcp;
        self.udp_mode = udp;
    }
}

/// A hub-scoped handle naming which hub an [`Identity`] was observed on,
/// without the [`Identity`] holding a back-reference to the hub itself -
/// the hub's roster owns the pairing and destroys it on `QUI`/`$Quit`
/// (§3.5), while the underlying [`User`] can outlive it.
#[derive(Debug)]
pub struct OnlineUser {
    identity: Identity,
    hub_url: String,
}

impl OnlineUser {
    /// Pairs an [`Identity`] with the URL of the hub it was observed on.
    #[must_use]
    pub fn new(identity: Identity, hub_url: impl Into<String>) -> Self {
        Self {
            identity,
            hub_url: hub_url.into(),
        }
    }

    /// The per-session identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Mutable access to the per-session identity, e.g. to merge another
    /// `INF` or recompute connect modes.
    pub fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    /// The hub this presence was observed on.
    #[must_use]
    pub fn hub_url(&self) -> &str {
        &self.hub_url
    }
}
