//! Per-connection ADC handshake state machine (§4.4).
//!
//! ```text
//! new socket → STATE_SUPNICK
//!   outbound (we sent CTM): send CSUP + CINF(ID, TO=token)
//!   inbound: wait for CSUP
//! on CSUP:           record supports, move → STATE_INF
//! on CINF:           verify ID matches expected CID;
//!                    if TO matches a known DOWNLOAD token  → become Download side
//!                    if TO matches a known UPLOAD token    → become Upload side
//!                    if PM flag set and CPMI supported     → become PM side
//!                    if keyprint mismatch (when recorded)  → PROTOCOL_ERROR, close
//!                    → STATE_IDLE (upload) or STATE_SND (download)
//! ```

use crate::token::{ConnType, TokenStore};
use identity::cid::Cid;

/// The connection's current handshake/transfer state (§8 property 10:
/// transitions are monotone for a single connection).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnState {
    /// Waiting for `CSUP` (inbound) or about to send it (outbound).
    SupNick,
    /// `CSUP` seen, waiting for `CINF`.
    Inf,
    /// Role resolved to upload; idle until a `GET` arrives.
    Idle,
    /// Role resolved to download; ready to send `GET`.
    Snd,
    /// A transfer is actively streaming.
    Running,
    /// The handshake failed; the connection is being torn down.
    Failed,
}

/// Which side of the transfer this connection ended up on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// We will receive data from the peer.
    Download,
    /// We will send data to the peer.
    Upload,
    /// This is a CCPM private-message side channel.
    Pm,
}

/// A handshake failure, matching §7's "Malformed protocol frame" /
/// "Permanent protocol mismatch" kinds.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HandshakeError {
    /// `CINF`'s `ID` didn't match the CID we expected for this token.
    #[error("CINF identity mismatch: expected {expected}, got {actual}")]
    IdentityMismatch {
        /// The CID we expected.
        expected: String,
        /// The CID the peer actually presented.
        actual: String,
    },
    /// `CINF`'s `TO` token isn't known to the token store.
    #[error("CINF token {0:?} is not a known download/upload/PM token")]
    UnknownToken(String),
    /// The peer's TLS certificate keyprint didn't match a previously
    /// recorded one for this CID.
    #[error("TLS keyprint mismatch for peer")]
    KeyprintMismatch,
    /// `CINF` arrived before `CSUP`, or a message arrived in a state that
    /// doesn't expect it.
    #[error("protocol message arrived out of order in state {0:?}")]
    OutOfOrder(ConnState),
}

/// One C-C connection's ADC handshake progress.
pub struct Handshake {
    state: ConnState,
    expected_cid: Option<Cid>,
    expected_keyprint: Option<String>,
    supported_features: Vec<String>,
    role: Option<Role>,
}

impl Handshake {
    /// Starts a handshake for an outbound connection (we sent `CTM`),
    /// expecting the peer's CID to be `expected_cid`.
    #[must_use]
    pub fn outbound(expected_cid: Cid, expected_keyprint: Option<String>) -> Self {
        Self {
            state: ConnState::SupNick,
            expected_cid: Some(expected_cid),
            expected_keyprint,
            supported_features: Vec::new(),
            role: None,
        }
    }

    /// Starts a handshake for a freshly accepted inbound connection, CID
    /// unknown until `CINF` arrives.
    #[must_use]
    pub fn inbound() -> Self {
        Self {
            state: ConnState::SupNick,
            expected_cid: None,
            expected_keyprint: None,
            supported_features: Vec::new(),
            role: None,
        }
    }

    /// The connection's current state.
    #[must_use]
    pub const fn state(&self) -> ConnState {
        self.state
    }

    /// The resolved role, once known.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        self.role
    }

    /// Handles an incoming `CSUP`, recording the peer's supported
    /// features and advancing to [`ConnState::Inf`].
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::OutOfOrder`] if not currently waiting
    /// for `CSUP`.
    pub fn on_csup(&mut self, features: Vec<String>) -> Result<(), HandshakeError> {
        if self.state != ConnState::SupNick {
            return Err(HandshakeError::OutOfOrder(self.state));
        }
        self.supported_features = features;
        self.state = ConnState::Inf;
        Ok(())
    }

    /// Whether the peer advertised `feature`.
    #[must_use]
    pub fn supports(&self, feature: &str) -> bool {
        self.supported_features.iter().any(|f| f == feature)
    }

    /// Handles an incoming `CINF(ID, TO, …)`, resolving the connection's
    /// role from the token store and advancing to [`ConnState::Idle`]
    /// (upload) or [`ConnState::Snd`] (download).
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::OutOfOrder`] if not waiting for `CINF`,
    /// [`HandshakeError::IdentityMismatch`] if an expected CID was set
    /// and doesn't match, [`HandshakeError::UnknownToken`] if `to_token`
    /// isn't in `tokens`, or [`HandshakeError::KeyprintMismatch`] if a
    /// keyprint was recorded and doesn't match `peer_keyprint`.
    pub fn on_cinf(
        &mut self,
        peer_cid: Cid,
        to_token: &str,
        pm_requested: bool,
        peer_keyprint: Option<&str>,
        tokens: &TokenStore,
    ) -> Result<Role, HandshakeError> {
        if self.state != ConnState::Inf {
            return Err(HandshakeError::OutOfOrder(self.state));
        }
        if let Some(expected) = self.expected_cid {
            if expected != peer_cid {
                self.state = ConnState::Failed;
                return Err(HandshakeError::IdentityMismatch {
                    expected: expected.to_base32(),
                    actual: peer_cid.to_base32(),
                });
            }
        }
        if let (Some(expected_kp), Some(actual_kp)) = (&self.expected_keyprint, peer_keyprint) {
            if expected_kp != actual_kp {
                self.state = ConnState::Failed;
                return Err(HandshakeError::KeyprintMismatch);
            }
        }

        let conn_type = tokens.get(to_token).ok_or_else(|| HandshakeError::UnknownToken(to_token.to_string()))?;
        let role = match conn_type {
            ConnType::Download => Role::Download,
            ConnType::Upload => Role::Upload,
            ConnType::Pm if pm_requested && self.supports("CPMI") => Role::Pm,
            ConnType::Pm => {
                self.state = ConnState::Failed;
                return Err(HandshakeError::UnknownToken(to_token.to_string()));
            }
        };

        self.expected_cid.get_or_insert(peer_cid);
        self.role = Some(role);
        self.state = match role {
            Role::Download => ConnState::Snd,
            Role::Upload | Role::Pm => ConnState::Idle,
        };
        Ok(role)
    }

    /// Marks a transfer as actively running on this connection.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError::OutOfOrder`] if the connection hasn't
    /// resolved a role yet.
    pub fn begin_transfer(&mut self) -> Result<(), HandshakeError> {
        if !matches!(self.state, ConnState::Idle | ConnState::Snd) {
            return Err(HandshakeError::OutOfOrder(self.state));
        }
        self.state = ConnState::Running;
        Ok(())
    }

    /// Returns the connection to idle (upload) or ready-to-send
    /// (download) once the active transfer finishes.
    pub fn finish_transfer(&mut self) {
        if self.state == ConnState::Running {
            self.state = match self.role {
                Some(Role::Download) => ConnState::Snd,
                _ => ConnState::Idle,
            };
        }
    }
}
