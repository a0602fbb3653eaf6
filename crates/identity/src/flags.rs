//! Bit-flag sets carried by [`crate::User`] and computed per [`crate::Identity`].

use bitflags::bitflags;

bitflags! {
    /// Persistent, process-wide facts about a [`crate::User`] (§3.2).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UserFlags: u16 {
        /// The user currently appears in at least one hub's roster.
        const ONLINE = 1 << 0;
        /// The user was seen over NMDC (so its CID is the synthetic
        /// nick+hub derivation rather than a real ADC CID).
        const NMDC = 1 << 1;
        /// The user cannot accept inbound C-C connections.
        const PASSIVE = 1 << 2;
        /// The user is on the local favorites list.
        const FAVORITE = 1 << 3;
        /// The user's last-seen connection offered TLS.
        const TLS = 1 << 4;
        /// The user supports CCPM (client-to-client private messaging).
        const CCPM = 1 << 5;
        /// The user is flagged as an automated bot/hublist source.
        const BOT = 1 << 6;
        /// The user supports ASCH (extended search).
        const ASCH = 1 << 7;
        /// The user supports MCN1 (multi-channel connections).
        const MCN = 1 << 8;
        /// The user supports NAT0 (NAT traversal).
        const NAT_T = 1 << 9;
    }
}
