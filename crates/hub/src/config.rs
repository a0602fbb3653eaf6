//! Per-hub connection configuration supplied by the caller at session
//! construction (§4.2).

use identity::Cid;

/// Everything a hub session needs to know about ourselves and the hub we
/// are about to join, fixed for the lifetime of the connection.
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// The hub's address, e.g. `"dchub://hub.example:411"` or
    /// `"adcs://hub.example:412"`. Used verbatim as the `hub_url` carried
    /// in [`hooks::events`] payloads and [`identity::OnlineUser`] entries.
    pub hub_url: String,
    /// Our requested nick.
    pub nick: String,
    /// Our hub password, if the hub turns out to require one.
    pub password: Option<String>,
    /// Our stable client identifier.
    pub my_cid: Cid,
    /// Our private ID, sent once as `PD` on the first `BINF` (ADC only).
    pub pid_base32: String,
    /// ADC feature codes we advertise in `HSUP`/`BINF SU`, e.g. `"BASE"`,
    /// `"TIGR"`, `"UCM0"`, `"BLO0"`, `"ZLIF"`, `"HBRI"`.
    pub features: Vec<String>,
    /// Our current share size in bytes, sent as `SS`.
    pub share_size: u64,
    /// Our configured upload slot count, sent as `SL`.
    pub slot_count: u32,
    /// The TCP port we listen for inbound C-C connections on.
    pub my_port: u16,
    /// Whether a TLS client certificate/private key is loaded, gating
    /// `ADCS`/`CCPM` connect offers.
    pub tls_loaded: bool,
    /// Whether we support NAT traversal (`NAT0`).
    pub nat_t_supported: bool,
    /// Whether this hub is known to require keyprint verification before
    /// `connect_to_user` may proceed.
    pub hub_hash_required: bool,
    /// How often (ms) we re-push our own `BINF`/`$MyINFO` on share-size
    /// changes, rather than on every byte.
    pub info_push_interval_ms: u64,
}

impl HubConfig {
    /// Builds the `SU` value advertised on our own `BINF`/`INF`: the
    /// configured feature list, comma-joined.
    #[must_use]
    pub fn supports_field(&self) -> String {
        self.features.join(",")
    }
}
