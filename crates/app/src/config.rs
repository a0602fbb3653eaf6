//! Construction-time configuration for [`crate::App`] (§9: "a single `App`
//! value constructed at start-up that owns each subsystem"), gathering the
//! tunables the spec calls out inline rather than leaving them as magic
//! numbers scattered across the managers that use them.

use identity::Cid;
use std::path::PathBuf;
use upload::SlotConfig;

/// One hub this process should join at start-up.
#[derive(Clone, Debug)]
pub struct HubEntry {
    /// The hub's address, e.g. `"adcs://hub.example:412"`.
    pub hub_url: String,
    /// Our hub password, if required.
    pub password: Option<String>,
}

/// Everything [`crate::App::new`] needs to construct every subsystem.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Our stable client identifier (§3.1).
    pub my_cid: Cid,
    /// Our private ID, base32, sent once as `PD` on the first `BINF`.
    pub pid_base32: String,
    /// Our nick, used on hubs that don't assign one.
    pub nick: String,
    /// ADC feature codes we advertise (`BASE`, `TIGR`, `BLO0`, …).
    pub features: Vec<String>,
    /// Our current share size in bytes, sent as `SS`/`$MyINFO`.
    pub share_size: u64,
    /// The hubs to join at start-up.
    pub hubs: Vec<HubEntry>,
    /// The TCP port we listen for inbound C-C connections on.
    pub listen_port: u16,
    /// Whether a TLS client certificate/private key is loaded.
    pub tls_loaded: bool,
    /// Whether we support NAT traversal (`NAT0`).
    pub nat_t_supported: bool,
    /// How often (ms) a hub session may re-push its own `BINF`/`$MyINFO`
    /// absent a forced refresh (§4.2: "at most one per 60 s").
    pub info_push_interval_ms: u64,
    /// Per-IP inbound C-C flood thresholds (minor, severe), over a 60 s
    /// sliding window (§4.4, §5).
    pub flood_thresholds: (usize, usize),
    /// The per-user MCN sub-connection ceiling (§4.4).
    pub mcn_per_user_ceiling: u32,
    /// Upload slot limits (§4.6.1).
    pub slots: SlotConfig,
    /// Skiplist glob patterns suppressing queued file names (§4.5.1).
    pub skiplist_patterns: Vec<String>,
    /// Extension glob patterns eligible for a peer-advertised mini slot
    /// (§4.6.1 step 4).
    pub mini_slot_patterns: Vec<String>,
    /// Directory the per-bundle XML store lives under (§4.5.10).
    pub queue_dir: PathBuf,
    /// Path to a legacy monolithic `Queue.xml`, imported once at start-up
    /// and then deleted (§4.5.10, §6.4).
    pub legacy_queue_xml: PathBuf,
    /// Download/upload rate limits, bytes/sec.
    pub download_rate_limit_bps: u64,
    /// Upload rate limit, bytes/sec.
    pub upload_rate_limit_bps: u64,
    /// Whether balanced (vs. progress) auto-priority mode is active
    /// (§4.5.8).
    pub balanced_autoprio: bool,
    /// The UDP port the search-result listener binds (§4.7, §6.5).
    pub udp_port: u16,
}

impl AppConfig {
    /// A [`hub::HubConfig`] for `entry`, filling in the fields this
    /// process-wide config owns.
    #[must_use]
    pub fn hub_config(&self, entry: &HubEntry) -> hub::HubConfig {
        hub::HubConfig {
            hub_url: entry.hub_url.clone(),
            nick: self.nick.clone(),
            password: entry.password.clone(),
            my_cid: self.my_cid,
            pid_base32: self.pid_base32.clone(),
            features: self.features.clone(),
            share_size: self.share_size,
            slot_count: self.slots.max_slots,
            my_port: self.listen_port,
            tls_loaded: self.tls_loaded,
            nat_t_supported: self.nat_t_supported,
            hub_hash_required: false,
            info_push_interval_ms: self.info_push_interval_ms,
        }
    }
}
