//! A declared supplier of some or all of a [`crate::file::QueueFile`]'s
//! bytes (§3.3).

use crate::flags::SourceFlags;
use identity::Cid;

/// A `(User, hub-hint)` pair capable of providing some or all of a file
/// (§3.3, glossary).
#[derive(Clone, Debug)]
pub struct Source {
    /// The supplying user's stable identity.
    pub cid: Cid,
    /// The nick this source was last seen under (display only; CID is
    /// authoritative, §4.2.2).
    pub nick: String,
    /// The hub URL this source was attached on, used to re-establish a
    /// connection if the user isn't already online elsewhere.
    pub hub_hint: String,
    /// Why this source might currently be unusable, or extra state it
    /// carries.
    pub flags: SourceFlags,
    /// Present when the source has advertised only part of the file via
    /// PSR (§4.5.7).
    pub partial: Option<PartialSource>,
}

impl Source {
    /// Builds a fresh, flag-free source.
    #[must_use]
    pub fn new(cid: Cid, nick: impl Into<String>, hub_hint: impl Into<String>) -> Self {
        Self {
            cid,
            nick: nick.into(),
            hub_hint: hub_hint.into(),
            flags: SourceFlags::empty(),
            partial: None,
        }
    }

    /// Whether this source is currently usable: it has no flag that marks
    /// it unconditionally bad. `SLOW_SOURCE` and `CRC_WARN` don't disable a
    /// source outright (they inform segment selection and logging
    /// respectively); `FILE_NOT_AVAILABLE` and `TTH_INCONSISTENCY` do.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.flags.intersects(SourceFlags::FILE_NOT_AVAILABLE | SourceFlags::TTH_INCONSISTENCY)
    }
}

/// The part of a file a [`Source`] has advertised holding, via an ADC/NMDC
/// PSR exchange (§4.5.7).
#[derive(Clone, Debug)]
pub struct PartialSource {
    /// The `(start, end)` byte-range pairs the peer advertised, decoded
    /// from the wire's `PI` block-index list.
    pub parts: Vec<(i64, i64)>,
    /// `hub_ip:port` the peer was seen through, carried in `HI`.
    pub hub_ip_port: String,
    /// The peer's UDP port for direct PSR queries (`U4`), `0` if they
    /// don't accept them.
    pub remote_udp_port: u16,
    /// The local nick to present in NMDC PSR requests (ADC addresses by
    /// CID/SID and doesn't need this).
    pub my_nick: String,
    /// How many PSR queries are outstanding against this source, capped
    /// at 10 (§4.5.7 pacing).
    pub pending_query_count: u32,
    /// Clock milliseconds at which another PSR query may be sent; a
    /// source is re-queried at most once per 5 minutes (§4.5.7).
    pub next_query_tick: u64,
}

impl PartialSource {
    /// The PSR re-query interval: at most once per 5 minutes per source.
    pub const QUERY_INTERVAL_MS: u64 = 5 * 60 * 1000;
    /// The cap on outstanding PSR queries per source.
    pub const MAX_PENDING_QUERIES: u32 = 10;

    /// Whether `byte_range` falls at least partly inside the peer's
    /// advertised parts.
    #[must_use]
    pub fn covers(&self, start: i64, end: i64) -> bool {
        self.parts.iter().any(|&(part_start, part_end)| part_start < end && start < part_end)
    }

    /// Whether another PSR query may be sent right now: under the
    /// pending cap and past the pacing interval.
    #[must_use]
    pub fn may_query(&self, now_ms: u64) -> bool {
        self.pending_query_count < Self::MAX_PENDING_QUERIES && now_ms >= self.next_query_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use identity::cid::synthetic_nmdc_cid;

    fn cid() -> Cid {
        synthetic_nmdc_cid("alice", "dchub://hub.example")
    }

    #[test]
    fn fresh_source_is_usable() {
        let source = Source::new(cid(), "alice", "dchub://hub.example:411");
        assert!(source.is_usable());
    }

    #[test]
    fn tth_inconsistency_marks_a_source_unusable() {
        let mut source = Source::new(cid(), "alice", "dchub://hub.example:411");
        source.flags.insert(SourceFlags::TTH_INCONSISTENCY);
        assert!(!source.is_usable());
    }

    #[test]
    fn slow_source_flag_alone_does_not_disable_it() {
        let mut source = Source::new(cid(), "alice", "dchub://hub.example:411");
        source.flags.insert(SourceFlags::SLOW_SOURCE);
        assert!(source.is_usable());
    }

    #[test]
    fn partial_source_covers_checks_range_overlap() {
        let partial = PartialSource {
            parts: vec![(0, 100), (500, 600)],
            hub_ip_port: "203.0.113.1:411".into(),
            remote_udp_port: 412,
            my_nick: "alice".into(),
            pending_query_count: 0,
            next_query_tick: 0,
        };
        assert!(partial.covers(50, 150));
        assert!(!partial.covers(150, 500));
        assert!(partial.covers(550, 700));
    }

    #[test]
    fn partial_source_pacing_blocks_until_next_tick() {
        let mut partial = PartialSource {
            parts: vec![],
            hub_ip_port: String::new(),
            remote_udp_port: 0,
            my_nick: String::new(),
            pending_query_count: 0,
            next_query_tick: 10_000,
        };
        assert!(!partial.may_query(5_000));
        assert!(partial.may_query(10_000));
        partial.pending_query_count = PartialSource::MAX_PENDING_QUERIES;
        assert!(!partial.may_query(10_000));
    }
}
