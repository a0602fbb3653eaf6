//! A single queued file (§3.3): target path, size, TTH, completed byte
//! ranges, and the sources offering it.

use crate::flags::QueueFileFlags;
use crate::priority::Priority;
use crate::segment::{DoneSet, Segment};
use crate::source::Source;
use checksums::tth::Tth;
use identity::Cid;
use std::collections::HashMap;

/// A [`QueueFile`]'s lifecycle state (§3.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileStatus {
    /// Queued, with remaining bytes to fetch.
    Queued,
    /// All bytes downloaded; awaiting move to the final target and
    /// per-file hooks.
    Downloaded,
    /// The `file_completion` hook rejected this file (§4.5.5 step 2); the
    /// bundle is paused until it's re-run successfully.
    ValidationError,
    /// Moved to its final target and passed per-file validation.
    Moved,
}

/// A connection's live segment assignment for one file: the range itself
/// plus enough bookkeeping (when it was handed out, at what speed) for a
/// second, faster source to judge whether this peer has fallen behind its
/// own projected completion time and is eligible to be overlapped
/// (§4.5.4 step 4).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveAssignment {
    /// The byte range assigned to this connection.
    pub segment: Segment,
    /// Clock milliseconds the segment was handed out.
    pub assigned_at_ms: u64,
    /// The connection's measured speed (bytes/sec) at assignment time,
    /// `0.0` if unmeasured.
    pub speed_bps: f64,
}

/// One queued file, split into segments and tracked across however many
/// sources currently offer it (§3.3).
#[derive(Clone, Debug)]
pub struct QueueFile {
    /// Final on-disk path once the transfer completes.
    pub target_path: String,
    /// Download (temp) path; equal to `target_path` means "download
    /// directly to the final path" (no separate temp file).
    pub temp_path: String,
    /// Total file size in bytes.
    pub size: i64,
    /// The file's content identity.
    pub tth: Tth,
    /// The requested priority, or the engine's last auto-priority
    /// decision if `auto_priority` is set.
    pub priority: Priority,
    /// Whether this file participates in auto-priority re-ranking
    /// (§4.5.8).
    pub auto_priority: bool,
    /// What kind of file/list this is and how it should be handled.
    pub flags: QueueFileFlags,
    /// The lifecycle state.
    pub status: FileStatus,
    /// The completed byte ranges.
    pub done: DoneSet,
    /// The maximum number of simultaneous segments this file may be split
    /// into.
    pub max_segments: u32,
    /// Known-good sources, keyed by CID.
    pub sources: HashMap<Cid, Source>,
    /// Sources that have been rejected or have failed, kept around so a
    /// later good re-offer is recognized as a repeat rather than a fresh
    /// add (§3.3, §8 invariant 3: `sources` and `bad_sources` are always
    /// disjoint).
    pub bad_sources: HashMap<Cid, Source>,
    /// CIDs of connections currently assigned a live download for this
    /// file, so at most one non-overlapped segment per (user, file) pair
    /// is ever outstanding (§8 invariant 6), and so a second, faster
    /// source can judge whether the assigned peer has fallen behind its
    /// projected completion (§4.5.4 "overlap").
    pub active_downloads: HashMap<Cid, ActiveAssignment>,
    /// The owning bundle's token.
    pub bundle_token: u32,
    /// Clock milliseconds this file was added to the queue.
    pub added_ms: u64,
    /// Clock milliseconds this file finished, once [`FileStatus::Moved`].
    pub time_finished_ms: Option<u64>,
    /// Nicks of the most recent sources, kept for display after a source
    /// disconnects (bounded small ring, not enforced here - the engine
    /// truncates it).
    pub last_source_nicks: Vec<String>,
    /// The leaf block size derived from this file's TTH tree depth, used
    /// to align segment boundaries (§4.5.4).
    pub block_size: i64,
    /// The last hook rejection recorded against this file, if any
    /// (`hook_error`, §3.3).
    pub hook_error: Option<String>,
    /// A correlation token for filelist/match-queue requests (a C-C
    /// handshake token, §3.1), present only for
    /// [`crate::flags::QueueFileFlags::USER_LIST`]/`PARTIAL_LIST`/
    /// `MATCH_QUEUE` items - the `token -> QueueFile` index §3.3 names for
    /// [`crate::file_queue::FileQueue`].
    pub request_token: Option<u32>,
}

impl QueueFile {
    /// Whether every byte of the file has been downloaded.
    #[must_use]
    pub fn is_fully_downloaded(&self) -> bool {
        self.done.is_complete(self.size)
    }

    /// Whether this file should be skipped by segment selection right
    /// now: paused, or already complete (§4.5.4 step 1).
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.priority.is_paused() && !self.is_fully_downloaded()
    }

    /// Adds `source` if its CID isn't already a (good or bad) source for
    /// this file; returns whether it was newly added (§3.3 "a user cannot
    /// appear twice as a source").
    pub fn add_source(&mut self, source: Source) -> bool {
        if self.sources.contains_key(&source.cid) || self.bad_sources.contains_key(&source.cid) {
            return false;
        }
        self.last_source_nicks.push(source.nick.clone());
        self.sources.insert(source.cid, source);
        true
    }

    /// Moves a source from good to bad (or vice versa), preserving §8
    /// invariant 3 (a CID is never in both maps at once). Moving a bad
    /// source back to good is the "upgrade" path described in §4.5.3,
    /// except when the bad reason is [`crate::flags::SourceFlags::TTH_INCONSISTENCY`],
    /// which is permanent.
    pub fn mark_source_bad(&mut self, cid: Cid) {
        if let Some(source) = self.sources.remove(&cid) {
            self.bad_sources.insert(cid, source);
        }
    }

    /// Attempts to upgrade a bad source back to good; refuses when the
    /// recorded reason is `TTH_INCONSISTENCY` (§4.5.3).
    pub fn upgrade_source(&mut self, cid: Cid) -> bool {
        use crate::flags::SourceFlags;
        let Some(source) = self.bad_sources.get(&cid) else {
            return false;
        };
        if source.flags.contains(SourceFlags::TTH_INCONSISTENCY) {
            return false;
        }
        let source = self.bad_sources.remove(&cid).unwrap();
        self.sources.insert(cid, source);
        true
    }

    /// The percent of the file completed, in `[0.0, 100.0]`, used by
    /// [`crate::autoprio::progress_priority`] (§4.5.8).
    #[must_use]
    pub fn percent_done(&self) -> f64 {
        if self.size <= 0 {
            return 100.0;
        }
        (self.done.total_bytes() as f64 / self.size as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::SourceFlags;
    use checksums::tth::hash_leaf;
    use identity::cid::synthetic_nmdc_cid;

    fn sample_file() -> QueueFile {
        QueueFile {
            target_path: "/downloads/file.bin".into(),
            temp_path: "/downloads/file.bin.dctmp".into(),
            size: 1000,
            tth: hash_leaf(b"file"),
            priority: Priority::Normal,
            auto_priority: true,
            flags: QueueFileFlags::empty(),
            status: FileStatus::Queued,
            done: DoneSet::new(),
            max_segments: 3,
            sources: HashMap::new(),
            bad_sources: HashMap::new(),
            active_downloads: HashMap::new(),
            bundle_token: 1,
            added_ms: 0,
            time_finished_ms: None,
            last_source_nicks: Vec::new(),
            block_size: 1024,
            hook_error: None,
            request_token: None,
        }
    }

    fn cid(seed: &str) -> Cid {
        synthetic_nmdc_cid(seed, "dchub://hub.example")
    }

    #[test]
    fn adding_the_same_source_twice_is_a_no_op() {
        let mut file = sample_file();
        let source = Source::new(cid("alice"), "alice", "dchub://hub.example:411");
        assert!(file.add_source(source.clone()));
        assert!(!file.add_source(source));
        assert_eq!(file.sources.len(), 1);
    }

    #[test]
    fn bad_source_cannot_also_be_a_good_source() {
        let mut file = sample_file();
        let source = Source::new(cid("alice"), "alice", "dchub://hub.example:411");
        file.add_source(source);
        file.mark_source_bad(cid("alice"));
        assert!(!file.sources.contains_key(&cid("alice")));
        assert!(file.bad_sources.contains_key(&cid("alice")));
    }

    #[test]
    fn tth_inconsistency_cannot_be_upgraded() {
        let mut file = sample_file();
        let mut source = Source::new(cid("alice"), "alice", "dchub://hub.example:411");
        source.flags.insert(SourceFlags::TTH_INCONSISTENCY);
        file.bad_sources.insert(cid("alice"), source);
        assert!(!file.upgrade_source(cid("alice")));
    }

    #[test]
    fn a_socket_failure_source_can_be_upgraded_back_to_good() {
        let mut file = sample_file();
        let source = Source::new(cid("alice"), "alice", "dchub://hub.example:411");
        file.bad_sources.insert(cid("alice"), source);
        assert!(file.upgrade_source(cid("alice")));
        assert!(file.sources.contains_key(&cid("alice")));
    }

    #[test]
    fn percent_done_reflects_completed_bytes() {
        let mut file = sample_file();
        assert_eq!(file.percent_done(), 0.0);
        file.done.merge(Segment::new(0, 500, false).unwrap());
        assert_eq!(file.percent_done(), 50.0);
    }

    #[test]
    fn paused_file_is_not_selectable() {
        let mut file = sample_file();
        file.priority = Priority::Paused;
        assert!(!file.is_selectable());
    }

    #[test]
    fn fully_downloaded_file_is_not_selectable() {
        let mut file = sample_file();
        file.done.merge(Segment::new(0, 1000, false).unwrap());
        assert!(file.is_fully_downloaded());
        assert!(!file.is_selectable());
    }
}
