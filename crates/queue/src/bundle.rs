//! A directory or single file queued as a unit, sharing priority and
//! completion policy across however many [`crate::file::QueueFile`]s it
//! groups (§3.3).

use crate::priority::Priority;
use identity::Cid;
use std::collections::HashMap;

/// A [`Bundle`]'s lifecycle state (§3.3, §3.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BundleStatus {
    /// Just created, no files attached yet.
    New,
    /// Has files, actively downloading.
    Queued,
    /// A file inside this bundle is being re-verified
    /// ([`crate::manager::QueueManager::recheck_file`]).
    Recheck,
    /// Every file finished downloading; awaiting bundle-level validation.
    Downloaded,
    /// The `bundle_completion` hook is running.
    ValidationRunning,
    /// The `bundle_completion` hook rejected this bundle (§4.5.5 step 3).
    ValidationError,
    /// Passed bundle-level validation; ready to be indexed by the Share
    /// service.
    Completed,
    /// Indexed by the Share service; terminal success state (§8 invariant
    /// 4).
    Shared,
    /// A disk error paused this bundle at `PausedForce` (§7).
    DownloadError,
    /// The bundle-completion hook reported files missing from disk.
    FailedMissing,
    /// The Share service failed to index the completed bundle.
    SharingFailed,
}

/// A directory or single-file download grouping (§3.3).
#[derive(Clone, Debug)]
pub struct Bundle {
    /// The bundle's persistent token, used in PBD/UBN wire exchanges and
    /// as the XML record filename (§4.5.10).
    pub token: u32,
    /// The target directory (directory bundle) or file path (file
    /// bundle).
    pub target: String,
    /// The current priority.
    pub priority: Priority,
    /// Whether this bundle participates in auto-priority re-ranking.
    pub auto_priority: bool,
    /// The remote file's reported modification time, if known (Unix ms).
    pub date_ms: Option<i64>,
    /// Clock milliseconds this bundle was created.
    pub added_ms: u64,
    /// The lifecycle state.
    pub status: BundleStatus,
    /// Tokens of the files (by target path) this bundle groups.
    pub queue_items: Vec<String>,
    /// Target paths of files within this bundle that have finished
    /// downloading.
    pub finished_files: Vec<String>,
    /// Sources offering at least one file in this bundle (union of its
    /// files' sources), refreshed by the engine as files' source sets
    /// change.
    pub sources: HashMap<Cid, String>,
    /// Sources that have gone bad for every file they were offering in
    /// this bundle.
    pub bad_sources: HashMap<Cid, String>,
    /// Remote bundle tokens of peers awaiting a completion notification
    /// from us for this bundle (PBD `UP1`, §4.5.7); cleared once notified
    /// or once the entry is stale.
    pub finished_notifications: HashMap<Cid, u32>,
    /// Clock milliseconds this bundle's TTH was last sent as an
    /// alternate-source search (§4.5.9).
    pub last_search_tick: Option<u64>,
    /// Clock milliseconds at which a paused bundle should automatically
    /// resume at its stored priority.
    pub resume_time_ms: Option<u64>,
    /// Whether this is a single-file bundle. File bundles never merge
    /// with another bundle (§3.3, §4.5.2).
    pub is_file_bundle: bool,
    /// Whether an auto-search scheduler (outside this crate's scope, §1)
    /// created this bundle rather than a direct user action.
    pub added_by_auto_search: bool,
    /// A monotonically increasing sequence number assigned at creation,
    /// used to break ties when sorting bundles by insertion order.
    pub seq_order: u64,
}

impl Bundle {
    /// Whether every file this bundle groups has finished downloading.
    #[must_use]
    pub fn is_fully_downloaded(&self) -> bool {
        !self.queue_items.is_empty() && self.queue_items.len() == self.finished_files.len()
    }

    /// Whether this bundle has reached the terminal success state with no
    /// outstanding completion notifications (§8 invariant 4:
    /// `status == SHARED => is_fully_downloaded && finished_notifications
    /// == ∅`).
    #[must_use]
    pub fn satisfies_shared_invariant(&self) -> bool {
        if self.status != BundleStatus::Shared {
            return true;
        }
        self.is_fully_downloaded() && self.finished_notifications.is_empty()
    }

    /// Whether `candidate_dir` would create a parent/child relationship
    /// with this bundle's target directory, which §4.5.2 forbids between
    /// two distinct directory bundles.
    #[must_use]
    pub fn conflicts_with_directory(&self, candidate_dir: &str) -> bool {
        if self.is_file_bundle {
            return false;
        }
        let mine = normalize_dir(&self.target);
        let other = normalize_dir(candidate_dir);
        mine != other && (mine.starts_with(&other) || other.starts_with(&mine))
    }

    /// Whether `candidate_dir` is this bundle's own directory, or a
    /// strict subdirectory of it, the merge condition in §4.5.2 ("an
    /// existing bundle whose directory is a prefix of the new target").
    #[must_use]
    pub fn is_prefix_of(&self, candidate_dir: &str) -> bool {
        if self.is_file_bundle {
            return false;
        }
        let mine = normalize_dir(&self.target);
        let other = normalize_dir(candidate_dir);
        other.starts_with(&mine)
    }
}

fn normalize_dir(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
