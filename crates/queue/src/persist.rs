//! Conversion between the live [`crate::bundle::Bundle`]/
//! [`crate::file::QueueFile`] model and [`persistence`]'s on-disk DTOs
//! (§4.5.10), plus the per-bundle debounced-save scheduler.

use crate::bundle::{Bundle, BundleStatus};
use crate::file::{FileStatus, QueueFile};
use crate::file_queue::FileQueue;
use crate::flags::QueueFileFlags;
use crate::priority::Priority;
use crate::segment::{DoneSet, Segment};
use crate::source::Source;
use checksums::tth::Tiger192;
use core::Clock;
use dashmap::DashMap;
use identity::Cid;
use persistence::{BundleRecord, DownloadRecord, SegmentRecord, SourceRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// How often a single bundle's record may be rewritten, at most (§4.5.10:
/// "debounced to once per bundle per 20 s").
pub const SAVE_DEBOUNCE_MS: u64 = 20_000;

/// Builds the on-disk record for `bundle`, pulling its files out of
/// `files` by the paths listed in `bundle.queue_items`.
#[must_use]
pub fn to_record(bundle: &Bundle, files: &FileQueue) -> BundleRecord {
    BundleRecord {
        version: 2,
        token: bundle.token,
        target: bundle.target.clone(),
        priority: bundle.priority.as_record_str().to_string(),
        auto_priority: bundle.auto_priority,
        date: bundle.date_ms,
        added: i64::try_from(bundle.added_ms).unwrap_or(i64::MAX),
        is_file_bundle: bundle.is_file_bundle,
        downloads: bundle
            .queue_items
            .iter()
            .filter_map(|path| files.get(path))
            .map(file_to_record)
            .collect(),
    }
}

fn file_to_record(file: &QueueFile) -> DownloadRecord {
    DownloadRecord {
        target: file.target_path.clone(),
        size: u64::try_from(file.size).unwrap_or(0),
        added: i64::try_from(file.added_ms).unwrap_or(i64::MAX),
        tth: file.tth.to_base32(),
        priority: file.priority.as_record_str().to_string(),
        temp_target: (file.temp_path != file.target_path).then(|| file.temp_path.clone()),
        max_segments: file.max_segments,
        auto_priority: Some(file.auto_priority),
        segments: file
            .done
            .ranges()
            .iter()
            .map(|segment| SegmentRecord { start: segment.start, size: segment.size })
            .collect(),
        sources: file
            .sources
            .values()
            .map(|source| SourceRecord {
                cid: source.cid.to_base32(),
                nick: source.nick.clone(),
                hub_hint: source.hub_hint.clone(),
            })
            .collect(),
    }
}

/// Reconstructs a [`Bundle`] (without its `queue_items`, filled in by the
/// caller after files are rebuilt) and its [`QueueFile`]s from a loaded
/// [`BundleRecord`].
///
/// Records with an unparseable TTH or CID are skipped with their path
/// logged rather than failing the whole bundle load (§4.5.10's
/// skip-and-continue policy extends to individual malformed entries
/// within an otherwise valid file).
#[must_use]
pub fn from_record(record: &BundleRecord) -> (Bundle, Vec<QueueFile>) {
    let mut queue_items = Vec::with_capacity(record.downloads.len());
    let mut files = Vec::with_capacity(record.downloads.len());
    for download in &record.downloads {
        let Some(file) = record_to_file(download, record.token) else {
            logging::info_log(|f| f.queue > 0, || format!("skipping malformed queue record for {:?}", download.target));
            continue;
        };
        queue_items.push(file.target_path.clone());
        files.push(file);
    }

    let bundle = Bundle {
        token: record.token,
        target: record.target.clone(),
        priority: Priority::from_record_str(&record.priority).unwrap_or(Priority::Normal),
        auto_priority: record.auto_priority,
        date_ms: record.date,
        added_ms: u64::try_from(record.added).unwrap_or(0),
        status: BundleStatus::Queued,
        queue_items,
        finished_files: Vec::new(),
        sources: HashMap::new(),
        bad_sources: HashMap::new(),
        finished_notifications: HashMap::new(),
        last_search_tick: None,
        resume_time_ms: None,
        is_file_bundle: record.is_file_bundle,
        added_by_auto_search: false,
        seq_order: u64::from(record.token),
    };
    (bundle, files)
}

fn record_to_file(download: &DownloadRecord, bundle_token: u32) -> Option<QueueFile> {
    let tth = Tiger192::from_base32(&download.tth).ok()?;
    let priority = Priority::from_record_str(&download.priority).unwrap_or(Priority::Normal);
    let mut done = DoneSet::new();
    for segment in &download.segments {
        let segment = Segment::new(segment.start, segment.size, false)?;
        done.merge(segment);
    }
    let mut sources = HashMap::new();
    for source_record in &download.sources {
        let Ok(cid) = Cid::from_base32(&source_record.cid) else {
            continue;
        };
        sources.insert(
            cid,
            Source::new(cid, source_record.nick.clone(), source_record.hub_hint.clone()),
        );
    }
    let size = i64::try_from(download.size).unwrap_or(i64::MAX);
    Some(QueueFile {
        target_path: download.target.clone(),
        temp_path: download.temp_target.clone().unwrap_or_else(|| download.target.clone()),
        size,
        tth,
        priority,
        auto_priority: download.auto_priority.unwrap_or(true),
        flags: QueueFileFlags::empty(),
        status: if done.is_complete(size) { FileStatus::Downloaded } else { FileStatus::Queued },
        done,
        max_segments: download.max_segments.max(1),
        sources,
        bad_sources: HashMap::new(),
        active_downloads: HashMap::new(),
        bundle_token,
        added_ms: u64::try_from(download.added).unwrap_or(0),
        time_finished_ms: None,
        last_source_nicks: Vec::new(),
        block_size: checksums::tth::LEAF_SIZE as i64,
        hook_error: None,
        request_token: None,
    })
}

/// Tracks which bundles need their record rewritten and debounces repeat
/// writes to at most once per [`SAVE_DEBOUNCE_MS`] (§4.5.10).
pub struct SaveScheduler<C: Clock> {
    clock: Arc<C>,
    dirty_since: DashMap<u32, u64>,
    last_saved: DashMap<u32, u64>,
}

impl<C: Clock> SaveScheduler<C> {
    /// Creates an empty scheduler driven by `clock`.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self { clock, dirty_since: DashMap::new(), last_saved: DashMap::new() }
    }

    /// Marks `token` as having a pending change to persist.
    pub fn mark_dirty(&self, token: u32) {
        self.dirty_since.entry(token).or_insert_with(|| self.clock.now_ms());
    }

    /// Returns the tokens due for a save right now (dirty, and either
    /// never saved or past the debounce window since their last save),
    /// clearing their dirty marker as if the save had been performed.
    ///
    /// The caller is responsible for actually calling
    /// [`persistence::BundleStore::save`] for each returned token;
    /// marking it here assumes that call will follow immediately.
    pub fn take_due(&self) -> Vec<u32> {
        let now = self.clock.now_ms();
        let due: Vec<u32> = self
            .dirty_since
            .iter()
            .filter(|entry| {
                let last = self.last_saved.get(entry.key()).map_or(0, |v| *v);
                now.saturating_sub(last) >= SAVE_DEBOUNCE_MS
            })
            .map(|entry| *entry.key())
            .collect();
        for token in &due {
            self.dirty_since.remove(token);
            self.last_saved.insert(*token, now);
        }
        due
    }

    /// Every currently dirty token, regardless of debounce window - used
    /// on shutdown, where §4.5.10 says saves are "also flushed on
    /// shutdown" rather than waiting out the debounce.
    pub fn take_all_dirty(&self) -> Vec<u32> {
        let tokens: Vec<u32> = self.dirty_since.iter().map(|entry| *entry.key()).collect();
        for token in &tokens {
            self.dirty_since.remove(token);
        }
        tokens
    }
}
