//! The download engine (§4.5): the top-level [`QueueManager`] tying
//! [`FileQueue`], [`BundleQueue`], [`UserQueue`], and the `hooks`/`filters`
//! extension points together into the operations the spec names.

use crate::autoprio::{self, BalancedCandidate, AUTOPRIO_INTERVAL_MS};
use crate::bundle::{Bundle, BundleStatus};
use crate::bundle_queue::BundleQueue;
use crate::error::{FileError, SourceError};
use crate::file::{ActiveAssignment, FileStatus, QueueFile};
use crate::file_queue::FileQueue;
use crate::flags::QueueFileFlags;
use crate::priority::Priority;
use crate::segment::{DoneSet, Segment};
use crate::source::Source;
use crate::user_queue::UserQueue;
use checksums::tth::{Tth, LEAF_SIZE};
use core::Clock;
use filters::Skiplist;
use hooks::events::{
    BundleCompletionInput, BundleEvent, BundleFileValidationInput, BundleValidationInput, FileCompletionInput, FileEvent, SourceValidationInput,
};
use hooks::{HookRegistry, ListenerRegistry};
use identity::Cid;
use parking_lot::RwLock;
use std::sync::Arc;

/// The minimum segment size ever handed out, `64 KiB`, used as the floor for
/// a first segment with no measured speed (§4.5.4).
pub const MIN_FIRST_SEGMENT_BYTES: i64 = 64 * 1024;
/// The soft cap on a first segment with no measured speed, `1 MiB`.
pub const MAX_FIRST_SEGMENT_BYTES: i64 = 1024 * 1024;
/// The window a segment's target size is computed over: `speed *
/// SEGMENT_TIME`, clamped to `[block_size, remaining]` and a ~120s soft cap.
pub const SEGMENT_TIME_SECS: f64 = 30.0;
/// The soft cap on a computed segment's duration at the source's measured
/// speed, independent of `SEGMENT_TIME_SECS` (§4.5.4: "~120 s worth of
/// transfer").
pub const SEGMENT_SOFT_CAP_SECS: f64 = 120.0;
/// A slow peer must fall behind its projected completion by more than this
/// multiple of [`SEGMENT_TIME_SECS`] before a faster peer may overlap its
/// segment (§4.5.4).
pub const OVERLAP_BEHIND_FACTOR: f64 = 4.0;
/// How much faster than the assigned peer's measured speed a connection
/// must be to count as "significantly faster" and become eligible to
/// overlap that peer's in-flight segment (§4.5.4 step 4).
pub const OVERLAP_MIN_SPEED_RATIO: f64 = 2.0;

/// A newly selected download assignment, returned by
/// [`QueueManager::next_segment_for_user`] (§4.5.4 step 6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    /// The target path of the file this segment belongs to.
    pub target_path: String,
    /// The chosen segment.
    pub segment: Segment,
}

/// Why [`QueueManager::next_segment_for_user`] found nothing to assign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoSegmentReason {
    /// The user has no queued file at all.
    NothingQueued,
    /// Every candidate was skipped (paused, bad source, lowest-bundle
    /// contention, or no free byte range).
    NoEligibleSegment,
}

/// The engine's live state: every queued bundle and file, the per-user
/// source index, and the shared extension points (§4.5, §2 L8).
pub struct QueueManager<C: Clock> {
    clock: Arc<C>,
    hooks: Arc<HookRegistry>,
    listeners: Arc<ListenerRegistry>,
    skiplist: RwLock<Skiplist>,
    inner: RwLock<Inner>,
}

struct Inner {
    files: FileQueue,
    bundles: BundleQueue,
    users: UserQueue,
    running_lowest: Option<(u32, Cid)>,
}

impl<C: Clock> QueueManager<C> {
    /// Builds an empty queue manager.
    #[must_use]
    pub fn new(clock: Arc<C>, hooks: Arc<HookRegistry>, listeners: Arc<ListenerRegistry>, skiplist: Skiplist) -> Self {
        Self {
            clock,
            hooks,
            listeners,
            skiplist: RwLock::new(skiplist),
            inner: RwLock::new(Inner {
                files: FileQueue::new(),
                bundles: BundleQueue::new(),
                users: UserQueue::new(),
                running_lowest: None,
            }),
        }
    }

    /// Replaces the active skiplist (e.g. after the user edits their
    /// ignore-pattern settings).
    pub fn set_skiplist(&self, skiplist: Skiplist) {
        *self.skiplist.write() = skiplist;
    }

    /// `add_file` (§4.5.1): validates and queues a single file, merging it
    /// into an existing bundle by directory prefix (§4.5.2), and attaches
    /// `source` to it.
    ///
    /// # Errors
    ///
    /// See [`FileError`] for the rejection cases in steps 1-3, and
    /// `file_bundle_validation`/`source_validation` hook vetoes.
    pub fn add_file(
        &self,
        target_path: &str,
        size: i64,
        tth: Tth,
        source: Source,
        flags: QueueFileFlags,
        priority: Priority,
        target_exists_on_disk: bool,
    ) -> Result<(), FileError> {
        validate_target(target_path, flags.contains(QueueFileFlags::PRIVATE), &self.skiplist.read())?;

        let mut inner = self.inner.write();

        if let Some(existing) = inner.files.get(target_path) {
            if existing.size != size {
                return Err(FileError::SizeMismatch { target: target_path.to_string(), existing: existing.size, requested: size });
            }
            if existing.tth != tth {
                return Err(FileError::TthMismatch { target: target_path.to_string() });
            }
            let bundle_token = existing.bundle_token;
            drop(inner);
            return self.add_source_to_file(target_path, bundle_token, source);
        }

        if target_exists_on_disk {
            return Err(FileError::TargetFileExists(target_path.to_string()));
        }

        let bundle_token = self.resolve_bundle_for_file(&mut inner, target_path, priority, false);
        let now = self.clock.now_ms();
        let file = QueueFile {
            target_path: target_path.to_string(),
            temp_path: format!("{target_path}.dctmp"),
            size,
            tth,
            priority,
            auto_priority: true,
            flags,
            status: FileStatus::Queued,
            done: DoneSet::new(),
            max_segments: 3,
            sources: std::collections::HashMap::new(),
            bad_sources: std::collections::HashMap::new(),
            active_downloads: std::collections::HashMap::new(),
            bundle_token,
            added_ms: now,
            time_finished_ms: None,
            last_source_nicks: Vec::new(),
            block_size: i64::try_from(LEAF_SIZE).unwrap_or(1024),
            hook_error: None,
            request_token: None,
        };
        inner.files.insert(file);
        if let Some(bundle) = inner.bundles.get_mut(bundle_token) {
            bundle.queue_items.push(target_path.to_string());
        }
        self.listeners.file.emit(&FileEvent::Added { target_path: target_path.to_string() });
        drop(inner);

        self.add_source_to_file(target_path, bundle_token, source)
    }

    fn resolve_bundle_for_file(&self, inner: &mut Inner, target_path: &str, priority: Priority, is_file_bundle: bool) -> u32 {
        let dir = parent_dir(target_path);
        if !is_file_bundle {
            if let Some(existing) = inner.bundles.find_containing_dir(&dir) {
                return existing.token;
            }
        }
        let token = inner.bundles.allocate_token();
        let bundle = Bundle {
            token,
            target: if is_file_bundle { target_path.to_string() } else { dir },
            priority,
            auto_priority: true,
            date_ms: None,
            added_ms: self.clock.now_ms(),
            status: BundleStatus::New,
            queue_items: Vec::new(),
            finished_files: Vec::new(),
            sources: std::collections::HashMap::new(),
            bad_sources: std::collections::HashMap::new(),
            finished_notifications: std::collections::HashMap::new(),
            last_search_tick: None,
            resume_time_ms: None,
            is_file_bundle,
            added_by_auto_search: false,
            seq_order: u64::from(token),
        };
        inner.bundles.insert(bundle);
        self.listeners.bundle.emit(&BundleEvent::Added { token });
        token
    }

    /// `add_bundle_directory` (§4.5.1): queues every file in `files` under a
    /// single directory bundle, rejecting the whole call if `target_dir`
    /// would nest under, or have nested under it, a different existing
    /// directory bundle. Per-file validation failures are collected rather
    /// than aborting the batch.
    ///
    /// Returns the bundle token and the per-file errors for entries that
    /// were rejected (the `ErrorCollector` pattern, §4.5.1).
    ///
    /// # Errors
    ///
    /// Returns [`FileError::NestedBundleConflict`] only for the directory
    /// itself; individual file failures are reported in the returned
    /// `Vec`, not as an `Err`.
    pub fn add_bundle_directory(
        &self,
        target_dir: &str,
        files: &[(String, i64, Tth, Source)],
        priority: Priority,
        date_ms: Option<i64>,
    ) -> Result<(u32, Vec<(String, FileError)>), FileError> {
        {
            let inner = self.inner.read();
            if let Some(conflicting) = inner.bundles.nested_under(target_dir) {
                if let Some(first) = conflicting.first() {
                    return Err(FileError::NestedBundleConflict { target_dir: target_dir.to_string(), conflicting_target: first.target.clone() });
                }
            }
            if let Some(parent) = inner.bundles.find_containing_dir(target_dir) {
                if parent.is_file_bundle {
                    return Err(FileError::FileBundleCannotMerge(parent.target.clone()));
                }
            }
        }

        let mut errors = Vec::new();
        let mut token = None;
        for (target_path, size, tth, source) in files {
            match self.add_file(target_path, *size, *tth, source.clone(), QueueFileFlags::empty(), priority, false) {
                Ok(()) => {
                    if token.is_none() {
                        token = self.inner.read().files.get(target_path).map(|f| f.bundle_token);
                    }
                }
                Err(err) => errors.push((target_path.clone(), err)),
            }
        }
        let token = token.ok_or_else(|| FileError::EmptyTarget)?;
        if let Some(bundle) = self.inner.write().bundles.get_mut(token) {
            bundle.date_ms = date_ms;
        }
        Ok((token, errors))
    }

    /// `add_source` (§4.5.3): attaches `source` to the file at `target_path`,
    /// firing `source_validation` and indexing the source into the
    /// per-user queue on success.
    ///
    /// # Errors
    ///
    /// [`SourceError::SelfSource`] and [`SourceError::HookRejected`] per
    /// §4.5.3; [`SourceError::NotFound`] if the target isn't queued.
    pub fn add_source(&self, target_path: &str, source: Source, requester_is_self: bool) -> Result<(), SourceError> {
        if requester_is_self {
            return Err(SourceError::SelfSource);
        }
        let bundle_token = {
            let inner = self.inner.read();
            inner.files.get(target_path).map(|f| f.bundle_token).ok_or_else(|| SourceError::NotFound(target_path.to_string()))?
        };
        self.add_source_to_file(target_path, bundle_token, source).map_err(|err| match err {
            FileError::HookRejected(rejection) => SourceError::HookRejected(rejection),
            FileError::NotFound(path) => SourceError::NotFound(path),
            _ => SourceError::NotFound(target_path.to_string()),
        })
    }

    fn add_source_to_file(&self, target_path: &str, bundle_token: u32, source: Source) -> Result<(), FileError> {
        self.hooks
            .source_validation
            .fire(&SourceValidationInput { cid: source.cid.to_base32(), target_path: target_path.to_string(), hub_hint: source.hub_hint.clone() })
            .map_err(FileError::HookRejected)?;

        let mut inner = self.inner.write();
        let cid = source.cid;
        let nick = source.nick.clone();
        let priority = {
            let Some(file) = inner.files.get_mut(target_path) else {
                return Err(FileError::NotFound(target_path.to_string()));
            };
            if !file.add_source(source) {
                // Already a source (good or bad): try the upgrade path
                // instead of silently doing nothing (§4.5.3).
                file.upgrade_source(cid);
            }
            file.priority
        };
        if let Some(bundle) = inner.bundles.get_mut(bundle_token) {
            bundle.sources.insert(cid, nick);
        }
        inner.users.add(cid, priority, target_path.to_string());
        drop(inner);
        self.listeners.file.emit(&FileEvent::SourcesChanged { target_path: target_path.to_string() });
        Ok(())
    }

    /// `next_segment_for_user` (§4.5.4): scans `user`'s queue from highest
    /// to lowest priority and returns the first eligible segment, or the
    /// reason nothing was found.
    ///
    /// `measured_speed_bps` is the connection's current measured transfer
    /// speed (bytes/sec), `0.0` if unmeasured (the first segment of a
    /// session).
    pub fn next_segment_for_user(&self, user: Cid, measured_speed_bps: f64) -> Result<Download, NoSegmentReason> {
        let now_ms = self.clock.now_ms();
        let mut inner = self.inner.write();
        if !inner.users.has_any(user) {
            return Err(NoSegmentReason::NothingQueued);
        }
        let candidates = inner.users.rotate_and_scan(user);

        for (_priority, target_path) in candidates {
            let bundle_token = match inner.files.get(&target_path) {
                Some(file) => file.bundle_token,
                None => continue,
            };

            if let Some(bundle) = inner.bundles.get(bundle_token) {
                if bundle.priority == Priority::Lowest {
                    if let Some((running_token, running_user)) = inner.running_lowest {
                        if running_token != bundle_token && running_user != user {
                            continue;
                        }
                    }
                }
            }

            let Some(file) = inner.files.get_mut(&target_path) else { continue };
            if !file.is_selectable() {
                continue;
            }
            let Some(good_source) = file.sources.get(&user) else { continue };
            if !good_source.is_usable() {
                continue;
            }
            if file.active_downloads.contains_key(&user) {
                continue;
            }

            let partial = good_source.partial.clone();
            let chosen = choose_segment(file, partial.as_ref(), measured_speed_bps, now_ms);
            let Some(segment) = chosen else {
                if file.sources.len() == 1 && partial.is_some() {
                    file.mark_source_bad(user);
                    inner.users.remove(user, &target_path);
                }
                continue;
            };

            file.active_downloads.insert(user, ActiveAssignment { segment, assigned_at_ms: now_ms, speed_bps: measured_speed_bps });
            if let Some(bundle) = inner.bundles.get(bundle_token) {
                if bundle.priority == Priority::Lowest {
                    inner.running_lowest = Some((bundle_token, user));
                }
            }
            return Ok(Download { target_path, segment });
        }
        Err(NoSegmentReason::NoEligibleSegment)
    }

    /// `TransmitDone` (§4.5.5): merges a finished segment into `done`,
    /// advancing the file/bundle lifecycle when the file (and its owning
    /// bundle) completes.
    ///
    /// # Errors
    ///
    /// Propagates a `file_completion`/`bundle_file_validation`/
    /// `bundle_validation`/`bundle_completion` hook veto; the file/bundle
    /// is left at [`FileStatus::ValidationError`]/
    /// [`crate::bundle::BundleStatus::ValidationError`] respectively so a
    /// caller can re-run the hook later.
    pub fn finish_segment(&self, user: Cid, target_path: &str, segment: Segment) -> Result<(), FileError> {
        let mut inner = self.inner.write();
        if inner.running_lowest.is_some_and(|(_, running_user)| running_user == user) {
            inner.running_lowest = None;
        }
        let Some(file) = inner.files.get_mut(target_path) else {
            return Err(FileError::NotFound(target_path.to_string()));
        };
        file.active_downloads.remove(&user);
        file.done.merge(segment);
        let newly_complete = file.is_fully_downloaded();
        let bundle_token = file.bundle_token;
        if !newly_complete {
            drop(inner);
            self.listeners.file.emit(&FileEvent::Tick { target_path: target_path.to_string(), done_bytes: u64::try_from(file_done_bytes(target_path, self)).unwrap_or(0) });
            return Ok(());
        }
        file.status = FileStatus::Downloaded;
        file.time_finished_ms = Some(self.clock.now_ms());
        let tth = file.tth;
        let size = u64::try_from(file.size).unwrap_or(0);
        drop(inner);

        if let Err(rejection) = self.hooks.file_completion.fire(&FileCompletionInput { target_path: target_path.to_string(), tth: tth.to_base32(), size }) {
            let mut inner = self.inner.write();
            if let Some(file) = inner.files.get_mut(target_path) {
                file.status = FileStatus::ValidationError;
                file.hook_error = Some(rejection.message.clone());
            }
            if let Some(bundle) = inner.bundles.get_mut(bundle_token) {
                bundle.priority = Priority::PausedForce;
            }
            return Err(FileError::HookRejected(rejection));
        }

        {
            let mut inner = self.inner.write();
            if let Some(file) = inner.files.get_mut(target_path) {
                file.status = FileStatus::Moved;
            }
            if let Some(bundle) = inner.bundles.get_mut(bundle_token) {
                if !bundle.finished_files.contains(&target_path.to_string()) {
                    bundle.finished_files.push(target_path.to_string());
                }
            }
        }
        self.listeners.file.emit(&FileEvent::Finished { target_path: target_path.to_string() });

        self.hooks
            .bundle_file_validation
            .fire(&BundleFileValidationInput { bundle_token, target_path: target_path.to_string(), tth: tth.to_base32() })
            .map_err(FileError::HookRejected)?;

        self.maybe_complete_bundle(bundle_token)
    }

    fn maybe_complete_bundle(&self, bundle_token: u32) -> Result<(), FileError> {
        let (target, fully_downloaded) = {
            let inner = self.inner.read();
            let Some(bundle) = inner.bundles.get(bundle_token) else {
                return Ok(());
            };
            (bundle.target.clone(), bundle.is_fully_downloaded())
        };
        if !fully_downloaded {
            return Ok(());
        }

        self.hooks
            .bundle_validation
            .fire(&BundleValidationInput { bundle_token, target: target.clone() })
            .map_err(FileError::HookRejected)?;

        {
            let mut inner = self.inner.write();
            if let Some(bundle) = inner.bundles.get_mut(bundle_token) {
                bundle.status = BundleStatus::Downloaded;
            }
        }

        if let Err(rejection) = self.hooks.bundle_completion.fire(&BundleCompletionInput { bundle_token, target: target.clone() }) {
            let mut inner = self.inner.write();
            if let Some(bundle) = inner.bundles.get_mut(bundle_token) {
                bundle.status = BundleStatus::ValidationError;
            }
            return Err(FileError::HookRejected(rejection));
        }

        let mut inner = self.inner.write();
        if let Some(bundle) = inner.bundles.get_mut(bundle_token) {
            bundle.status = BundleStatus::Shared;
        }
        drop(inner);
        self.listeners.bundle.emit(&BundleEvent::Completed { token: bundle_token });
        Ok(())
    }

    /// `recheck_file` (§4.5.6): pauses the file, re-verifies each
    /// already-downloaded leaf against `tree`, drops mismatched blocks from
    /// `done`, then resumes the file at its original priority.
    ///
    /// `reread_leaf` reads back one already-downloaded leaf's bytes from
    /// disk so the caller's I/O stays outside this crate; it is called once
    /// per currently-done leaf index.
    ///
    /// # Errors
    ///
    /// [`BundleError::NotFound`] is never returned directly (file-level);
    /// returns [`FileError::NotFound`] if `target_path` isn't queued.
    pub fn recheck_file(
        &self,
        target_path: &str,
        tree: &checksums::tth::TigerTree,
        mut reread_leaf: impl FnMut(usize) -> Vec<u8>,
    ) -> Result<Vec<usize>, FileError> {
        let mut inner = self.inner.write();
        let Some(file) = inner.files.get_mut(target_path) else {
            return Err(FileError::NotFound(target_path.to_string()));
        };
        let original_priority = file.priority;
        file.priority = Priority::Paused;
        let block_size = i64::try_from(tree.block_size()).unwrap_or(i64::try_from(LEAF_SIZE).unwrap_or(1024));
        let done_leaf_count = usize::try_from(file.done.total_bytes() / block_size.max(1)).unwrap_or(0);
        drop(inner);

        let mut mismatched = Vec::new();
        for leaf_index in 0..done_leaf_count.min(tree.leaves().len()) {
            let bytes = reread_leaf(leaf_index);
            if checksums::tth::hash_leaf(&bytes) != tree.leaves()[leaf_index] {
                mismatched.push(leaf_index);
            }
        }

        let mut inner = self.inner.write();
        if let Some(file) = inner.files.get_mut(target_path) {
            if let Some(&first_bad) = mismatched.first() {
                file.done.remove_from(i64::try_from(first_bad).unwrap_or(0) * block_size);
            }
            file.priority = original_priority;
        }
        Ok(mismatched)
    }

    /// Runs one balanced-mode auto-priority pass (§4.5.8) over every
    /// auto-priority, non-paused bundle, applying the resulting priority
    /// change (paused bundles are never touched, §9 Open Question 1).
    pub fn run_balanced_autoprio(&self, speed_and_sources_by_token: &[(u32, f64, u32)]) {
        let candidates: Vec<BalancedCandidate<u32>> = speed_and_sources_by_token
            .iter()
            .filter(|(token, _, _)| {
                self.inner
                    .read()
                    .bundles
                    .get(*token)
                    .is_some_and(|bundle| bundle.auto_priority && !bundle.priority.is_paused())
            })
            .map(|&(token, speed, sources)| BalancedCandidate { id: token, speed, sources })
            .collect();
        let assignments = autoprio::balanced_priorities(&candidates);
        let mut inner = self.inner.write();
        for (token, priority) in assignments {
            if let Some(bundle) = inner.bundles.get_mut(token) {
                bundle.priority = priority;
            }
        }
    }

    /// Runs one progress-mode auto-priority pass (§4.5.8) over every
    /// auto-priority file, then sets each bundle to the average (rounded)
    /// of its files' priorities.
    pub fn run_progress_autoprio(&self) {
        let mut inner = self.inner.write();
        let mut bundle_scores: std::collections::HashMap<u32, Vec<i32>> = std::collections::HashMap::new();
        for file in inner.files.iter_mut() {
            if !file.auto_priority || file.priority.is_paused() {
                continue;
            }
            let new_priority = autoprio::progress_priority(file.percent_done());
            file.priority = new_priority;
            bundle_scores.entry(file.bundle_token).or_default().push(priority_rank(new_priority));
        }
        for (token, scores) in bundle_scores {
            if scores.is_empty() {
                continue;
            }
            let average = scores.iter().sum::<i32>() / i32::try_from(scores.len()).unwrap_or(1);
            if let Some(bundle) = inner.bundles.get_mut(token) {
                if bundle.auto_priority && !bundle.priority.is_paused() {
                    bundle.priority = rank_to_priority(average);
                }
            }
        }
    }

    /// The interval this engine's auto-priority scheduler should run
    /// balanced-mode scoring at (§4.5.8).
    #[must_use]
    pub const fn autoprio_interval_ms() -> u64 {
        AUTOPRIO_INTERVAL_MS
    }

    /// Picks the next bundle to search for alternate sources (§4.5.9).
    #[must_use]
    pub fn next_search_candidate(&self) -> Option<u32> {
        self.inner.read().bundles.next_search_candidate(self.clock.now_ms())
    }

    /// Marks `token` as just searched, for the next [`Self::next_search_candidate`]
    /// call to skip it until it cycles back around.
    pub fn mark_searched(&self, token: u32) {
        let now = self.clock.now_ms();
        if let Some(bundle) = self.inner.write().bundles.get_mut(token) {
            bundle.last_search_tick = Some(now);
        }
    }

    /// Looks up a queued file's target path and TTH for
    /// dispatching the alternate-source search query (§4.5.9: "a `TTH`-typed
    /// search is sent ... for the first-queued file of the bundle").
    #[must_use]
    pub fn first_queued_file_tth(&self, bundle_token: u32) -> Option<Tth> {
        let inner = self.inner.read();
        let bundle = inner.bundles.get(bundle_token)?;
        let path = bundle.queue_items.first()?;
        inner.files.get(path).map(|file| file.tth)
    }

    /// Restores a bundle and its files loaded from the on-disk store
    /// (§4.5.10: "Loading is parallel over all bundle files") straight
    /// into the live indices, skipping the validation and hook dispatch
    /// `add_file`/`add_bundle_directory` perform for a freshly-requested
    /// download - a reload is re-establishing state the engine already
    /// accepted once, not a new request.
    ///
    /// Duplicate tokens are rejected so the caller's "later file
    /// discarded, log a line" policy (§4.5.10) stays in the caller, where
    /// the candidate bundle files are enumerated.
    pub fn restore_bundle(&self, bundle: Bundle, files: Vec<QueueFile>) -> bool {
        let mut inner = self.inner.write();
        if inner.bundles.get(bundle.token).is_some() {
            return false;
        }
        inner.bundles.raise_next_token(bundle.token);
        for file in &files {
            for user in file.sources.keys().copied() {
                inner.users.add(user, file.priority, file.target_path.clone());
            }
        }
        for file in files {
            inner.files.insert(file);
        }
        inner.bundles.insert(bundle);
        true
    }

    /// Builds the on-disk record for `token`'s bundle, for a caller's
    /// debounced save (§4.5.10), or `None` if the token isn't live.
    #[must_use]
    pub fn record_for_bundle(&self, token: u32) -> Option<persistence::BundleRecord> {
        let inner = self.inner.read();
        let bundle = inner.bundles.get(token)?;
        Some(crate::persist::to_record(bundle, &inner.files))
    }

    /// The number of bundles currently queued.
    #[must_use]
    pub fn bundle_count(&self) -> usize {
        self.inner.read().bundles.len()
    }

    /// The number of files currently queued.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.inner.read().files.len()
    }

    /// Looks up a currently-queued file's temp path, size, TTH, and done
    /// ranges by its final target path, for the upload engine's
    /// partial-file-sharing fallback (§4.6 step 3: "or, on miss, via the
    /// download queue").
    #[must_use]
    pub fn partial_download_info(&self, target_path: &str) -> Option<PartialFileInfo> {
        let inner = self.inner.read();
        let file = inner.files.get(target_path)?;
        Some(PartialFileInfo {
            temp_path: file.temp_path.clone(),
            size: file.size,
            tth: file.tth,
            done: file.done.clone(),
        })
    }
}

/// What the upload engine needs to know to serve bytes out of a
/// not-yet-finished download (§4.6 step 3, §4.5.7).
#[derive(Clone, Debug)]
pub struct PartialFileInfo {
    /// Where the partially-downloaded bytes currently live on disk.
    pub temp_path: String,
    /// The file's final size.
    pub size: i64,
    /// The file's content identity.
    pub tth: Tth,
    /// The byte ranges already downloaded.
    pub done: DoneSet,
}

fn file_done_bytes<C: Clock>(target_path: &str, manager: &QueueManager<C>) -> i64 {
    manager.inner.read().files.get(target_path).map_or(0, |file| file.done.total_bytes())
}

fn priority_rank(priority: Priority) -> i32 {
    match priority {
        Priority::PausedForce => 0,
        Priority::Paused => 1,
        Priority::Lowest => 2,
        Priority::Low => 3,
        Priority::Normal => 4,
        Priority::High => 5,
        Priority::Highest => 6,
    }
}

fn rank_to_priority(rank: i32) -> Priority {
    match rank {
        i32::MIN..=0 => Priority::PausedForce,
        1 => Priority::Paused,
        2 => Priority::Lowest,
        3 => Priority::Low,
        4 => Priority::Normal,
        5 => Priority::High,
        _ => Priority::Highest,
    }
}

fn validate_target(target_path: &str, is_private: bool, skiplist: &Skiplist) -> Result<(), FileError> {
    if target_path.is_empty() {
        return Err(FileError::EmptyTarget);
    }
    if target_path.split(['/', '\\']).any(|part| part == "..") {
        return Err(FileError::PathTraversal(target_path.to_string()));
    }
    let name = target_path.rsplit(['/', '\\']).next().unwrap_or(target_path);
    if !is_private && skiplist.is_skipped(name) {
        return Err(FileError::Skiplisted(name.to_string()));
    }
    Ok(())
}

fn parent_dir(target_path: &str) -> String {
    match target_path.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/"),
        None => "/".to_string(),
    }
}

/// Picks the next segment for `file` from a peer measured at
/// `measured_speed_bps` (§4.5.4 step 4). `partial` restricts the chosen
/// range to the peer's advertised parts when the source is partial.
fn choose_segment(file: &QueueFile, partial: Option<&crate::source::PartialSource>, measured_speed_bps: f64, now_ms: u64) -> Option<Segment> {
    let (gap_start, gap_available, overlapped) = if let Some(partial) = partial {
        let (start, available) = partial
            .parts
            .iter()
            .filter_map(|&(part_start, part_end)| {
                let clipped_end = part_end.min(file.size);
                if clipped_end <= part_start {
                    return None;
                }
                let covered = file.done.covered_bytes_within(part_start, clipped_end);
                (covered < clipped_end - part_start).then(|| (part_start, clipped_end - part_start))
            })
            .next()?;
        (start, available, false)
    } else if let Some((start, available)) = first_gap_excluding_active(file, 0) {
        (start, available, false)
    } else {
        let (start, available) = overlap_gap(file, measured_speed_bps, now_ms)?;
        (start, available, true)
    };

    let target_bytes = target_segment_bytes(measured_speed_bps, file.block_size, gap_available);
    Segment::new(gap_start, target_bytes.min(gap_available), overlapped)
}

/// The first gap that is neither completed nor already claimed by another
/// connection's in-flight segment (§4.5.4 step 4, "is not currently
/// assigned to another connection"). Active assignments that start after
/// `from` carve the gap they fall inside into a free prefix; an active
/// assignment covering the start of a gap pushes the search past its end.
fn first_gap_excluding_active(file: &QueueFile, from: i64) -> Option<(i64, i64)> {
    let mut cursor = from.max(0);
    loop {
        let (gap_start, gap_available) = file.done.first_gap_from(cursor, file.size)?;
        let gap_end = gap_start + gap_available;
        let blocking = file
            .active_downloads
            .values()
            .map(|assignment| assignment.segment)
            .filter(|segment| segment.start < gap_end && gap_start < segment.end())
            .min_by_key(|segment| segment.start);
        let Some(blocking) = blocking else {
            return Some((gap_start, gap_available));
        };
        if blocking.start > gap_start {
            return Some((gap_start, blocking.start - gap_start));
        }
        cursor = blocking.end();
    }
}

/// Finds the widest active assignment eligible to be overlapped: the
/// requesting connection must be significantly faster
/// ([`OVERLAP_MIN_SPEED_RATIO`]) than the peer it was assigned to, and
/// that peer must have fallen behind its own projected completion time by
/// more than [`OVERLAP_BEHIND_FACTOR`] x [`SEGMENT_TIME_SECS`] (§4.5.4
/// step 4 "overlap"). Never doubles up a segment that is already an
/// overlap of some other assignment.
fn overlap_gap(file: &QueueFile, measured_speed_bps: f64, now_ms: u64) -> Option<(i64, i64)> {
    if measured_speed_bps <= 0.0 {
        return None;
    }
    file.active_downloads
        .values()
        .filter(|assignment| !assignment.segment.overlapped)
        .filter(|assignment| assignment.speed_bps > 0.0 && measured_speed_bps >= assignment.speed_bps * OVERLAP_MIN_SPEED_RATIO)
        .filter(|assignment| {
            let projected_ms = assignment.assigned_at_ms as f64 + (assignment.segment.size as f64 / assignment.speed_bps) * 1000.0;
            now_ms as f64 - projected_ms > OVERLAP_BEHIND_FACTOR * SEGMENT_TIME_SECS * 1000.0
        })
        .map(|assignment| (assignment.segment.start, assignment.segment.size))
        .max_by_key(|&(_, size)| size)
}

fn target_segment_bytes(measured_speed_bps: f64, block_size: i64, remaining: i64) -> i64 {
    let raw = if measured_speed_bps <= 0.0 {
        MIN_FIRST_SEGMENT_BYTES.max(MAX_FIRST_SEGMENT_BYTES.min(remaining.max(MIN_FIRST_SEGMENT_BYTES)))
    } else {
        let by_time = measured_speed_bps * SEGMENT_TIME_SECS;
        let soft_cap = measured_speed_bps * SEGMENT_SOFT_CAP_SECS;
        by_time.min(soft_cap) as i64
    };
    raw.clamp(block_size.max(1), remaining.max(block_size.max(1)))
}
