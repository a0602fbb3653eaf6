//! The upload engine (§4.6): [`UploadManager`] ties the share resolver,
//! the download queue's partial-file fallback, the `slot_type` hook, and
//! [`SlotTracker`] together into `on_request`.

use crate::effect::UploadEffect;
use crate::error::UploadError;
use crate::request::{RequestKind, UploadRequest, USER_LIST_NAME_EXTRACTED};
use crate::share::{ShareLookup, ShareProfile, ShareResolver};
use crate::slot::{SlotClass, SlotConfig, SlotRequestContext, SlotTracker, SMALL_FILE_MAX_BYTES};
use connmgr::{Direction, McnTracker};
use core::Clock;
use filters::Skiplist;
use hooks::events::SlotTypeInput;
use hooks::{HookRegistry, ListenerRegistry};
use identity::Cid;
use parking_lot::RwLock;
use queue::QueueManager;
use std::sync::Arc;

/// What a caller knows about the requesting connection that
/// [`UploadManager::on_request`] can't derive on its own - peer-advertised
/// capabilities and measured throughput.
#[derive(Clone, Copy, Debug)]
pub struct RequestHints {
    /// This connection is one of the requester's MCN sub-connections.
    pub is_mcn_connection: bool,
    /// The peer advertised `MiniSlots` support.
    pub peer_supports_mini_slots: bool,
    /// The peer advertised `ZLIG`/`ZLib` support.
    pub peer_supports_zlib: bool,
    /// Our current measured upload speed, bytes/sec, for the grace-slot
    /// test.
    pub current_upload_speed_bps: f64,
}

/// What `on_request` decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadDecision {
    /// A slot was granted; the caller must call
    /// [`UploadManager::release`] with `class` once the transfer ends.
    Granted {
        /// The granted slot class.
        class: SlotClass,
        /// What the driver should do to fulfil the request.
        effect: UploadEffect,
    },
    /// No slot was available. Not an error - `NOSLOT` is an expected,
    /// recoverable outcome (§4.6 step 6).
    Refused {
        /// What the driver should send back.
        effect: UploadEffect,
    },
}

enum ResolvedStream {
    File { real_path: String },
    Bytes { data: Vec<u8> },
}

/// The upload engine's live state: the slot tracker, the extension points,
/// and a handle to the share resolver and (optionally) the download queue
/// for partial-file serving.
pub struct UploadManager<C: Clock> {
    clock: Arc<C>,
    hooks: Arc<HookRegistry>,
    #[allow(dead_code)]
    listeners: Arc<ListenerRegistry>,
    share: Arc<dyn ShareResolver>,
    queue: Option<Arc<QueueManager<C>>>,
    mcn: Arc<McnTracker>,
    slots: SlotTracker,
    mini_slot_glob: RwLock<Skiplist>,
}

impl<C: Clock> UploadManager<C> {
    /// Builds an upload manager. `mcn` is the same tracker the C-C
    /// connection layer records MCN sub-connection opens/closes on, so
    /// `classify`'s MCN branch sees live counts. `queue` is `None` when
    /// this process isn't also running a download engine.
    #[must_use]
    pub fn new(
        clock: Arc<C>,
        hooks: Arc<HookRegistry>,
        listeners: Arc<ListenerRegistry>,
        share: Arc<dyn ShareResolver>,
        queue: Option<Arc<QueueManager<C>>>,
        mcn: Arc<McnTracker>,
        slot_config: SlotConfig,
        mini_slot_glob: Skiplist,
    ) -> Self {
        Self {
            clock,
            hooks,
            listeners,
            share,
            queue,
            mcn,
            slots: SlotTracker::new(slot_config),
            mini_slot_glob: RwLock::new(mini_slot_glob),
        }
    }

    /// Replaces the mini-slot extension glob (e.g. after a settings edit).
    pub fn set_mini_slot_glob(&self, glob: Skiplist) {
        *self.mini_slot_glob.write() = glob;
    }

    /// Adds `user` to the reserved-slot list (§4.6.1 step 3).
    pub fn reserve_slot_for(&self, user: Cid) {
        self.slots.reserve(user);
    }

    /// Removes `user` from the reserved-slot list.
    pub fn unreserve_slot_for(&self, user: Cid) {
        self.slots.unreserve(user);
    }

    /// Resolves, classifies, and decides how to fulfil an upload request
    /// (§4.6 steps 1-6).
    ///
    /// # Errors
    ///
    /// See [`UploadError`] for the step-1 through step-3 rejection cases,
    /// and [`UploadError::HookRejected`] when a `slot_type` subscriber
    /// vetoes the request outright.
    pub fn on_request(&self, user: Option<Cid>, request: &UploadRequest, hints: RequestHints) -> Result<UploadDecision, UploadError> {
        let user = user.ok_or(UploadError::UnknownUser)?;

        if !request.validate() {
            return Err(UploadError::InvalidRequest(request.file_path.clone()));
        }

        let profile = self.share.profile_for(user);
        let (file_size, is_partial_source, stream) = self.resolve_stream(profile, request)?;

        let hook_input = SlotTypeInput {
            cid: user.to_base32(),
            file_path: request.file_path.clone(),
            file_size: Some(u64::try_from(file_size.max(0)).unwrap_or(u64::MAX)),
        };
        let override_name = self
            .hooks
            .slot_type
            .fire(&hook_input)
            .map_err(UploadError::HookRejected)?
            .into_iter()
            .flatten()
            .next();

        let now_ms = self.clock.now_ms();
        let is_small = file_size >= 0 && file_size <= SMALL_FILE_MAX_BYTES || request.is_userlist();
        let ctx = SlotRequestContext {
            is_small_file: is_small,
            is_mcn_connection: hints.is_mcn_connection,
            peer_supports_mini_slots: hints.peer_supports_mini_slots,
            matches_mini_slot_glob: self.mini_slot_glob.read().is_skipped(&request.file_path),
            is_partial_source,
            current_upload_speed_bps: hints.current_upload_speed_bps,
        };

        let class = match override_name.as_deref() {
            Some("noslot") => None,
            Some(name) => parse_slot_class(name).or_else(|| self.slots.classify(now_ms, user, &ctx, &self.mcn)),
            None => self.slots.classify(now_ms, user, &ctx, &self.mcn),
        };

        let Some(class) = class else {
            logging::debug_log(|f| f.slot > 0, || format!("NOSLOT for {} requesting {:?}", user.to_base32(), request.file_path));
            return Ok(UploadDecision::Refused { effect: UploadEffect::Reject("NOSLOT".to_string()) });
        };

        self.slots.record_open(user, class);
        logging::info_log(|f| f.transfer > 0, || format!("granting {class:?} slot to {} for {:?}", user.to_base32(), request.file_path));

        let effect = match stream {
            ResolvedStream::Bytes { data } => UploadEffect::StreamBytes { data, compressed: hints.peer_supports_zlib },
            ResolvedStream::File { real_path } => UploadEffect::StreamFile {
                real_path,
                start: request.range.start,
                length: request.range.resolved_length(file_size),
                compressed: hints.peer_supports_zlib,
            },
        };

        Ok(UploadDecision::Granted { class, effect })
    }

    /// Records that a `class` slot granted to `user` has closed, freeing
    /// it for the next request.
    pub fn release(&self, user: Cid, class: SlotClass) {
        self.slots.record_close(user, class);
    }

    /// Whether `user` currently holds a permanent (`STANDARD`/`MCN`) slot,
    /// for the auto-kick sweep below.
    #[must_use]
    pub fn holds_permanent_slot(&self, user: Cid) -> bool {
        self.slots.is_reserved(user) || self.mcn.count(user, Direction::Upload) > 0
    }

    /// §4.6: after a user goes offline, the minute tick should disconnect
    /// their running upload unless they're on the reserved-slot list.
    /// Returns the subset of `offline_users` that should be kicked.
    pub fn auto_kick_candidates(&self, offline_users: impl IntoIterator<Item = Cid>) -> Vec<Cid> {
        offline_users.into_iter().filter(|&user| !self.slots.is_reserved(user)).collect()
    }

    /// §4.6.2: after granting a new MCN slot, checks whether
    /// `running_users` now exceeds `max_slots + free_extra_budget` and, if
    /// so, names the highest-concurrency MCN upload user whose most
    /// recent sub-connection should be closed to restore balance. Never
    /// names a user sitting at their first MCN connection.
    #[must_use]
    pub fn mcn_rebalance_victim(&self, max_slots: u32, free_extra_budget: u32) -> Option<Cid> {
        if self.slots.running_count() <= max_slots.saturating_add(free_extra_budget) {
            return None;
        }
        self.mcn.highest_concurrency_user(Direction::Upload).map(|(user, _)| user)
    }

    fn resolve_stream(&self, profile: ShareProfile, request: &UploadRequest) -> Result<(i64, bool, ResolvedStream), UploadError> {
        match request.kind {
            RequestKind::Tthl => match self.share.resolve_tthl(profile, &request.file_path) {
                Some(tree) => {
                    let data = encode_tthl_leaves(&tree);
                    let size = i64::try_from(data.len()).unwrap_or(i64::MAX);
                    Ok((size, false, ResolvedStream::Bytes { data }))
                }
                None => Err(UploadError::FileNotAvailable(request.file_path.clone())),
            },
            RequestKind::List => self.resolve_filelist(profile, request),
            RequestKind::File if request.is_userlist() => self.resolve_filelist(profile, request),
            RequestKind::File => self.resolve_file(profile, request),
        }
    }

    fn resolve_filelist(&self, profile: ShareProfile, request: &UploadRequest) -> Result<(i64, bool, ResolvedStream), UploadError> {
        let extracted = request.file_path == USER_LIST_NAME_EXTRACTED || request.list_recursive;
        match self.share.generate_filelist(profile, extracted) {
            Some(data) => {
                let size = i64::try_from(data.len()).unwrap_or(i64::MAX);
                Ok((size, false, ResolvedStream::Bytes { data }))
            }
            None => Err(UploadError::FileNotAvailable(request.file_path.clone())),
        }
    }

    fn resolve_file(&self, profile: ShareProfile, request: &UploadRequest) -> Result<(i64, bool, ResolvedStream), UploadError> {
        match self.share.resolve_file(profile, &request.file_path) {
            ShareLookup::Found(file) => Ok((file.size, false, ResolvedStream::File { real_path: file.real_path })),
            ShareLookup::AccessDenied => Err(UploadError::FileAccessDenied(request.file_path.clone())),
            ShareLookup::Miss => match self.queue.as_ref().and_then(|queue| queue.partial_download_info(&request.file_path)) {
                Some(info) => Ok((info.size, true, ResolvedStream::File { real_path: info.temp_path })),
                None => Err(UploadError::FileNotAvailable(request.file_path.clone())),
            },
        }
    }
}

fn parse_slot_class(name: &str) -> Option<SlotClass> {
    match name {
        "standard" => Some(SlotClass::Standard),
        "mcn" => Some(SlotClass::Mcn),
        "small" => Some(SlotClass::Small),
        "extra" => Some(SlotClass::Extra),
        "partial" => Some(SlotClass::Partial),
        "grace" => Some(SlotClass::Grace),
        _ => None,
    }
}

fn encode_tthl_leaves(tree: &checksums::tth::TigerTree) -> Vec<u8> {
    tree.leaves().iter().flat_map(|leaf| leaf.as_bytes().to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{RequestedRange, UploadRequest};
    use crate::share::test_support::FakeShare;
    use crate::share::SharedFile;
    use core::clock::FakeClock;
    use identity::synthetic_nmdc_cid;

    fn manager(share: Arc<FakeShare>) -> UploadManager<FakeClock> {
        UploadManager::new(
            Arc::new(FakeClock::new()),
            Arc::new(HookRegistry::new()),
            Arc::new(ListenerRegistry::new()),
            share,
            None,
            Arc::new(McnTracker::new(8)),
            SlotConfig { max_slots: 1, extra_slots: 1, extra_partial_slots: 1, speed_limit_bps: 0.0 },
            Skiplist::empty(),
        )
    }

    fn request(path: &str) -> UploadRequest {
        UploadRequest { kind: RequestKind::File, file_path: path.to_string(), range: RequestedRange::to_eof(0), user_sid: None, list_recursive: false }
    }

    fn hints() -> RequestHints {
        RequestHints { is_mcn_connection: false, peer_supports_mini_slots: false, peer_supports_zlib: false, current_upload_speed_bps: 1_000_000.0 }
    }

    #[test]
    fn unknown_user_is_rejected() {
        let share = Arc::new(FakeShare::new());
        let manager = manager(share);
        let err = manager.on_request(None, &request("/a.bin"), hints()).unwrap_err();
        assert_eq!(err, UploadError::UnknownUser);
    }

    #[test]
    fn missing_file_is_not_available() {
        let share = Arc::new(FakeShare::new());
        let manager = manager(share);
        let alice = synthetic_nmdc_cid("alice", "dchub://hub.example");
        let err = manager.on_request(Some(alice), &request("/missing.bin"), hints()).unwrap_err();
        assert_eq!(err, UploadError::FileNotAvailable("/missing.bin".to_string()));
    }

    #[test]
    fn shared_file_is_granted_a_standard_slot() {
        let share = Arc::new(FakeShare::new());
        share.put("/movie.mkv", SharedFile { real_path: "/data/movie.mkv".to_string(), size: 10_000_000, tth: None });
        let manager = manager(share);
        let alice = synthetic_nmdc_cid("alice", "dchub://hub.example");
        let decision = manager.on_request(Some(alice), &request("/movie.mkv"), hints()).unwrap();
        match decision {
            UploadDecision::Granted { class, effect } => {
                assert_eq!(class, SlotClass::Standard);
                assert_eq!(effect, UploadEffect::StreamFile { real_path: "/data/movie.mkv".to_string(), start: 0, length: 10_000_000, compressed: false });
            }
            other => panic!("expected a grant, got {other:?}"),
        }
    }

    #[test]
    fn second_request_past_max_slots_gets_noslot() {
        let share = Arc::new(FakeShare::new());
        share.put("/a.bin", SharedFile { real_path: "/data/a.bin".to_string(), size: 10_000_000, tth: None });
        share.put("/b.bin", SharedFile { real_path: "/data/b.bin".to_string(), size: 10_000_000, tth: None });
        let manager = manager(share);
        let alice = synthetic_nmdc_cid("alice", "dchub://hub.example");
        let bob = synthetic_nmdc_cid("bob", "dchub://hub.example");
        manager.on_request(Some(alice), &request("/a.bin"), hints()).unwrap();
        let decision = manager.on_request(Some(bob), &request("/b.bin"), hints()).unwrap();
        assert!(matches!(decision, UploadDecision::Refused { .. }));
    }

    #[test]
    fn releasing_a_slot_frees_it_for_the_next_request() {
        let share = Arc::new(FakeShare::new());
        share.put("/a.bin", SharedFile { real_path: "/data/a.bin".to_string(), size: 10_000_000, tth: None });
        let manager = manager(share);
        let alice = synthetic_nmdc_cid("alice", "dchub://hub.example");
        manager.on_request(Some(alice), &request("/a.bin"), hints()).unwrap();
        manager.release(alice, SlotClass::Standard);
        let bob = synthetic_nmdc_cid("bob", "dchub://hub.example");
        let decision = manager.on_request(Some(bob), &request("/a.bin"), hints()).unwrap();
        assert!(matches!(decision, UploadDecision::Granted { .. }));
    }

    #[test]
    fn mcn_rebalance_victim_is_none_under_budget() {
        let share = Arc::new(FakeShare::new());
        let manager = manager(share);
        assert_eq!(manager.mcn_rebalance_victim(1, 0), None);
    }

    #[test]
    fn mcn_rebalance_victim_picks_the_highest_concurrency_mcn_user() {
        let share = Arc::new(FakeShare::new());
        let manager = manager(share);
        let alice = synthetic_nmdc_cid("alice", "dchub://hub.example");
        let bob = synthetic_nmdc_cid("bob", "dchub://hub.example");
        manager.mcn.record_open(alice, Direction::Upload);
        manager.mcn.record_open(bob, Direction::Upload);
        manager.mcn.record_open(bob, Direction::Upload);
        manager.slots.record_open(alice, SlotClass::Mcn);
        manager.slots.record_open(bob, SlotClass::Mcn);
        assert_eq!(manager.mcn_rebalance_victim(1, 0), Some(bob));
    }

    #[test]
    fn hook_veto_is_reported_as_an_error() {
        let share = Arc::new(FakeShare::new());
        share.put("/a.bin", SharedFile { real_path: "/data/a.bin".to_string(), size: 10_000_000, tth: None });
        let hooks = Arc::new(HookRegistry::new());
        hooks.slot_type.subscribe("reject-all", |_input: &SlotTypeInput| Err(hooks::Rejection::new("slot_type", "banned", "no")));
        let manager = UploadManager::new(
            Arc::new(FakeClock::new()),
            hooks,
            Arc::new(ListenerRegistry::new()),
            share,
            None,
            Arc::new(McnTracker::new(8)),
            SlotConfig { max_slots: 4, extra_slots: 1, extra_partial_slots: 1, speed_limit_bps: 0.0 },
            Skiplist::empty(),
        );
        let alice = synthetic_nmdc_cid("alice", "dchub://hub.example");
        let err = manager.on_request(Some(alice), &request("/a.bin"), hints()).unwrap_err();
        assert!(matches!(err, UploadError::HookRejected(_)));
    }
}
