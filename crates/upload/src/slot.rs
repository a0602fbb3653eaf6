//! Upload slot classification (§4.6.1): which of the seven slot kinds a
//! request is granted, consulted in the order the spec lists them.

use connmgr::{Direction, McnTracker};
use dashmap::DashMap;
use identity::Cid;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Files at or under this size count as "small" for the MCN small-file
/// channel and the mini-slot size test (§4.6.1 steps 2 and 4).
pub const SMALL_FILE_MAX_BYTES: i64 = 64 * 1024;
/// The MCN small-file channel's global concurrency cap, independent of
/// `max_slots`.
pub const MAX_SMALL_SLOTS_GLOBAL: u32 = 8;
/// A low-speed grace slot is granted at most this often.
pub const GRACE_SLOT_MIN_INTERVAL_MS: u64 = 30_000;

/// Which of the seven slot kinds (§4.6.1) a grant was made under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotClass {
    /// A normal counted upload slot.
    Standard,
    /// A normal counted slot, but to a user connected over multiple MCN
    /// sub-connections.
    Mcn,
    /// The MCN small-file channel; doesn't count against `max_slots`.
    Small,
    /// A peer-advertised mini slot for a small file or matching extension.
    Extra,
    /// A slot serving bytes out of the download queue's partial copy.
    Partial,
    /// A one-off grace slot granted because our own upload speed is
    /// currently under the configured limit.
    Grace,
}

/// The facts about a request and its requester a slot decision needs,
/// gathered by the caller before calling [`SlotTracker::classify`].
#[derive(Clone, Copy, Debug)]
pub struct SlotRequestContext {
    /// The requested file is at or under [`SMALL_FILE_MAX_BYTES`], or this
    /// is a partial-list request (both count as "small" for step 2).
    pub is_small_file: bool,
    /// This connection identifies itself as one of the requester's MCN
    /// sub-connections.
    pub is_mcn_connection: bool,
    /// The peer advertised `MiniSlots` support.
    pub peer_supports_mini_slots: bool,
    /// The requested file's extension matches the configured mini-slot
    /// glob.
    pub matches_mini_slot_glob: bool,
    /// The file is being served from the download queue's partial copy
    /// rather than a fully shared file.
    pub is_partial_source: bool,
    /// Our current measured upload speed, bytes/sec.
    pub current_upload_speed_bps: f64,
}

/// Static limits a [`SlotTracker`] enforces (§4.6.1).
#[derive(Clone, Copy, Debug)]
pub struct SlotConfig {
    /// The standard slot count (`STANDARD`/`MCN`).
    pub max_slots: u32,
    /// The mini-slot (`EXTRA`) concurrency cap.
    pub extra_slots: u32,
    /// The partial-slot (`PARTIAL`) concurrency cap.
    pub extra_partial_slots: u32,
    /// The upload speed below which a grace slot may be granted.
    pub speed_limit_bps: f64,
}

/// Tracks running slot counts by class and decides whether a new request
/// may be granted one, in the order §4.6.1 lists (permanent-held, small,
/// permanent, mini, partial, grace, else `NOSLOT`).
pub struct SlotTracker {
    config: SlotConfig,
    running: AtomicU32,
    small: AtomicU32,
    extra: AtomicU32,
    partial: AtomicU32,
    last_grace_grant_ms: AtomicU64,
    permanent_holders: DashMap<Cid, u32>,
    reserved: DashMap<Cid, ()>,
}

impl SlotTracker {
    /// Builds an empty tracker under `config`.
    #[must_use]
    pub fn new(config: SlotConfig) -> Self {
        Self {
            config,
            running: AtomicU32::new(0),
            small: AtomicU32::new(0),
            extra: AtomicU32::new(0),
            partial: AtomicU32::new(0),
            last_grace_grant_ms: AtomicU64::new(0),
            permanent_holders: DashMap::new(),
            reserved: DashMap::new(),
        }
    }

    /// Adds `user` to the reserved-slot list: a later `classify` call for
    /// them at step 3 always succeeds regardless of `running`/`max_slots`
    /// (§4.6.1 "A reserved-slot list ... pre-grants standard slots to
    /// named users").
    pub fn reserve(&self, user: Cid) {
        self.reserved.insert(user, ());
    }

    /// Removes `user` from the reserved-slot list.
    pub fn unreserve(&self, user: Cid) {
        self.reserved.remove(&user);
    }

    /// Whether `user` currently holds a reserved slot.
    #[must_use]
    pub fn is_reserved(&self, user: Cid) -> bool {
        self.reserved.contains_key(&user)
    }

    /// The number of standard/MCN slots currently free.
    #[must_use]
    pub fn free_standard_slots(&self) -> u32 {
        self.config.max_slots.saturating_sub(self.running.load(Ordering::Acquire))
    }

    /// The number of standard/MCN slots currently in use, for the MCN
    /// rebalance test in §4.6.2 (`running_users > max_slots +
    /// free_extra_budget`).
    #[must_use]
    pub fn running_count(&self) -> u32 {
        self.running.load(Ordering::Acquire)
    }

    /// Classifies a request from `user` under `ctx` at `now_ms`, consulting
    /// `mcn` for the user's existing MCN upload count. Returns `None`
    /// (`NOSLOT`) if no class applies.
    #[must_use]
    pub fn classify(&self, now_ms: u64, user: Cid, ctx: &SlotRequestContext, mcn: &McnTracker) -> Option<SlotClass> {
        if self.permanent_holders.contains_key(&user) {
            return Some(if mcn.count(user, Direction::Upload) > 0 { SlotClass::Mcn } else { SlotClass::Standard });
        }

        if ctx.is_small_file && self.small.load(Ordering::Acquire) < MAX_SMALL_SLOTS_GLOBAL {
            return Some(SlotClass::Small);
        }

        if self.reserved.contains_key(&user) || self.running.load(Ordering::Acquire) < self.config.max_slots || mcn.count(user, Direction::Upload) > 0 {
            return Some(if ctx.is_mcn_connection { SlotClass::Mcn } else { SlotClass::Standard });
        }

        if ctx.peer_supports_mini_slots && (ctx.is_small_file || ctx.matches_mini_slot_glob) && self.extra.load(Ordering::Acquire) < self.config.extra_slots {
            return Some(SlotClass::Extra);
        }

        if ctx.is_partial_source && self.partial.load(Ordering::Acquire) < self.config.extra_partial_slots {
            return Some(SlotClass::Partial);
        }

        if ctx.current_upload_speed_bps < self.config.speed_limit_bps {
            let last = self.last_grace_grant_ms.load(Ordering::Acquire);
            if last == 0 || now_ms.saturating_sub(last) >= GRACE_SLOT_MIN_INTERVAL_MS {
                self.last_grace_grant_ms.store(now_ms, Ordering::Release);
                return Some(SlotClass::Grace);
            }
        }

        None
    }

    /// Records that `class` was granted to `user`, updating the relevant
    /// running count.
    pub fn record_open(&self, user: Cid, class: SlotClass) {
        match class {
            SlotClass::Standard | SlotClass::Mcn => {
                self.running.fetch_add(1, Ordering::AcqRel);
                *self.permanent_holders.entry(user).or_insert(0) += 1;
            }
            SlotClass::Small => {
                self.small.fetch_add(1, Ordering::AcqRel);
            }
            SlotClass::Extra => {
                self.extra.fetch_add(1, Ordering::AcqRel);
            }
            SlotClass::Partial => {
                self.partial.fetch_add(1, Ordering::AcqRel);
            }
            SlotClass::Grace => {}
        }
    }

    /// Records that a connection holding `class` for `user` closed.
    pub fn record_close(&self, user: Cid, class: SlotClass) {
        match class {
            SlotClass::Standard | SlotClass::Mcn => {
                self.running.fetch_sub(1, Ordering::AcqRel);
                if let Some(mut count) = self.permanent_holders.get_mut(&user) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        drop(count);
                        self.permanent_holders.remove(&user);
                    }
                }
            }
            SlotClass::Small => {
                self.small.fetch_sub(1, Ordering::AcqRel);
            }
            SlotClass::Extra => {
                self.extra.fetch_sub(1, Ordering::AcqRel);
            }
            SlotClass::Partial => {
                self.partial.fetch_sub(1, Ordering::AcqRel);
            }
            SlotClass::Grace => {}
        }
    }
}
