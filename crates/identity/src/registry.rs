//! The process-wide user registry (§3.2, §3.5): `CID -> User`, plus the
//! offline-nick cache that keeps names usable for favorites and queue
//! display after a user disconnects.

use crate::cid::Cid;
use crate::user::User;
use core::Clock;
use dashmap::DashMap;
use std::sync::Arc;

/// `CID -> {nick, hub_url, last_seen}`, kept around after a [`User`]'s last
/// online presence disappears so favorites and the download queue can
/// still show a name instead of a bare CID (§3.2).
#[derive(Clone, Debug)]
pub struct OfflineUser {
    /// The last nick this CID was seen under.
    pub nick: String,
    /// The hub URL the last sighting was on.
    pub hub_url: String,
    /// Clock milliseconds at last sighting.
    pub last_seen_ms: u64,
}

/// The process-wide `CID -> User` map (§3.2), with a periodic sweep that
/// drops entries nobody but the map itself still references.
///
/// A [`User`] is never destroyed while any queue source, favorite, active
/// transfer, or online-user entry holds an [`Arc`] to it (§3.5) - those
/// holders keep the strong count above the registry's own one reference.
/// The sweep only reclaims entries that have fallen back to strong count 1
/// (the map's own `Arc`) *and* have been idle for at least
/// [`Registry::GC_IDLE_MS`], so a user who blips offline and back doesn't
/// lose their `User` (and with it, queue bookkeeping keyed by CID) to an
/// unlucky sweep timing.
pub struct Registry<C: Clock> {
    users: DashMap<Cid, Arc<User>>,
    last_touched_ms: DashMap<Cid, u64>,
    offline: DashMap<Cid, OfflineUser>,
    clock: Arc<C>,
}

impl<C: Clock> Registry<C> {
    /// Minimum idle time before a zero-external-reference [`User`] is
    /// eligible for collection, per §3.5 ("no older than ~10 min").
    pub const GC_IDLE_MS: u64 = 10 * 60 * 1000;

    /// Creates an empty registry driven by `clock`.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            users: DashMap::new(),
            last_touched_ms: DashMap::new(),
            offline: DashMap::new(),
            clock,
        }
    }

    /// Returns the existing [`User`] for `cid`, or creates and inserts a
    /// new offline one.
    pub fn get_or_create(&self, cid: Cid) -> Arc<User> {
        self.last_touched_ms
            .insert(cid, self.clock.now_ms());
        self.users
            .entry(cid)
            .or_insert_with(|| Arc::new(User::new(cid)))
            .clone()
    }

    /// Returns the existing [`User`] for `cid` without creating one.
    #[must_use]
    pub fn get(&self, cid: Cid) -> Option<Arc<User>> {
        self.users.get(&cid).map(|entry| entry.clone())
    }

    /// Records that `cid` was last seen as `nick` on `hub_url`, for the
    /// offline-display cache.
    pub fn remember_offline(&self, cid: Cid, nick: impl Into<String>, hub_url: impl Into<String>) {
        self.offline.insert(
            cid,
            OfflineUser {
                nick: nick.into(),
                hub_url: hub_url.into(),
                last_seen_ms: self.clock.now_ms(),
            },
        );
    }

    /// Looks up the last-known nick/hub for a CID that isn't currently
    /// online.
    #[must_use]
    pub fn offline_info(&self, cid: Cid) -> Option<OfflineUser> {
        self.offline.get(&cid).map(|entry| entry.clone())
    }

    /// Sweeps the registry, dropping any [`User`] whose only remaining
    /// strong reference is the map's own and which has been idle at least
    /// [`Self::GC_IDLE_MS`].
    ///
    /// Returns the number of entries collected.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_ms();
        let mut to_remove = Vec::new();
        for entry in &self.users {
            let cid = *entry.key();
            let idle = self
                .last_touched_ms
                .get(&cid)
                .map_or(u64::MAX, |touched| now.saturating_sub(*touched));
            if Arc::strong_count(entry.value()) == 1 && idle >= Self::GC_IDLE_MS {
                to_remove.push(cid);
            }
        }
        for cid in &to_remove {
            self.users.remove(cid);
            self.last_touched_ms.remove(cid);
        }
        to_remove.len()
    }

    /// The number of users currently tracked (online or merely referenced).
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the registry holds no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checksums::tth::hash_leaf;
    use core::clock::FakeClock;

    #[test]
    fn get_or_create_returns_the_same_arc_on_repeat_lookup() {
        let registry = Registry::new(Arc::new(FakeClock::new()));
        let cid = hash_leaf(b"x");
        let first = registry.get_or_create(cid);
        let second = registry.get_or_create(cid);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn sweep_keeps_externally_held_users() {
        let clock = Arc::new(FakeClock::new());
        let registry = Registry::new(clock.clone());
        let cid = hash_leaf(b"held");
        let held = registry.get_or_create(cid);
        clock.advance(Registry::<FakeClock>::GC_IDLE_MS + 1);
        assert_eq!(registry.sweep(), 0);
        drop(held);
    }

    #[test]
    fn sweep_collects_idle_unreferenced_users() {
        let clock = Arc::new(FakeClock::new());
        let registry = Registry::new(clock.clone());
        let cid = hash_leaf(b"unreferenced");
        drop(registry.get_or_create(cid));
        assert_eq!(registry.sweep(), 0, "too recent to collect");
        clock.advance(Registry::<FakeClock>::GC_IDLE_MS + 1);
        assert_eq!(registry.sweep(), 1);
        assert!(registry.get(cid).is_none());
    }

    #[test]
    fn offline_cache_round_trips() {
        let registry = Registry::new(Arc::new(FakeClock::new()));
        let cid = hash_leaf(b"y");
        registry.remember_offline(cid, "alice", "dchub://hub.example:411");
        let info = registry.offline_info(cid).unwrap();
        assert_eq!(info.nick, "alice");
        assert_eq!(info.hub_url, "dchub://hub.example:411");
    }
}
