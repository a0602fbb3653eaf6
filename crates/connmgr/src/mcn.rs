//! Multi-channel (MCN1) per-user connection accounting (§4.4).
//!
//! A peer advertising `MCN1` may carry several simultaneous downloads or
//! uploads to/from us over distinct C-C connections, all sharing the same
//! CID. The tracker here answers "may we open one more?" by comparing a
//! user's current count against the other tracked users' counts and a
//! configured per-user ceiling, per the Open Question resolved in
//! `DESIGN.md` (per-user cap takes precedence over the free-slot check).

use dashmap::DashMap;
use identity::cid::Cid;

/// Which direction an MCN sub-connection accounting applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// A connection on which we are downloading from the user.
    Download,
    /// A connection on which we are uploading to the user.
    Upload,
}

/// Tracks `multi_uploads: User → count` and `multi_downloads: User → count`
/// and decides whether a new MCN sub-connection for a user may be opened.
#[derive(Default)]
pub struct McnTracker {
    downloads: DashMap<Cid, u32>,
    uploads: DashMap<Cid, u32>,
    per_user_ceiling: u32,
}

impl McnTracker {
    /// Creates a tracker with `per_user_ceiling` as the maximum concurrent
    /// MCN sub-connections (of either direction) a single user may hold.
    #[must_use]
    pub fn new(per_user_ceiling: u32) -> Self {
        Self { downloads: DashMap::new(), uploads: DashMap::new(), per_user_ceiling }
    }

    fn map(&self, direction: Direction) -> &DashMap<Cid, u32> {
        match direction {
            Direction::Download => &self.downloads,
            Direction::Upload => &self.uploads,
        }
    }

    /// The user's current connection count in `direction`.
    #[must_use]
    pub fn count(&self, user: Cid, direction: Direction) -> u32 {
        self.map(direction).get(&user).map_or(0, |count| *count)
    }

    /// Whether a new sub-connection for `user` in `direction` may be
    /// opened right now: the user isn't already at the per-user ceiling,
    /// and their count is no greater than the maximum held by any other
    /// tracked user in that direction (§4.3's fairness rule).
    #[must_use]
    pub fn may_open(&self, user: Cid, direction: Direction) -> bool {
        let current = self.count(user, direction);
        if current >= self.per_user_ceiling {
            return false;
        }
        let max_other = self
            .map(direction)
            .iter()
            .filter(|entry| *entry.key() != user)
            .map(|entry| *entry.value())
            .max()
            .unwrap_or(0);
        current <= max_other || max_other == 0
    }

    /// Records that a new sub-connection for `user` in `direction` was
    /// opened.
    pub fn record_open(&self, user: Cid, direction: Direction) {
        *self.map(direction).entry(user).or_insert(0) += 1;
    }

    /// Records that a sub-connection for `user` in `direction` closed,
    /// removing the entry entirely once it reaches zero.
    pub fn record_close(&self, user: Cid, direction: Direction) {
        let map = self.map(direction);
        if let Some(mut count) = map.get_mut(&user) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                drop(count);
                map.remove(&user);
            }
        }
    }

    /// The user currently holding the most connections in `direction`,
    /// used by the upload engine's slot-rebalance pass (§4.6.2) to pick a
    /// disconnect victim. Never returns a user sitting at a single slot,
    /// since a user is never disconnected below their first MCN slot.
    #[must_use]
    pub fn highest_concurrency_user(&self, direction: Direction) -> Option<(Cid, u32)> {
        self.map(direction)
            .iter()
            .filter(|entry| *entry.value() > 1)
            .map(|entry| (*entry.key(), *entry.value()))
            .max_by_key(|&(_, count)| count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use identity::cid::synthetic_nmdc_cid;

    fn cid(seed: &str) -> Cid {
        synthetic_nmdc_cid(seed, "dchub://hub.example")
    }

    #[test]
    fn first_connection_is_always_allowed() {
        let tracker = McnTracker::new(3);
        assert!(tracker.may_open(cid("alice"), Direction::Download));
    }

    #[test]
    fn per_user_ceiling_is_enforced() {
        let tracker = McnTracker::new(2);
        let user = cid("alice");
        tracker.record_open(user, Direction::Download);
        tracker.record_open(user, Direction::Download);
        assert!(!tracker.may_open(user, Direction::Download));
    }

    #[test]
    fn fairness_rule_blocks_a_user_from_outpacing_others() {
        let tracker = McnTracker::new(10);
        let alice = cid("alice");
        let bob = cid("bob");
        tracker.record_open(alice, Direction::Download);
        assert!(!tracker.may_open(alice, Direction::Download));
        assert!(tracker.may_open(bob, Direction::Download));
    }

    #[test]
    fn closing_a_connection_frees_a_slot() {
        let tracker = McnTracker::new(5);
        let user = cid("alice");
        tracker.record_open(user, Direction::Upload);
        tracker.record_open(user, Direction::Upload);
        tracker.record_close(user, Direction::Upload);
        assert_eq!(tracker.count(user, Direction::Upload), 1);
    }

    #[test]
    fn highest_concurrency_user_ignores_single_slot_holders() {
        let tracker = McnTracker::new(10);
        let alice = cid("alice");
        let bob = cid("bob");
        tracker.record_open(alice, Direction::Download);
        tracker.record_open(bob, Direction::Download);
        tracker.record_open(bob, Direction::Download);
        tracker.record_open(bob, Direction::Download);
        assert_eq!(tracker.highest_concurrency_user(Direction::Download), Some((bob, 3)));
    }

    #[test]
    fn directions_are_tracked_independently() {
        let tracker = McnTracker::new(5);
        let user = cid("alice");
        tracker.record_open(user, Direction::Download);
        assert_eq!(tracker.count(user, Direction::Upload), 0);
    }
}
