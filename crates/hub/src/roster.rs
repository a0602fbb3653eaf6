//! The live user roster a single hub session keeps while connected (§3.2,
//! §4.2).
//!
//! [`Identity`] and [`OnlineUser`] aren't `Clone` (a live identity owns its
//! field map), so the roster holds them directly and hands out borrows
//! rather than snapshot copies. A hub session is driven from a single task
//! (§5), so a plain [`HashMap`] behind `&mut self` is enough - no
//! `DashMap`/lock is needed the way the cross-task [`identity::Registry`]
//! needs one.

use identity::{Cid, Identity, OnlineUser, Sid};
use std::collections::HashMap;

/// The ADC roster: users keyed by the [`Sid`] the hub assigned them.
#[derive(Default)]
pub struct AdcRoster {
    by_sid: HashMap<Sid, OnlineUser>,
}

impl AdcRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `sid`, returning the previous
    /// occupant if one existed (a `BINF` from a SID we already track is an
    /// update, not a new user).
    pub fn insert(&mut self, sid: Sid, user: OnlineUser) -> Option<OnlineUser> {
        self.by_sid.insert(sid, user)
    }

    /// Borrows the user at `sid`.
    #[must_use]
    pub fn get(&self, sid: Sid) -> Option<&OnlineUser> {
        self.by_sid.get(&sid)
    }

    /// Mutably borrows the user at `sid`, for applying an incremental
    /// `BINF` field update in place.
    pub fn get_mut(&mut self, sid: Sid) -> Option<&mut OnlineUser> {
        self.by_sid.get_mut(&sid)
    }

    /// Removes the user at `sid` (an `IQUI`), returning it if present.
    pub fn remove(&mut self, sid: Sid) -> Option<OnlineUser> {
        self.by_sid.remove(&sid)
    }

    /// Finds a user by CID, since `connect_to_user` and private messages
    /// are addressed by CID rather than the session-local SID.
    #[must_use]
    pub fn find_by_cid(&self, cid: Cid) -> Option<(Sid, &OnlineUser)> {
        self.by_sid.iter().find(|(_, user)| user.identity().user().cid() == cid).map(|(sid, user)| (*sid, user))
    }

    /// The number of users currently on the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_sid.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_sid.is_empty()
    }

    /// Every SID currently on the roster, for diagnostics and tests.
    pub fn sids(&self) -> impl Iterator<Item = Sid> + '_ {
        self.by_sid.keys().copied()
    }
}

/// The NMDC roster: users keyed by nick, since NMDC has no SID concept
/// (§4.2.3). Each entry's [`Identity`] carries the [`crate::sid`]-less
/// synthetic CID `identity::cid::synthetic_nmdc_cid` derives from the nick
/// and hub URL, so downstream code (queue, upload, connmgr) can still
/// address NMDC peers uniformly by CID.
#[derive(Default)]
pub struct NmdcRoster {
    by_nick: HashMap<String, OnlineUser>,
}

impl NmdcRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `nick`.
    pub fn insert(&mut self, nick: String, user: OnlineUser) -> Option<OnlineUser> {
        self.by_nick.insert(nick, user)
    }

    /// Borrows the user known as `nick`.
    #[must_use]
    pub fn get(&self, nick: &str) -> Option<&OnlineUser> {
        self.by_nick.get(nick)
    }

    /// Mutably borrows the user known as `nick`.
    pub fn get_mut(&mut self, nick: &str) -> Option<&mut OnlineUser> {
        self.by_nick.get_mut(nick)
    }

    /// Removes the user known as `nick` (a `$Quit`).
    pub fn remove(&mut self, nick: &str) -> Option<OnlineUser> {
        self.by_nick.remove(nick)
    }

    /// Finds a user by their synthetic CID.
    #[must_use]
    pub fn find_by_cid(&self, cid: Cid) -> Option<(&str, &OnlineUser)> {
        self.by_nick.iter().find(|(_, user)| user.identity().user().cid() == cid).map(|(nick, user)| (nick.as_str(), user))
    }

    /// The number of users currently on the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_nick.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_nick.is_empty()
    }
}
