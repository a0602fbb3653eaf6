//! The process-wide [`User`] entity (§3.2, §3.5): one per CID, shared by
//! every hub session, queue source, and active transfer that refers to the
//! same person.

use crate::cid::Cid;
use crate::flags::UserFlags;
use std::sync::atomic::{AtomicU64, AtomicU16, Ordering};

/// A user, keyed by [`Cid`].
///
/// `User` knows nothing about which hub(s) it currently appears in -
/// per-hub presence is [`crate::OnlineUser`]'s job - which breaks the
/// `User -> Hub -> OnlineUser -> User` reference cycle the reference
/// implementation has (§9): a `User` is shared-owned by every holder
/// (queue source, online roster entry, favorite-list entry, active
/// transfer) and outlives any single one of them.
#[derive(Debug)]
pub struct User {
    cid: Cid,
    flags: AtomicU16,
    bytes_queued_from_me: AtomicU64,
}

impl User {
    /// Creates a new user record, offline and with no flags set.
    #[must_use]
    pub fn new(cid: Cid) -> Self {
        Self {
            cid,
            flags: AtomicU16::new(0),
            bytes_queued_from_me: AtomicU64::new(0),
        }
    }

    /// The user's stable identity.
    #[must_use]
    pub const fn cid(&self) -> Cid {
        self.cid
    }

    /// The current flag set.
    #[must_use]
    pub fn flags(&self) -> UserFlags {
        UserFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    /// Sets `flags` to exactly `value`, replacing any previous set.
    pub fn set_flags(&self, value: UserFlags) {
        self.flags.store(value.bits(), Ordering::Release);
    }

    /// Ors `flags` into the current set.
    pub fn insert_flags(&self, flags: UserFlags) {
        self.flags.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    /// Clears `flags` from the current set.
    pub fn remove_flags(&self, flags: UserFlags) {
        self.flags.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    /// Whether `flags` is fully contained in the current set.
    #[must_use]
    pub fn has_flags(&self, flags: UserFlags) -> bool {
        self.flags().contains(flags)
    }

    /// Bytes this local client currently has queued to upload to this user
    /// (across every file they source), used to favor lighter-loaded
    /// sources when the queue balances segment assignment.
    #[must_use]
    pub fn bytes_queued_from_me(&self) -> u64 {
        self.bytes_queued_from_me.load(Ordering::Relaxed)
    }

    /// Adds (or, with a negative delta via wrapping, removes) from the
    /// queued-bytes counter.
    pub fn add_bytes_queued_from_me(&self, delta: i64) {
        if delta >= 0 {
            self.bytes_queued_from_me
                .fetch_add(delta as u64, Ordering::Relaxed);
        } else {
            self.bytes_queued_from_me
                .fetch_sub(delta.unsigned_abs(), Ordering::Relaxed);
        }
    }
}
