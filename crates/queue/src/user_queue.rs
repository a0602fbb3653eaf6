//! `CID -> files`, partitioned by [`Priority`] with a per-user rotation
//! cursor, so segment selection (§4.5.4) can scan a user's queue from
//! highest to lowest priority and round-robin fairly across that user's
//! bundles at the same priority.

use crate::priority::Priority;
use identity::Cid;
use std::collections::{HashMap, VecDeque};

/// Per-user, per-priority ordered queues of target paths a user is a
/// source for.
#[derive(Default)]
pub struct UserQueue {
    queues: HashMap<Cid, HashMap<Priority, VecDeque<String>>>,
}

impl UserQueue {
    /// Creates an empty user queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers that `user` is a source for the file at `path`, at
    /// `priority`, appending it to the back of that priority's queue.
    pub fn add(&mut self, user: Cid, priority: Priority, path: impl Into<String>) {
        let path = path.into();
        let by_priority = self.queues.entry(user).or_default();
        let queue = by_priority.entry(priority).or_default();
        if !queue.contains(&path) {
            queue.push_back(path);
        }
    }

    /// Removes `path` from every priority bucket for `user` (used when a
    /// source is dropped from a file, or the file's priority changes and
    /// it needs to move buckets).
    pub fn remove(&mut self, user: Cid, path: &str) {
        if let Some(by_priority) = self.queues.get_mut(&user) {
            for queue in by_priority.values_mut() {
                queue.retain(|existing| existing != path);
            }
        }
    }

    /// Moves `path` from its current bucket (if any) to `new_priority`,
    /// landing at the back of the new bucket - used when a file's
    /// priority changes (manual or auto, §4.5.8).
    pub fn reprioritize(&mut self, user: Cid, path: &str, new_priority: Priority) {
        self.remove(user, path);
        self.add(user, new_priority, path.to_string());
    }

    /// Scans `user`'s queue from [`Priority::Highest`] down to
    /// [`Priority::Lowest`] (§4.5.4 step: "scans that user's queue from
    /// highest to lowest priority"), returning `(priority, path)` pairs in
    /// scan order. Each priority bucket is rotated one step (its front
    /// element moves to the back) as it's read, so repeated calls
    /// round-robin across that user's bundles at the same priority
    /// instead of always favoring the first file added.
    pub fn rotate_and_scan(&mut self, user: Cid) -> Vec<(Priority, String)> {
        let Some(by_priority) = self.queues.get_mut(&user) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for priority in Priority::active_levels_high_to_low() {
            if let Some(queue) = by_priority.get_mut(&priority) {
                out.extend(queue.iter().cloned().map(|path| (priority, path)));
                if let Some(front) = queue.pop_front() {
                    queue.push_back(front);
                }
            }
        }
        out
    }

    /// Whether `user` has any queued file at all.
    #[must_use]
    pub fn has_any(&self, user: Cid) -> bool {
        self.queues
            .get(&user)
            .is_some_and(|by_priority| by_priority.values().any(|queue| !queue.is_empty()))
    }

    /// Drops the entire per-user entry, e.g. when a user is removed as a
    /// source from every file at once.
    pub fn drop_user(&mut self, user: Cid) {
        self.queues.remove(&user);
    }
}
