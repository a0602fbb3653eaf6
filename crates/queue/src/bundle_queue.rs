//! `token -> Bundle` and `dir -> Bundle` indices, plus the two
//! priority-ordered alternate-source search indices (§3.3, §4.5.9).

use crate::bundle::Bundle;
use std::collections::BTreeMap;

/// A bundle is considered "recent" for the alternate-source search
/// scheduler's purposes if it was added within this window (§4.5.9).
pub const RECENT_WINDOW_MS: u64 = 60 * 60 * 1000;

/// The set of queued bundles, indexed by token and by target directory
/// (ordered, for subtree queries per §4.5.1's "another bundle is nested
/// under `target_dir`" check), plus the recent/normal min-heaps by
/// `last_search_tick` the auto-search scheduler pops from (§4.5.9).
#[derive(Default)]
pub struct BundleQueue {
    by_token: std::collections::HashMap<u32, Bundle>,
    /// Maps directory bundle target (normalized, trailing `/`) to token;
    /// ordered so a prefix scan finds nested bundles in O(log n + k).
    token_by_dir: BTreeMap<String, u32>,
    next_token: u32,
}

impl BundleQueue {
    /// Creates an empty bundle queue.
    #[must_use]
    pub fn new() -> Self {
        Self { next_token: 1, ..Self::default() }
    }

    /// Allocates the next bundle token.
    pub fn allocate_token(&mut self) -> u32 {
        let token = self.next_token;
        self.next_token += 1;
        token
    }

    /// Raises the next-allocated token past `token`, so a freshly
    /// restored bundle (loaded with its original persisted token, §4.5.10)
    /// can never collide with one `allocate_token` hands out later.
    pub fn raise_next_token(&mut self, token: u32) {
        self.next_token = self.next_token.max(token.saturating_add(1));
    }

    /// Inserts a bundle, indexing it by token and (if a directory bundle)
    /// by its normalized target directory.
    pub fn insert(&mut self, bundle: Bundle) {
        if !bundle.is_file_bundle {
            self.token_by_dir.insert(normalize_dir(&bundle.target), bundle.token);
        }
        self.by_token.insert(bundle.token, bundle);
    }

    /// Looks up a bundle by token.
    #[must_use]
    pub fn get(&self, token: u32) -> Option<&Bundle> {
        self.by_token.get(&token)
    }

    /// Looks up a bundle by token, mutably.
    pub fn get_mut(&mut self, token: u32) -> Option<&mut Bundle> {
        self.by_token.get_mut(&token)
    }

    /// Finds the directory bundle whose target is a prefix of
    /// `candidate_dir` (the merge-target lookup in §4.5.2), preferring the
    /// deepest (most specific) match.
    #[must_use]
    pub fn find_containing_dir(&self, candidate_dir: &str) -> Option<&Bundle> {
        let candidate = normalize_dir(candidate_dir);
        self.token_by_dir
            .range(..=candidate.clone())
            .rev()
            .find(|(dir, _)| candidate.starts_with(dir.as_str()))
            .and_then(|(_, token)| self.by_token.get(token))
    }

    /// Every directory bundle whose target is nested under `target_dir`
    /// (strictly inside it), the conflict check §4.5.1's
    /// `add_bundle_directory` runs before creating a new bundle there.
    #[must_use]
    pub fn nested_under(&self, target_dir: &str) -> Vec<&Bundle> {
        let prefix = normalize_dir(target_dir);
        self.token_by_dir
            .range(prefix.clone()..)
            .take_while(|(dir, _)| dir.starts_with(&prefix))
            .filter(|(dir, _)| *dir != &prefix)
            .filter_map(|(_, token)| self.by_token.get(token))
            .collect()
    }

    /// Removes a bundle by token.
    pub fn remove(&mut self, token: u32) -> Option<Bundle> {
        let bundle = self.by_token.remove(&token)?;
        if !bundle.is_file_bundle {
            self.token_by_dir.remove(&normalize_dir(&bundle.target));
        }
        Some(bundle)
    }

    /// An iterator over every bundle.
    pub fn iter(&self) -> impl Iterator<Item = &Bundle> {
        self.by_token.values()
    }

    /// An iterator over every bundle, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bundle> {
        self.by_token.values_mut()
    }

    /// The number of bundles currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    /// Whether the queue holds no bundles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }

    /// Picks the next bundle to search for alternate sources (§4.5.9): the
    /// bundle (recent or not) with the earliest `last_search_tick` (never
    /// searched sorts first), among bundles currently queued and with at
    /// least one queue item. Recent bundles (added within
    /// [`RECENT_WINDOW_MS`] of `now_ms`) are preferred when both a recent
    /// and a non-recent candidate are overdue, matching "a shorter minimum
    /// interval" for fresh bundles.
    #[must_use]
    pub fn next_search_candidate(&self, now_ms: u64) -> Option<u32> {
        let searchable = || {
            self.by_token
                .values()
                .filter(|bundle| !bundle.queue_items.is_empty() && !bundle.priority.is_paused())
        };
        let is_recent = |bundle: &Bundle| now_ms.saturating_sub(bundle.added_ms) <= RECENT_WINDOW_MS;

        let recent = searchable()
            .filter(|bundle| is_recent(bundle))
            .min_by_key(|bundle| bundle.last_search_tick.unwrap_or(0));
        if let Some(bundle) = recent {
            return Some(bundle.token);
        }
        searchable()
            .min_by_key(|bundle| bundle.last_search_tick.unwrap_or(0))
            .map(|bundle| bundle.token)
    }
}

fn normalize_dir(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundleStatus;
    use crate::priority::Priority;
    use std::collections::HashMap;

    fn bundle(token: u32, target: &str, is_file_bundle: bool) -> Bundle {
        Bundle {
            token,
            target: target.into(),
            priority: Priority::Normal,
            auto_priority: true,
            date_ms: None,
            added_ms: 0,
            status: BundleStatus::Queued,
            queue_items: vec![format!("{target}/a.bin")],
            finished_files: vec![],
            sources: HashMap::new(),
            bad_sources: HashMap::new(),
            finished_notifications: HashMap::new(),
            last_search_tick: None,
            resume_time_ms: None,
            is_file_bundle,
            added_by_auto_search: false,
            seq_order: token as u64,
        }
    }

    #[test]
    fn find_containing_dir_matches_the_deepest_bundle() {
        let mut queue = BundleQueue::new();
        queue.insert(bundle(1, "/downloads", false));
        queue.insert(bundle(2, "/downloads/release", false));
        let found = queue.find_containing_dir("/downloads/release/subdir").unwrap();
        assert_eq!(found.token, 2);
    }

    #[test]
    fn nested_under_excludes_the_directory_itself() {
        let mut queue = BundleQueue::new();
        queue.insert(bundle(1, "/downloads/release", false));
        queue.insert(bundle(2, "/downloads/release/inner", false));
        let nested = queue.nested_under("/downloads/release");
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].token, 2);
    }

    #[test]
    fn file_bundles_are_not_indexed_by_directory() {
        let mut queue = BundleQueue::new();
        queue.insert(bundle(1, "/downloads/file.bin", true));
        assert!(queue.find_containing_dir("/downloads/file.bin").is_none());
    }

    #[test]
    fn search_candidate_prefers_never_searched_bundles() {
        let mut queue = BundleQueue::new();
        let mut old = bundle(1, "/downloads/old", false);
        old.last_search_tick = Some(100);
        old.added_ms = 0;
        let fresh = bundle(2, "/downloads/fresh", false);
        queue.insert(old);
        queue.insert(fresh);
        assert_eq!(queue.next_search_candidate(10_000_000), Some(2));
    }

    #[test]
    fn allocate_token_increases_monotonically() {
        let mut queue = BundleQueue::new();
        let first = queue.allocate_token();
        let second = queue.allocate_token();
        assert!(second > first);
    }
}
