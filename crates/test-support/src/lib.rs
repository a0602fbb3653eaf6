#![deny(unsafe_code)]

//! Shared helpers for the DC engine workspace's tests: temp-directory
//! fixtures, deterministic clocks, and synthetic TTH/CID values so each
//! crate's test module doesn't hand-roll the same boilerplate.

use core::clock::FakeClock;
use std::sync::Arc;

/// A temp directory whose path is reused across several test assertions,
/// dropped (and removed) at the end of the test.
pub struct TempWorkspace {
    dir: tempfile::TempDir,
}

impl TempWorkspace {
    /// Creates a new temp directory.
    ///
    /// # Panics
    ///
    /// Panics if the temp directory could not be created; acceptable for
    /// test-only helper code.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp workspace"),
        }
    }

    /// The workspace root path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Joins a relative path under the workspace root.
    #[must_use]
    pub fn join(&self, rel: impl AsRef<std::path::Path>) -> std::path::PathBuf {
        self.dir.path().join(rel)
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a shared [`FakeClock`] for tests that need to advance time across
/// several collaborating objects (e.g. a download queue and its connection
/// manager) without drifting relative to each other.
#[must_use]
pub fn shared_fake_clock() -> Arc<FakeClock> {
    Arc::new(FakeClock::new())
}

/// Deterministic, distinguishable fake TTH/CID-shaped byte arrays for tests
/// that need many distinct 192-bit identifiers without caring about their
/// hash provenance. `seed` selects the fill byte.
#[must_use]
pub fn fake_192(seed: u8) -> [u8; 24] {
    [seed; 24]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_192_is_distinguishable_by_seed() {
        assert_ne!(fake_192(1), fake_192(2));
    }

    #[test]
    fn temp_workspace_join_is_under_root() {
        let ws = TempWorkspace::new();
        let joined = ws.join("a/b.txt");
        assert!(joined.starts_with(ws.path()));
    }
}
