#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `filters` is the skiplist name-pattern matcher (§3.2 glossary,
//! §4.5.1): a user-configured set of glob patterns that suppresses
//! queueing a file by name (e.g. `*.torrent`, `Thumbs.db`) unless its
//! source explicitly requested it with `PRIVATE` (e.g. a direct file
//! list pull).
//!
//! # Design
//!
//! A [`Skiplist`] is a compiled [`globset::GlobSet`] built once from the
//! user's pattern strings and matched against a bare filename (not a
//! full path - the spec's skiplist, unlike a general include/exclude
//! filter chain, only ever inspects the file's own name). Matching is
//! case-insensitive, since the Windows-heritage clients this protocol
//! targets treat filenames that way.
//!
//! # Invariants
//!
//! - [`Skiplist::is_skipped`] is pure and side-effect free; callers
//!   decide what "skipped" means (reject the add, or only reject when
//!   the request didn't carry `PRIVATE`, §4.5.1 step 1).
//! - An empty pattern list matches nothing.
//!
//! # Examples
//!
//! ```
//! use filters::Skiplist;
//!
//! let skiplist = Skiplist::new(["*.torrent", "thumbs.db"]).unwrap();
//! assert!(skiplist.is_skipped("leech.torrent"));
//! assert!(skiplist.is_skipped("Thumbs.db"));
//! assert!(!skiplist.is_skipped("movie.mkv"));
//! ```
//!
//! # See also
//!
//! - [`queue`](../queue/index.html), the only consumer: checks the
//!   skiplist during `add_file`/`add_bundle_directory` target
//!   validation.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// A failure compiling one of the skiplist's glob patterns.
#[derive(Debug, thiserror::Error)]
#[error("invalid skiplist pattern {pattern:?}: {source}")]
pub struct SkiplistError {
    /// The pattern that failed to compile.
    pub pattern: String,
    /// The underlying `globset` parse error.
    #[source]
    pub source: globset::Error,
}

/// A compiled, case-insensitive set of skiplist glob patterns.
#[derive(Clone, Debug)]
pub struct Skiplist {
    set: GlobSet,
}

impl Skiplist {
    /// Compiles `patterns` into a [`Skiplist`].
    ///
    /// # Errors
    ///
    /// Returns [`SkiplistError`] for the first pattern that fails to
    /// parse as a glob.
    pub fn new<I, S>(patterns: I) -> Result<Self, SkiplistError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(&pattern.to_ascii_lowercase()).map_err(|source| SkiplistError {
                pattern: pattern.to_owned(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| SkiplistError {
            pattern: String::new(),
            source,
        })?;
        Ok(Self { set })
    }

    /// An empty skiplist, matching nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { set: GlobSet::empty() }
    }

    /// Returns whether `name` matches any pattern in this skiplist.
    ///
    /// `name` should be a bare filename, not a full path; directory
    /// components are not inspected (§4.5.1 validates the leaf name the
    /// request asked to create).
    #[must_use]
    pub fn is_skipped(&self, name: &str) -> bool {
        self.set.is_match(Path::new(&name.to_ascii_lowercase()))
    }
}

impl Default for Skiplist {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_extension_patterns_case_insensitively() {
        let skiplist = Skiplist::new(["*.torrent"]).unwrap();
        assert!(skiplist.is_skipped("leech.torrent"));
        assert!(skiplist.is_skipped("LEECH.TORRENT"));
        assert!(!skiplist.is_skipped("movie.mkv"));
    }

    #[test]
    fn matches_exact_names() {
        let skiplist = Skiplist::new(["thumbs.db", "desktop.ini"]).unwrap();
        assert!(skiplist.is_skipped("Thumbs.db"));
        assert!(skiplist.is_skipped("Desktop.ini"));
        assert!(!skiplist.is_skipped("Thumbs.db.bak"));
    }

    #[test]
    fn empty_skiplist_matches_nothing() {
        let skiplist = Skiplist::empty();
        assert!(!skiplist.is_skipped("anything"));
        assert_eq!(Skiplist::default().is_skipped("anything"), false);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let error = Skiplist::new(["["]).unwrap_err();
        assert_eq!(error.pattern, "[");
    }
}
