//! `path -> QueueFile`, `token -> QueueFile`, and `tth -> [QueueFile]`
//! indices over the set of queued files (§3.3).

use crate::file::QueueFile;
use checksums::tth::Tth;
use std::collections::HashMap;

/// The full set of queued files, indexed three ways for the lookups the
/// engine needs: by target path (the primary key), by request token (for
/// filelist/match-queue correlation), and by TTH (to find every queued
/// copy of the same content under different paths, §3.3).
#[derive(Default)]
pub struct FileQueue {
    by_path: HashMap<String, QueueFile>,
    path_by_token: HashMap<u32, String>,
    paths_by_tth: HashMap<Tth, Vec<String>>,
}

impl FileQueue {
    /// Creates an empty file queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a file under its target path, maintaining the
    /// token and TTH indices.
    pub fn insert(&mut self, file: QueueFile) {
        let path = file.target_path.clone();
        if let Some(token) = file.request_token {
            self.path_by_token.insert(token, path.clone());
        }
        self.paths_by_tth.entry(file.tth).or_default().push(path.clone());
        self.by_path.insert(path, file);
    }

    /// Looks up a file by its target path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&QueueFile> {
        self.by_path.get(path)
    }

    /// Looks up a file by its target path, mutably.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut QueueFile> {
        self.by_path.get_mut(path)
    }

    /// Looks up a file by its request token.
    #[must_use]
    pub fn get_by_token(&self, token: u32) -> Option<&QueueFile> {
        self.path_by_token.get(&token).and_then(|path| self.by_path.get(path))
    }

    /// Every currently queued file (good or bad) sharing `tth`, for
    /// duplicate-TTH disambiguation (§3.3, §4.5.1 step 2).
    #[must_use]
    pub fn by_tth(&self, tth: Tth) -> Vec<&QueueFile> {
        self.paths_by_tth
            .get(&tth)
            .into_iter()
            .flatten()
            .filter_map(|path| self.by_path.get(path))
            .collect()
    }

    /// Removes the file at `path`, dropping it from every index.
    pub fn remove(&mut self, path: &str) -> Option<QueueFile> {
        let file = self.by_path.remove(path)?;
        if let Some(token) = file.request_token {
            self.path_by_token.remove(&token);
        }
        if let Some(paths) = self.paths_by_tth.get_mut(&file.tth) {
            paths.retain(|p| p != path);
            if paths.is_empty() {
                self.paths_by_tth.remove(&file.tth);
            }
        }
        Some(file)
    }

    /// Whether a file already exists at `path`.
    #[must_use]
    pub fn contains_path(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// An iterator over every queued file.
    pub fn iter(&self) -> impl Iterator<Item = &QueueFile> {
        self.by_path.values()
    }

    /// An iterator over every queued file, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut QueueFile> {
        self.by_path.values_mut()
    }

    /// The number of queued files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Whether the queue holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}
