//! Reading and writing `bundles/<token>.xml` records (§4.5.10).

use crate::record::BundleRecord;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A bundle store rooted at one directory, one file per bundle token.
#[derive(Clone, Debug)]
pub struct BundleStore {
    dir: PathBuf,
}

/// A failure writing or reading the bundle store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying filesystem operation failed.
    #[error("bundle store I/O error: {0}")]
    Io(#[from] io::Error),
    /// A record's XML was malformed.
    #[error("malformed bundle record in {path}: {source}")]
    Xml {
        /// The file the malformed record came from.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: quick_xml::DeError,
    },
}

impl BundleStore {
    /// Opens (without yet creating) a bundle store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, token: u32) -> PathBuf {
        self.dir.join(format!("{token}.xml"))
    }

    /// Serializes `record` to `bundles/<token>.xml`, creating the store
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory can't be created or the
    /// file can't be written.
    pub fn save(&self, record: &BundleRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let xml = quick_xml::se::to_string(record)
            .map_err(|source| StoreError::Xml { path: self.path_for(record.token), source })?;
        let mut document = String::with_capacity(xml.len() + 64);
        document.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        document.push_str(&xml);
        document.push('\n');
        fs::write(self.path_for(record.token), document)?;
        Ok(())
    }

    /// Deletes the on-disk record for `token`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] for any failure other than the file
    /// already being absent.
    pub fn remove(&self, token: u32) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(token)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    /// Loads every `*.xml` record in the store directory in parallel
    /// (§4.5.10: "Loading is parallel over all bundle files").
    ///
    /// Duplicate tokens are resolved by discarding the later file (by
    /// directory iteration order) and logging a line, rather than failing
    /// the whole load. A record whose XML fails to parse is skipped and
    /// logged the same way, since one corrupt bundle file shouldn't block
    /// every other bundle from loading.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] only if the store directory exists but
    /// can't be read; a missing directory yields an empty result.
    pub fn load_all(&self) -> Result<Vec<BundleRecord>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        let paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "xml"))
            .collect();

        let parsed: Vec<(PathBuf, BundleRecord)> = paths
            .par_iter()
            .filter_map(|path| match fs::read_to_string(path) {
                Ok(text) => match quick_xml::de::from_str::<BundleRecord>(&text) {
                    Ok(record) => Some((path.clone(), record)),
                    Err(error) => {
                        logging::info_log(
                            |f| f.queue > 0,
                            || format!("skipping malformed bundle record {}: {error}", path.display()),
                        );
                        None
                    }
                },
                Err(error) => {
                    logging::info_log(
                        |f| f.queue > 0,
                        || format!("skipping unreadable bundle record {}: {error}", path.display()),
                    );
                    None
                }
            })
            .collect();

        let mut by_token: HashMap<u32, (PathBuf, BundleRecord)> = HashMap::new();
        for (path, record) in parsed {
            match by_token.entry(record.token) {
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert((path, record));
                }
                std::collections::hash_map::Entry::Occupied(mut slot) => {
                    logging::info_log(
                        |f| f.queue > 0,
                        || {
                            format!(
                                "duplicate bundle token {} in {} and {}, discarding the latter",
                                record.token,
                                slot.get().0.display(),
                                path.display()
                            )
                        },
                    );
                    // Keep whichever sorts first by path, matching a stable
                    // "first file wins" rule independent of iteration order.
                    if path < slot.get().0 {
                        slot.insert((path, record));
                    }
                }
            }
        }

        Ok(by_token.into_values().map(|(_, record)| record).collect())
    }

    /// The store's root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
