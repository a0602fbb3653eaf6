//! One-time import of the legacy monolithic `Queue.xml` (§4.5.10, §6.4).
//!
//! Older installs kept every bundle in one file, each directory bundle
//! represented as a `<Bundle>` containing `<Download>` children exactly
//! like the per-bundle records this crate now writes - split-file storage
//! changed the *layout*, not the per-record schema. So import is just:
//! parse the monolithic file as a list of [`BundleRecord`]s, return them
//! for the caller to persist individually, then delete the old file.

use crate::record::BundleRecord;
use crate::store::StoreError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename = "Queue")]
struct LegacyQueue {
    #[serde(rename = "Bundle", default)]
    bundles: Vec<BundleRecord>,
}

/// Imports a legacy monolithic `Queue.xml` at `path`, returning the bundles
/// it contained without touching the per-bundle store. The caller is
/// expected to [`crate::store::BundleStore::save`] each one and then call
/// [`delete`] once the import has been durably persisted.
///
/// Returns `Ok(Vec::new())` if `path` doesn't exist - there is nothing to
/// import on a fresh install.
///
/// # Errors
///
/// Returns [`StoreError::Xml`] if the file exists but fails to parse.
pub fn import(path: &Path) -> Result<Vec<BundleRecord>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error.into()),
    };
    let legacy: LegacyQueue = quick_xml::de::from_str(&text)
        .map_err(|source| StoreError::Xml { path: path.to_path_buf(), source })?;
    Ok(legacy.bundles)
}

/// Deletes the legacy `Queue.xml` after a successful [`import`].
///
/// # Errors
///
/// Returns [`StoreError::Io`] for any failure other than the file already
/// being absent.
pub fn delete(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error.into()),
    }
}
