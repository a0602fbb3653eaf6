//! The queue engine's error taxonomy (§7): input-validation rejections a
//! caller sees directly, distinct from hook rejections which carry their
//! own structured shape.

use hooks::Rejection;

/// Why `add_file`/`add_bundle_directory` rejected a file (§4.5.1).
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum FileError {
    /// The target path was empty.
    #[error("target path is empty")]
    EmptyTarget,
    /// The target path attempted to escape its intended directory (`..`
    /// components).
    #[error("target path {0:?} contains a path-traversal component")]
    PathTraversal(String),
    /// The file name matched the user's skiplist and the request did not
    /// carry `PRIVATE`.
    #[error("file name {0:?} matched the skiplist")]
    Skiplisted(String),
    /// The same target path is already queued with a different size.
    #[error("target {target:?} already queued with size {existing}, got {requested}")]
    SizeMismatch {
        /// The conflicting target path.
        target: String,
        /// The size already on record.
        existing: i64,
        /// The size the new request carried.
        requested: i64,
    },
    /// The same target path is already queued with a different TTH.
    #[error("target {target:?} already queued with a different TTH")]
    TthMismatch {
        /// The conflicting target path.
        target: String,
    },
    /// A file already exists on disk at the target path.
    #[error("target file {0:?} already exists on disk")]
    TargetFileExists(String),
    /// Creating a directory bundle at `target_dir` would nest it under,
    /// or nest an existing bundle under, another directory bundle
    /// (§4.5.2).
    #[error("{target_dir:?} would conflict with bundle at {conflicting_target:?}")]
    NestedBundleConflict {
        /// The directory the caller tried to queue.
        target_dir: String,
        /// The existing bundle's target it conflicts with.
        conflicting_target: String,
    },
    /// The target path is already queued at a file-bundle boundary that
    /// does not accept merges (§3.3: "File bundles never merge").
    #[error("target {0:?} belongs to a file bundle, which cannot merge")]
    FileBundleCannotMerge(String),
    /// A `bundle_file_validation`/`bundle_validation`/`bundle_completion`/
    /// `file_completion`/`source_validation` hook vetoed the operation.
    #[error("hook {} rejected: {}", .0.hook_id, .0.message)]
    HookRejected(Rejection),
    /// The referenced file isn't in the queue.
    #[error("no queued file at {0:?}")]
    NotFound(String),
}

/// Why `add_source` rejected a proposed source (§4.5.3).
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum SourceError {
    /// A user cannot be their own source.
    #[error("a user cannot be a source for their own download")]
    SelfSource,
    /// The target requires TLS and the peer doesn't support it.
    #[error("target requires TLS and the peer does not support it")]
    TlsRequired,
    /// The `source_validation` hook vetoed this source.
    #[error("hook {} rejected: {}", .0.hook_id, .0.message)]
    HookRejected(Rejection),
    /// The referenced file isn't in the queue.
    #[error("no queued file at {0:?}")]
    NotFound(String),
}

/// Why a bundle-level operation (`recheck_file`, bundle completion)
/// failed.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum BundleError {
    /// The referenced bundle token isn't in the queue.
    #[error("no queued bundle with token {0}")]
    NotFound(u32),
    /// A `bundle_validation`/`bundle_completion` hook vetoed the
    /// operation.
    #[error("hook {} rejected: {}", .0.hook_id, .0.message)]
    HookRejected(Rejection),
}
