//! Why `on_request` (§4.6) could not be carried out.

use hooks::Rejection;

/// Outcomes of resolving and classifying an [`crate::request::UploadRequest`]
/// (§4.6 steps 1-4).
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadError {
    /// Step 1: the connection's `user_sid`/hub hint didn't resolve to a
    /// known user.
    #[error("unknown user for upload request")]
    UnknownUser,
    /// Step 2: the request's segment was malformed (empty file name,
    /// negative start, or a size of `0`).
    #[error("malformed upload request for {0:?}")]
    InvalidRequest(String),
    /// Step 3: neither the share nor the download queue has the file.
    #[error("file not available: {0:?}")]
    FileNotAvailable(String),
    /// Step 3: the file exists but the requester's profile lacks access to
    /// it.
    #[error("access denied: {0:?}")]
    FileAccessDenied(String),
    /// The `slot_type` hook vetoed this request outright (rather than
    /// merely overriding the class).
    #[error("hook {} rejected: {}", .0.hook_id, .0.message)]
    HookRejected(Rejection),
}
