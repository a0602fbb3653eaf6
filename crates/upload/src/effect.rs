//! Effects [`crate::manager::UploadManager`] asks its driver to carry out
//! (§5): the manager decides what a request deserves, never touching a
//! socket itself - the same split [`hub::effect::HubEffect`] keeps between
//! a hub session's state machine and the driver that owns its I/O.

/// One action the connection's owning driver should perform after
/// [`crate::manager::UploadManager::on_request`] returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadEffect {
    /// Write this already-framed protocol line (an error reply, or the
    /// header preceding a stream) to the connection.
    Send(String),
    /// Stream `length` bytes of `real_path` starting at `start` to the
    /// connection, through a `ZL1` zlib encoder if `compressed`, honoring
    /// the upload [`bandwidth::BandwidthLimiter`] the driver owns for this
    /// connection (§4.6 step 5).
    StreamFile {
        /// The on-disk path to read from.
        real_path: String,
        /// The byte offset to start at.
        start: i64,
        /// How many bytes to send.
        length: i64,
        /// Whether to wrap the stream in `ZL1` zlib framing.
        compressed: bool,
    },
    /// Stream already-in-memory bytes (a generated filelist or a `TTHL`
    /// leaf dump) to the connection.
    StreamBytes {
        /// The bytes to send.
        data: Vec<u8>,
        /// Whether to wrap the stream in `ZL1` zlib framing.
        compressed: bool,
    },
    /// The request is refused; send this message but keep the connection
    /// open (§4.6 step 6 - `NOSLOT`/`FileNotAvailable` are recoverable,
    /// the requester may try again or ask for something else).
    Reject(String),
    /// The request can't be salvaged (malformed, or a hook vetoed it
    /// outright); the driver should close the connection.
    Disconnect,
}
