//! An incoming `GET`/`GFI`-style upload request (§4.6), independent of
//! whether it arrived over ADC or NMDC.

/// The full filelist, compressed as shared (`files.xml.bz2`).
pub const USER_LIST_NAME_BZ: &str = "files.xml.bz2";
/// The full filelist, requested in its decompressed form.
pub const USER_LIST_NAME_EXTRACTED: &str = "files.xml";

/// What kind of stream the requester wants (§4.6 step 2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// A normal file, or the full filelist (compressed or extracted).
    File,
    /// A THEX (`TTHL`) tree for a file already identified by TTH.
    Tthl,
    /// A partial or TTH-addressed file list.
    List,
}

/// The byte range a requester asked for. `length: None` is the `bytes ==
/// -1` wire convention, "until EOF" (§4.6 "Segmenting").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestedRange {
    /// The starting offset.
    pub start: i64,
    /// The requested length, or `None` for "until EOF".
    pub length: Option<i64>,
}

impl RequestedRange {
    /// The range ending at EOF, starting at `start`.
    #[must_use]
    pub const fn to_eof(start: i64) -> Self {
        Self { start, length: None }
    }

    /// Resolves this range's length against a known file size.
    #[must_use]
    pub fn resolved_length(&self, file_size: i64) -> i64 {
        match self.length {
            Some(len) => len,
            None => (file_size - self.start).max(0),
        }
    }
}

/// A parsed upload request, prior to share/queue resolution and slot
/// classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadRequest {
    /// What kind of stream is being asked for.
    pub kind: RequestKind,
    /// The requested file path (relative to the requester's share view).
    pub file_path: String,
    /// The requested byte range.
    pub range: RequestedRange,
    /// The SID the connection carried, if the hub protocol attaches one
    /// (ADC `GET ... user_sid`); `None` falls back to the connection's own
    /// hub hint (§4.6 step 1).
    pub user_sid: Option<String>,
    /// Whether a `List` request asked for the recursive variant.
    pub list_recursive: bool,
}

impl UploadRequest {
    /// Step 2's `validate()`: a non-empty file name and a sane range
    /// (`start >= 0`, and a requested length that isn't exactly zero).
    #[must_use]
    pub fn validate(&self) -> bool {
        !self.file_path.is_empty() && self.range.start >= 0 && self.range.length != Some(0)
    }

    /// Whether this request names the shared user filelist, in either its
    /// compressed or extracted form.
    #[must_use]
    pub fn is_userlist(&self) -> bool {
        self.file_path == USER_LIST_NAME_BZ || self.file_path == USER_LIST_NAME_EXTRACTED
    }
}
