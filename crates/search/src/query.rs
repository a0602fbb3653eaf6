//! The outgoing search query shape (§4.7, §6.1 `BSCH`/`FSCH`/`DSCH`).

/// A file-type filter for ADC's `TY` parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    /// `TY1` - any file.
    Any,
    /// `TY2` - audio.
    Audio,
    /// `TY3` - compressed archive.
    Compressed,
    /// `TY4` - document.
    Document,
    /// `TY5` - executable.
    Executable,
    /// `TY6` - picture.
    Picture,
    /// `TY7` - video.
    Video,
    /// `TY8` - directory.
    Directory,
}

impl FileType {
    /// The numeric `TY` code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Any => 1,
            Self::Audio => 2,
            Self::Compressed => 3,
            Self::Document => 4,
            Self::Executable => 5,
            Self::Picture => 6,
            Self::Video => 7,
            Self::Directory => 8,
        }
    }
}

/// A size or date bound, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bound<T> {
    /// `GE`/`NT` - greater than or equal.
    AtLeast(T),
    /// `LE`/`OT` - less than or equal.
    AtMost(T),
    /// `EQ` - exact.
    Exact(T),
}

/// One outgoing search request (§4.7).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SearchQuery {
    /// `AN` - required, space-separated name terms (AND-matched).
    pub and_terms: Vec<String>,
    /// `NO` - excluded name terms.
    pub exclude_terms: Vec<String>,
    /// `TR` - exact TTH match; when set, overrides name matching.
    pub tth: Option<String>,
    /// `GE`/`LE`/`EQ` size bound, in bytes.
    pub size: Option<Bound<u64>>,
    /// `TY` - file type filter.
    pub file_type: Option<FileType>,
    /// `EX` - comma-separated extension list.
    pub extensions: Vec<String>,
    /// `RX` - regex-style extension pattern, an alternative to `EX`.
    pub extension_pattern: Option<String>,
    /// `GR` - grouped type (coarser than `TY`), with optional `RX` refinement.
    pub grouped_type: Option<String>,
    /// `MT` - match type selector (name vs TTH, hub-specific vocabulary).
    pub match_type: Option<String>,
    /// `NT`/`OT` - date bound on the file's modification time (Unix ms).
    pub date: Option<Bound<i64>>,
    /// `PP` - parents-only: match only directories containing the term.
    pub parents_only: bool,
}

impl SearchQuery {
    /// Builds a plain name search for `term`.
    #[must_use]
    pub fn by_name(term: impl Into<String>) -> Self {
        Self { and_terms: vec![term.into()], ..Self::default() }
    }

    /// Builds an exact-TTH search.
    #[must_use]
    pub fn by_tth(tth: impl Into<String>) -> Self {
        Self { tth: Some(tth.into()), ..Self::default() }
    }

    /// Whether this is a TTH-exact search rather than a name search.
    #[must_use]
    pub fn is_tth_search(&self) -> bool {
        self.tth.is_some()
    }
}
