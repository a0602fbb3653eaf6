//! Bit-flag sets for [`crate::file::QueueFile`] and [`crate::source::Source`]
//! (§3.3).

use bitflags::bitflags;

bitflags! {
    /// What kind of list/file a [`crate::file::QueueFile`] represents and
    /// how it should be handled (§3.3).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct QueueFileFlags: u16 {
        /// A full filelist (`files.xml.bz2`) rather than a regular file.
        const USER_LIST = 1 << 0;
        /// A partial list (one subtree of a user's filelist).
        const PARTIAL_LIST = 1 << 1;
        /// Queued to match against an incoming search result, not for
        /// direct download.
        const MATCH_QUEUE = 1 << 2;
        /// Requested for immediate client-side viewing rather than
        /// persistent download (a filelist browse).
        const CLIENT_VIEW = 1 << 3;
        /// The file/list should be opened with the associated
        /// application once complete.
        const OPEN = 1 << 4;
        /// The requested list is the compressed `.bz2` form.
        const XML_BZLIST = 1 << 5;
        /// A flat TTH list matching an existing bundle (swarm-aware
        /// add-bundle response, §4.5.1).
        const TTHLIST_BUNDLE = 1 << 6;
        /// Bypasses the skiplist check regardless of name (§4.5.1 step 1).
        const PRIVATE = 1 << 7;
        /// A partial list request that should recurse into subdirectories.
        const RECURSIVE_LIST = 1 << 8;
    }
}

bitflags! {
    /// Why a [`crate::source::Source`] might be unusable right now, or
    /// carry extra state (§3.3).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SourceFlags: u16 {
        /// The peer reported the file is no longer available.
        const FILE_NOT_AVAILABLE = 1 << 0;
        /// The peer has no TTH tree for this file (§7: tolerated below
        /// 20 MiB, dropped above).
        const NO_TREE = 1 << 1;
        /// The source has been measured as too slow to be useful.
        const SLOW_SOURCE = 1 << 2;
        /// A downloaded leaf from this source failed TTH verification;
        /// the source is dropped permanently for this file (§7).
        const TTH_INCONSISTENCY = 1 << 3;
        /// The source only has part of the file (§4.5.7 PSR).
        const PARTIAL = 1 << 4;
        /// A downloaded block failed its SFV CRC check.
        const CRC_WARN = 1 << 5;
    }
}
