//! The abstraction boundary onto the Share service (§4.6 step 3).
//!
//! Filelist generation and the share tree itself are out of scope here -
//! per spec, they're "not generated here; consumed via the Share service."
//! [`ShareResolver`] is that service's interface as seen from `upload`:
//! given a requester's profile and a path, what file (if any) backs it.

use checksums::tth::{Tiger192, TigerTree};
use identity::Cid;

/// An opaque handle to a requester's share-access profile (their ADC
/// `OverrideProfiles`/hub-slot profile, or the NMDC equivalent), as
/// assigned by the hub layer. `upload` never interprets the value, only
/// passes it through to [`ShareResolver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShareProfile(pub u32);

/// The default profile granted to a requester with no specific profile
/// assignment.
pub const DEFAULT_PROFILE: ShareProfile = ShareProfile(0);

/// A resolved, shareable file as the Share service sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedFile {
    /// Where the bytes live on disk.
    pub real_path: String,
    /// The file's size.
    pub size: i64,
    /// The file's content identity, when already hashed.
    pub tth: Option<Tiger192>,
}

/// The result of looking up a path against a requester's share view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareLookup {
    /// The file is shared and the profile may see it.
    Found(SharedFile),
    /// The file exists in the share but this profile's permissions don't
    /// cover it.
    AccessDenied,
    /// The path isn't shared at all.
    Miss,
}

/// The Share service's interface, as `upload` needs it. A real
/// implementation walks the live share tree; `upload` only ever calls
/// through this trait, so that tree's construction and refresh stay
/// entirely outside this crate.
pub trait ShareResolver: Send + Sync {
    /// Resolves `file_path` (as the requester named it) against `profile`.
    fn resolve_file(&self, profile: ShareProfile, file_path: &str) -> ShareLookup;

    /// Returns the TTH leaf tree for an already-shared file, for `TTHL`
    /// requests (§4.6 step 2). `None` if the path isn't shared or the tree
    /// hasn't been computed.
    fn resolve_tthl(&self, profile: ShareProfile, file_path: &str) -> Option<TigerTree>;

    /// Generates this profile's filelist (`files.xml.bz2` or the
    /// decompressed `files.xml`), if the requester's view isn't cached.
    /// Returns the already-encoded bytes - `upload` streams them as-is.
    fn generate_filelist(&self, profile: ShareProfile, extracted: bool) -> Option<Vec<u8>>;

    /// The share-access profile assigned to `user` on this hub, used when
    /// the request doesn't carry one explicitly.
    fn profile_for(&self, user: Cid) -> ShareProfile {
        let _ = user;
        DEFAULT_PROFILE
    }
}
