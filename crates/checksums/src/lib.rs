#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` implements the two content-identity primitives the engine
//! needs once a file's bytes are in hand: the Tiger Tree Hash (§3.1, §4.5.6)
//! used as the primary content identifier (`TTH`) and as the per-block
//! integrity check during download verification, and the SFV/CRC32
//! checksum optionally published alongside a release directory.
//!
//! Computing the *initial* TTH tree for a locally shared file is the Share
//! service's job and out of scope here (§1) — this crate only builds and
//! compares trees for bytes the engine has itself read, whether that's a
//! freshly downloaded segment being checked against an already-known tree
//! (`recheck_file`, §4.5.6) or a remote peer's leaf list being matched
//! against ours during partial-file exchange (§4.5.7).
//!
//! # Design
//!
//! - [`tth`] implements the THEX tree: 1024-byte leaves hashed with
//!   `Tiger(0x00 ++ block)`, internal nodes `Tiger(0x01 ++ left ++ right)`,
//!   odd nodes at each level carried up unchanged. [`tth::Tiger192`] is the
//!   shared 192-bit, Base32-encoded identifier shape; `identity`'s `Cid`
//!   newtype wraps the same primitive since CIDs are also Tiger hashes
//!   (§3.1).
//! - [`sfv`] parses the simple `filename crc32hex` line format used by
//!   `.sfv` release-verification files and checks a byte buffer against one.
//!
//! # Invariants
//!
//! - [`tth::TigerTree::root`] never rehashes already-computed leaves; the
//!   tree stores leaf hashes once and folds them bottom-up on access.
//! - Base32 identifiers are always rendered uppercase, unpadded, exactly 39
//!   characters for a full 192-bit value, matching the wire format used in
//!   ADC commands and magnet links.
//!
//! # Errors
//!
//! [`tth::Tiger192ParseError`] reports a Base32 string that doesn't decode
//! to exactly 24 bytes. [`sfv::SfvParseError`] reports a malformed `.sfv`
//! line.
//!
//! # Examples
//!
//! ```
//! use checksums::tth::TigerTree;
//!
//! let tree = TigerTree::compute(b"hello world", 1024);
//! let root = tree.root();
//! assert_eq!(root.to_base32().len(), 39);
//! ```
//!
//! # See also
//!
//! - [`queue`](../queue/index.html) for `recheck_file`, the main caller of
//!   [`tth::TigerTree::compute`] on already-downloaded bytes.
//! - [`identity`](../identity/index.html) for the `Cid` newtype built on
//!   [`tth::Tiger192`].

pub mod sfv;
pub mod tth;

pub use tth::{Tiger192, Tiger192ParseError};
