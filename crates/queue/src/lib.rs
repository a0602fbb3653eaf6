#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `queue` is the L8 layer (§2, §4.5): the download engine. It owns every
//! queued [`bundle::Bundle`] and [`file::QueueFile`], the per-user source
//! index segment selection scans, and the operations named in §4.5 -
//! `add_file`, `add_bundle_directory`, `add_source`, segment selection and
//! completion, per-file integrity recheck, auto-priority, and the
//! alternate-source search scheduler.
//!
//! # Design
//!
//! [`manager::QueueManager`] is the single entry point; everything else in
//! this crate is a data type or pure function it composes. The live model
//! splits into three indices - [`file_queue::FileQueue`] (by path, by
//! request token, by TTH), [`bundle_queue::BundleQueue`] (by token, by
//! directory), and [`user_queue::UserQueue`] (by CID, partitioned and
//! rotated by priority) - rather than one big graph, so each index can be
//! locked, iterated, and tested independently. [`segment::DoneSet`] is the
//! only piece of genuinely fiddly interval-arithmetic in the crate and is
//! kept separate and thoroughly tested for that reason. [`persist`] bridges
//! to [`persistence`]'s on-disk DTOs at the load/save boundary, the
//! `queue`-side half of the debounced-save contract described in §4.5.10.
//!
//! # Invariants
//!
//! See §8's testable properties; in particular:
//!
//! - [`segment::DoneSet`] is always a disjoint, coalesced union of ranges.
//! - A [`file::QueueFile`]'s `sources` and `bad_sources` are always
//!   disjoint (§8 invariant 3).
//! - `status == Shared` implies every queue item finished and no
//!   completion notification is outstanding (§8 invariant 4,
//!   [`bundle::Bundle::satisfies_shared_invariant`]).
//! - At most one non-overlapped segment per `(user, file)` pair is ever
//!   outstanding at once (§8 invariant 6).
//!
//! # Examples
//!
//! ```
//! use checksums::tth::hash_leaf;
//! use core::clock::FakeClock;
//! use hooks::{HookRegistry, ListenerRegistry};
//! use identity::cid::synthetic_nmdc_cid;
//! use filters::Skiplist;
//! use queue::flags::QueueFileFlags;
//! use queue::manager::QueueManager;
//! use queue::priority::Priority;
//! use queue::source::Source;
//! use std::sync::Arc;
//!
//! let manager = QueueManager::new(
//!     Arc::new(FakeClock::new()),
//!     Arc::new(HookRegistry::new()),
//!     Arc::new(ListenerRegistry::new()),
//!     Skiplist::empty(),
//! );
//! let alice = synthetic_nmdc_cid("alice", "dchub://hub.example");
//! manager
//!     .add_file(
//!         "/downloads/release/a.bin",
//!         10_000_000,
//!         hash_leaf(b"a"),
//!         Source::new(alice, "alice", "dchub://hub.example:411"),
//!         QueueFileFlags::empty(),
//!         Priority::Normal,
//!         false,
//!     )
//!     .unwrap();
//! let download = manager.next_segment_for_user(alice, 0.0).unwrap();
//! assert_eq!(download.target_path, "/downloads/release/a.bin");
//! ```
//!
//! # See also
//!
//! - [`hub`](../hub/index.html) and [`connmgr`](../connmgr/index.html),
//!   which call [`manager::QueueManager::next_segment_for_user`] once a
//!   connection is ready to transfer.
//! - [`persistence`](../persistence/index.html), the on-disk record shapes
//!   [`persist`] converts to/from.
//! - [`search`](../search/index.html), dispatched by the alternate-source
//!   scheduler (§4.5.9) outside this crate using
//!   [`manager::QueueManager::next_search_candidate`] and
//!   [`manager::QueueManager::first_queued_file_tth`].

/// Auto-priority re-ranking (§4.5.8).
pub mod autoprio;
/// A directory or single-file download grouping (§3.3).
pub mod bundle;
/// `token -> Bundle` and `dir -> Bundle` indices (§3.3, §4.5.9).
pub mod bundle_queue;
/// The queue engine's error taxonomy (§7).
pub mod error;
/// A single queued file (§3.3).
pub mod file;
/// `path -> QueueFile`, `token -> QueueFile`, `tth -> [QueueFile]` indices
/// (§3.3).
pub mod file_queue;
/// Bit-flag sets for [`file::QueueFile`] and [`source::Source`] (§3.3).
pub mod flags;
/// The top-level [`manager::QueueManager`] engine (§4.5).
pub mod manager;
/// Persistence conversion and the debounced-save scheduler (§4.5.10).
pub mod persist;
/// Queue priority levels (§3.3).
pub mod priority;
/// Partial-file (PSR) and partial-bundle (PBD) exchange decoding (§4.5.7).
pub mod psr;
/// Byte-range segments and the coalescing `done` set (§3.3).
pub mod segment;
/// A declared supplier of some or all of a file's bytes (§3.3).
pub mod source;
/// `CID -> files` partitioned by priority with per-user rotation (§4.5.4).
pub mod user_queue;

pub use bundle::{Bundle, BundleStatus};
pub use error::{BundleError, FileError, SourceError};
pub use file::{FileStatus, QueueFile};
pub use manager::{Download, NoSegmentReason, PartialFileInfo, QueueManager};
pub use priority::Priority;
pub use segment::{DoneSet, Segment};
pub use source::{PartialSource, Source};
