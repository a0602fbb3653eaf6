#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `upload` is the L9 layer (§2, §4.6): the server-side transfer engine.
//! It owns upload slot accounting (§4.6.1's seven-way classification and
//! §4.6.2's MCN slot rebalance), resolves an incoming request against the
//! Share service or, on miss, the download queue's partial copy, and
//! decides what the connection driver should do about it.
//!
//! # Design
//!
//! [`manager::UploadManager`] is the single entry point, mirroring
//! [`queue::manager::QueueManager`]'s role on the download side. It never
//! touches a socket: [`manager::UploadManager::on_request`] returns an
//! [`effect::UploadEffect`] describing what to send, and the caller - a
//! C-C connection task in `app` - performs the actual read/compress/write,
//! the same split [`hub::effect::HubEffect`](../hub/effect/index.html)
//! keeps on the hub side. [`slot::SlotTracker`] holds the running-count
//! bookkeeping; [`share::ShareResolver`] is the trait boundary onto the
//! Share service, which generates and indexes the share tree and filelist
//! outside this crate entirely (§1 scope).
//!
//! # Invariants
//!
//! - A slot class granted by [`slot::SlotTracker::classify`] is only ever
//!   released through [`manager::UploadManager::release`] with the exact
//!   class it was granted under.
//! - [`slot::SlotTracker::classify`] never disconnects a user below their
//!   first MCN sub-connection (delegated to
//!   [`connmgr::McnTracker::highest_concurrency_user`]).
//! - A `NOSLOT` outcome is not an error - see
//!   [`manager::UploadDecision::Refused`].
//!
//! # Examples
//!
//! ```
//! use connmgr::McnTracker;
//! use core::clock::FakeClock;
//! use filters::Skiplist;
//! use hooks::{HookRegistry, ListenerRegistry};
//! use identity::synthetic_nmdc_cid;
//! use std::sync::Arc;
//! use upload::manager::{RequestHints, UploadDecision, UploadManager};
//! use upload::request::{RequestKind, RequestedRange, UploadRequest};
//! use upload::share::{ShareLookup, ShareProfile, ShareResolver, SharedFile};
//! use upload::slot::SlotConfig;
//! use checksums::tth::TigerTree;
//!
//! struct OneFileShare;
//!
//! impl ShareResolver for OneFileShare {
//!     fn resolve_file(&self, _profile: ShareProfile, file_path: &str) -> ShareLookup {
//!         if file_path == "/movie.mkv" {
//!             ShareLookup::Found(SharedFile { real_path: "/data/movie.mkv".to_string(), size: 1_000, tth: None })
//!         } else {
//!             ShareLookup::Miss
//!         }
//!     }
//!     fn resolve_tthl(&self, _profile: ShareProfile, _file_path: &str) -> Option<TigerTree> {
//!         None
//!     }
//!     fn generate_filelist(&self, _profile: ShareProfile, _extracted: bool) -> Option<Vec<u8>> {
//!         None
//!     }
//! }
//!
//! let share = Arc::new(OneFileShare);
//! let manager = UploadManager::new(
//!     Arc::new(FakeClock::new()),
//!     Arc::new(HookRegistry::new()),
//!     Arc::new(ListenerRegistry::new()),
//!     share,
//!     None,
//!     Arc::new(McnTracker::new(8)),
//!     SlotConfig { max_slots: 4, extra_slots: 2, extra_partial_slots: 2, speed_limit_bps: 10_240.0 },
//!     Skiplist::empty(),
//! );
//! let alice = synthetic_nmdc_cid("alice", "dchub://hub.example");
//! let request = UploadRequest {
//!     kind: RequestKind::File,
//!     file_path: "/movie.mkv".to_string(),
//!     range: RequestedRange::to_eof(0),
//!     user_sid: None,
//!     list_recursive: false,
//! };
//! let hints = RequestHints {
//!     is_mcn_connection: false,
//!     peer_supports_mini_slots: false,
//!     peer_supports_zlib: false,
//!     current_upload_speed_bps: 0.0,
//! };
//! match manager.on_request(Some(alice), &request, hints).unwrap() {
//!     UploadDecision::Granted { class, .. } => println!("granted {class:?}"),
//!     UploadDecision::Refused { .. } => println!("no slot"),
//! }
//! ```
//!
//! # See also
//!
//! - [`queue`](../queue/index.html), whose
//!   [`QueueManager::partial_download_info`](../queue/manager/struct.QueueManager.html#method.partial_download_info)
//!   backs the partial-file-sharing fallback (§4.6 step 3).
//! - [`connmgr`](../connmgr/index.html), whose [`connmgr::McnTracker`]
//!   is shared between this crate's MCN slot classification and the C-C
//!   connection layer's sub-connection admission.
//! - [`compress`](../compress/index.html)'s `ZL1` zlib streaming, used by
//!   the driver to fulfil an [`effect::UploadEffect::StreamFile`]/
//!   [`effect::UploadEffect::StreamBytes`] marked `compressed`.

/// Effects the upload manager asks its connection driver to perform (§5).
pub mod effect;
/// Why an upload request could not be resolved or classified (§7).
pub mod error;
/// The top-level [`manager::UploadManager`] engine (§4.6).
pub mod manager;
/// An incoming upload request, independent of wire protocol.
pub mod request;
/// The `ShareResolver` trait boundary onto the out-of-scope Share service.
pub mod share;
/// Slot classes, the seven-step priority order, and MCN rebalance
/// (§4.6.1, §4.6.2).
pub mod slot;

pub use effect::UploadEffect;
pub use error::UploadError;
pub use manager::{RequestHints, UploadDecision, UploadManager};
pub use request::{RequestKind, RequestedRange, UploadRequest};
pub use share::{ShareLookup, ShareProfile, ShareResolver, SharedFile};
pub use slot::{SlotClass, SlotConfig, SlotTracker};
