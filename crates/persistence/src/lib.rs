#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `persistence` is the L10 layer (§2, §4.5.10): serializing each bundle
//! as an independent `bundles/<token>.xml` record and reloading the store
//! in parallel at start-up, plus a one-time importer for the legacy
//! monolithic `Queue.xml` format (§6.4).
//!
//! # Design
//!
//! [`record::BundleRecord`] and friends are plain serde DTOs, deliberately
//! not `queue`'s live `Bundle`/`QueueFile` types, so this crate sits below
//! `queue` in the dependency graph rather than the two depending on each
//! other. `queue` converts to/from these records at its load/save
//! boundary. XML (de)serialization uses `quick-xml`'s serde integration,
//! the same attribute-per-field shape the spec's record sketch shows
//! (`<Bundle Version=2 Token=… Target=…>`).
//!
//! # Invariants
//!
//! - [`store::BundleStore::load_all`] never fails the whole load because
//!   one record is corrupt or duplicated; it skips/logs and continues.
//! - [`store::BundleStore::save`] always writes a complete file - there is
//!   no partial-write path a concurrent loader could observe, since `save`
//!   builds the full XML string before calling `fs::write`.
//!
//! # Examples
//!
//! ```
//! use persistence::record::{BundleRecord};
//! use persistence::store::BundleStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = BundleStore::new(dir.path());
//! let record = BundleRecord {
//!     version: 2,
//!     token: 1,
//!     target: "/downloads/release/".into(),
//!     priority: "Normal".into(),
//!     auto_priority: true,
//!     date: None,
//!     added: 0,
//!     is_file_bundle: false,
//!     downloads: vec![],
//! };
//! store.save(&record).unwrap();
//! assert_eq!(store.load_all().unwrap(), vec![record]);
//! ```
//!
//! # See also
//!
//! - [`queue`](../queue/index.html), the only consumer: debounces saves to
//!   once per bundle per 20s and triggers [`legacy::import`] once at
//!   start-up (§4.5.10).

/// Legacy monolithic `Queue.xml` one-time import.
pub mod legacy;
/// The on-disk record shapes.
pub mod record;
/// Reading and writing the per-bundle-token file store.
pub mod store;

pub use record::{BundleRecord, DownloadRecord, SegmentRecord, SourceRecord};
pub use store::{BundleStore, StoreError};
