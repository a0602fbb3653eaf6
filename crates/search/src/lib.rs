#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `search` is the L6 layer (§4.7): fanning a query out across hubs with
//! per-hub FIFO pacing, minting and caching SUDP keys, and routing
//! incoming UDP datagrams (plaintext or SUDP-encrypted) back to the
//! search that asked for them.
//!
//! # Design
//!
//! [`query::SearchQuery`] models the ADC `AN`/`NO`/`TR`/`TY`/… parameter
//! set independent of wire framing - `hub` builds the actual `BSCH`/
//! `FSCH`/`DSCH` command (and NMDC's `$Search`) from it. [`sudp`]
//! implements the AES-128-CBC encrypt/decrypt primitive; [`key_store`]
//! keeps a clock-driven sliding window of keys this process has minted.
//! [`manager::SearchManager`] ties the two together: per-hub queue
//! pacing, search-token bookkeeping for [`manager::SearchManager::cancel_search`],
//! and [`manager::SearchManager::route_result`] for incoming replies.
//!
//! # Invariants
//!
//! - `decrypt(encrypt(msg, k), k) == msg` for every key and plaintext up
//!   to 64 KiB (§8 property 8); a wrong key either rejects via padding or
//!   returns garbage but never panics.
//! - Search tokens are unique while a search is pending; `cancel_search`
//!   removes every hub's queue entry for that owner, never leaving a
//!   dangling token behind.
//!
//! # Examples
//!
//! ```
//! use search::query::SearchQuery;
//! use search::manager::SearchManager;
//! use core::clock::SystemClock;
//! use std::sync::Arc;
//!
//! let manager = SearchManager::new(Arc::new(SystemClock::new()));
//! let waits = manager.queue_search(
//!     &["dchub://hub.example:411".to_string()],
//!     SearchQuery::by_name("release"),
//!     "ui-session-1",
//!     false,
//! );
//! assert_eq!(waits.len(), 1);
//! ```
//!
//! # See also
//!
//! - [`queue`](../queue/index.html), which drives alternate-source
//!   searches (§4.5.9) through this crate.
//! - [`hub`](../hub/index.html), which owns the per-hub socket this
//!   crate's queries are ultimately written to.

/// The sliding 15-minute SUDP key cache.
pub mod key_store;
/// The process-wide UDP receive loop.
pub mod listener;
/// Per-hub search fan-out and incoming result routing.
pub mod manager;
/// The outgoing search query shape.
pub mod query;
/// AES-128-CBC SUDP encryption/decryption.
pub mod sudp;
/// Search token allocation.
pub mod token;

pub use manager::{IncomingSearchEvent, PendingSearch, SearchManager};
pub use query::{Bound, FileType, SearchQuery};
pub use sudp::{SudpError, SudpKey};
pub use token::{SearchToken, SearchTokenGenerator};
