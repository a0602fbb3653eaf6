#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `hub-registry` is the process-wide directory of live hub sessions
//! (§3.5): one [`hub::HubSession`] per hub URL, created by URL scheme and
//! reachable by every other layer that needs to address a specific hub or
//! scan all of them - `connect_to_user` resolution, favorite-hub
//! reconnects, and the UDP search reply path's `findOnlineUser`-style
//! lookups all go through [`HubRegistry`] rather than holding a session
//! reference of their own.
//!
//! # Design
//!
//! [`HubRegistry`] mirrors the hub-ownership half of the reference
//! implementation's `ClientManager`: `create_hub`/`remove_hub`/`redirect`
//! own the set, `with_hub` hands a caller exclusive access to drive one
//! session's `dispatch_line`/`take_outbox` cycle, and `hubs_with_user`/
//! `with_online_user` answer the cross-hub "is this CID online anywhere"
//! question a favorite list or a PM send needs answered without knowing
//! which hub to ask first. `ClientManager`'s action hooks and transfer
//! bookkeeping live in `hooks` and `connmgr`/`queue`/`upload` instead -
//! this crate only owns the hub directory itself.
//!
//! # Invariants
//!
//! - At most one session is ever registered per hub URL; `create_hub`
//!   rejects a duplicate rather than replacing the existing session.
//! - `redirect` never leaves two sessions registered for the same
//!   logical hub: the old URL's entry is removed before the new one is
//!   created, and a collision with an already-registered target URL
//!   aborts the whole move.
//!
//! # Examples
//!
//! ```
//! use hub::HubConfig;
//! use hub_registry::HubRegistry;
//! use hooks::events::{HookRegistry, ListenerRegistry};
//! use connmgr::TokenStore;
//! use core::clock::FakeClock;
//! use std::sync::Arc;
//!
//! let registry = HubRegistry::new(
//!     Arc::new(HookRegistry::new()),
//!     Arc::new(ListenerRegistry::new()),
//!     Arc::new(TokenStore::new()),
//!     Arc::new(FakeClock::new()),
//! );
//! # let config = HubConfig {
//! #     hub_url: "adc://hub.example:412".to_string(),
//! #     nick: "alice".to_string(),
//! #     password: None,
//! #     my_cid: identity::Cid::from_bytes([1; 24]),
//! #     pid_base32: "AAAA".to_string(),
//! #     features: vec!["BASE".to_string()],
//! #     share_size: 0,
//! #     slot_count: 1,
//! #     my_port: 3500,
//! #     tls_loaded: false,
//! #     nat_t_supported: false,
//! #     hub_hash_required: false,
//! #     info_push_interval_ms: 60_000,
//! # };
//! registry.create_hub(config).unwrap();
//! assert_eq!(registry.hub_count(), 1);
//! ```
//!
//! # See also
//!
//! - [`hub`](../hub/index.html) for the session state machines this crate
//!   owns instances of.
//! - [`connmgr`](../connmgr/index.html) for the C-C connection tokens a
//!   `connect_to_user` call mediated through a registered session ends up
//!   minting.

/// Registry operation errors.
pub mod error;
/// The live hub session directory.
pub mod registry;

pub use error::HubRegistryError;
pub use registry::HubRegistry;
