#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `identity` is the L3 layer (§2): the process-wide `CID -> User` map, the
//! per-hub `SID -> OnlineUser` presence shape, and the derivation of a
//! [`connect_mode::ConnectMode`] for each peer from the two sides' `INF`
//! fields.
//!
//! # Design
//!
//! [`User`] is the only shared-owned entity in this layer; [`Identity`] and
//! [`OnlineUser`] hold an [`std::sync::Arc<User>`] but never a back-pointer
//! to the hub they were observed on, breaking the reference cycle called
//! out in §9. [`Registry`] is generic over [`core::Clock`] so its idle-GC
//! sweep can be driven deterministically in tests.
//!
//! # Invariants
//!
//! - A [`Sid`] is always exactly 4 base32 characters.
//! - [`Registry::sweep`] only removes a [`User`] with strong count 1 and
//!   idle time past [`Registry::GC_IDLE_MS`] (§3.5).
//!
//! # Examples
//!
//! ```
//! use identity::{Sid, SidGenerator};
//!
//! let gen = SidGenerator::new();
//! let first = gen.allocate();
//! let second = gen.allocate();
//! assert_ne!(first, second);
//! ```
//!
//! # See also
//!
//! - [`hub`](../hub/index.html), the main consumer: merges `BINF`/`$MyINFO`
//!   into an [`Identity`] and asks this crate for the resulting
//!   [`connect_mode::ConnectMode`].
//! - [`queue`](../queue/index.html), which keys sources by [`Cid`].

/// The client identifier and NMDC synthetic-CID derivation.
pub mod cid;
/// Connectivity-mode derivation (§4.3).
pub mod connect_mode;
/// User flag bitsets (§3.2).
pub mod flags;
/// Per-session [`presence::Identity`] and [`presence::OnlineUser`].
pub mod presence;
/// The process-wide user registry and offline-nick cache.
pub mod registry;
/// The per-hub session identifier.
pub mod sid;
/// The process-wide, hub-independent user entity.
pub mod user;

pub use cid::{synthetic_nmdc_cid, Cid};
pub use connect_mode::{derive as derive_connect_mode, AddressInfo, ConnectMode, DeriveInput};
pub use flags::UserFlags;
pub use presence::{Identity, OnlineUser};
pub use registry::{OfflineUser, Registry};
pub use sid::{Sid, SidGenerator, SidParseError, HUB_SID};
pub use user::User;
