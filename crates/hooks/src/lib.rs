#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `hooks` is the L11 layer (§2, §4.8): a synchronous, vetoing
//! [`Hook`] for the eight validation points the spec names
//! (`source_validation`, `bundle_file_validation`, `bundle_validation`,
//! `bundle_completion`, `file_completion`, `outgoing_private_message`,
//! `slot_type`, `incoming_chat_message`), and an observe-only [`Listener`]
//! for everything that only watches (bundle/file/user/search/chat events).
//!
//! # Design
//!
//! Both shapes are generic over their payload type rather than one
//! dynamically-typed bus, so a caller gets a compile-time guarantee that
//! `queue`'s `bundle_completion` subscriber sees a
//! [`events::BundleCompletionInput`] and nothing else. [`events::HookRegistry`]
//! and [`events::ListenerRegistry`] bundle the concrete instances the rest
//! of the workspace is expected to share via one `Arc` each, set up once by
//! `app` at start-up.
//!
//! # Invariants
//!
//! - A [`Hook::fire`] call stops at the first [`Rejection`]; no subscriber
//!   after the rejecting one runs.
//! - Removing a subscriber id that was never registered is a no-op, never
//!   an error (§4.8: "Failure to find a subscriber is not an error").
//!
//! # Examples
//!
//! ```
//! use hooks::events::{BundleCompletionInput, HookRegistry};
//!
//! let registry = HookRegistry::new();
//! registry.bundle_completion.subscribe("scan", |input: &BundleCompletionInput| {
//!     if input.target.is_empty() {
//!         return Err(hooks::Rejection::new("bundle_completion", "empty_target", "no target"));
//!     }
//!     Ok(())
//! });
//! assert!(registry.bundle_completion.fire(&BundleCompletionInput {
//!     bundle_token: 1,
//!     target: "release/".into(),
//! }).is_ok());
//! ```
//!
//! # See also
//!
//! - [`queue`](../queue/index.html) fires `source_validation`,
//!   `bundle_file_validation`, `bundle_validation`, `bundle_completion`,
//!   `file_completion` from the download engine (§4.5).
//! - [`upload`](../upload/index.html) fires `slot_type` (§4.6.1).
//! - [`hub`](../hub/index.html) fires `outgoing_private_message` and
//!   `incoming_chat_message`.

/// The generic [`Hook`]/[`Listener`] primitives.
pub mod bus;
/// Concrete payload types and the two registries that collect them.
pub mod events;

pub use bus::{Hook, Listener, Rejection, SubscriberId};
pub use events::{HookRegistry, ListenerRegistry};
