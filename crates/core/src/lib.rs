#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `core` holds the handful of things every other crate in this workspace
//! needs: a structured diagnostic [`Message`] type used to surface hook
//! rejections and protocol/transfer errors to the caller in a consistent
//! shape, a [`Clock`] abstraction so the one-second and one-minute timer
//! ticks described by the concurrency model can be driven deterministically
//! in tests, and a couple of small string/byte helpers (ADC escaping) reused
//! by the codec and identifier crates.
//!
//! # Design
//!
//! Nothing here knows about hubs, bundles, or sockets. Higher crates build
//! their own error enums (one `thiserror` enum per crate, per the workspace
//! convention) and convert into [`Message`] only at the boundary where a
//! human or a hook subscriber needs to see the failure, the same way the
//! hook bus in `hooks` turns a rejected validation into a `{hook_id,
//! rejection_id, message}` tuple.
//!
//! # Invariants
//!
//! - [`Message`] never allocates more than once per render.
//! - [`Clock::now_ms`] is monotonic for any single [`Clock`] instance.
//!
//! # Examples
//!
//! ```
//! use core::{dc_error, diagnostic::Severity};
//!
//! let message = dc_error!("file target already exists");
//! assert_eq!(message.severity(), Severity::Error);
//! assert!(message.to_string().contains("file target already exists"));
//! ```
//!
//! # See also
//!
//! - `protocol` for the ADC/NMDC wire codec, the first consumer of
//!   [`dc_error!`].
//! - `hooks` for the hook/event bus that forwards [`Message`] to
//!   subscribers verbatim.

/// Source-location-carrying diagnostic message type shared by every crate's
/// error boundary.
pub mod diagnostic;

/// Monotonic clock abstraction used for timer ticks, rate limiting, and
/// auto-priority scheduling.
pub mod clock;

/// Small string/byte helpers (ADC escaping) shared by the codec and
/// identifier crates.
pub mod text;

#[doc(hidden)]
pub mod macros;

pub use clock::{Clock, SystemClock};
pub use diagnostic::{Message, Severity, SourceLocation};
