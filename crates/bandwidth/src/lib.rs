#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! # Overview
//!
//! `bandwidth` centralises parsing and pacing logic for the engine's
//! global upload/download rate limits (§4.4, "Flood and rate control"). The
//! crate exposes helpers for decoding user supplied bandwidth limits
//! together with a [`BandwidthLimiter`] state machine implementing a leaky
//! bucket. The upload and download engines each hold one limiter instance,
//! consulted on every socket write/read so a configured KiB/s cap holds
//! across all of that engine's concurrent transfers rather than per
//! connection.
//!
//! # Design
//!
//! - [`parse::parse_bandwidth_argument`] accepts textual rate specifications
//!   (binary/decimal suffixes, fractional values, and optional `+1`/`-1`
//!   adjustments) and returns either an optional limit in bytes per second
//!   or a [`BandwidthParseError`].
//! - [`BandwidthLimiter`] implements the pacing algorithm shared by the
//!   upload engine's `SND` stream and the download engine's segment writer.
//!   It keeps track of the accumulated byte debt and sleeps long enough to
//!   honour the configured limit while coalescing short bursts to avoid
//!   excessive context switches.
//!
//! # Invariants
//!
//! - Parsed rates are always rounded to the nearest multiple of 1024 bytes
//!   per second.
//! - The limiter never sleeps for intervals shorter than 100ms.
//! - When the optional `test-support` feature is enabled (used by unit
//!   tests), sleep requests are recorded instead of reaching
//!   `std::thread::sleep`, keeping the tests deterministic and fast.
//!
//! # Examples
//!
//! Parse textual input and construct a limiter that bounds writes to 8 MiB/s.
//!
//! ```
//! use bandwidth::{parse_bandwidth_argument, BandwidthLimiter};
//!
//! let limit = parse_bandwidth_argument("8M").expect("valid limit")
//!     .expect("non-zero limit");
//! let mut limiter = BandwidthLimiter::new(limit);
//! let chunk = limiter.recommended_read_size(1 << 20);
//! assert!(chunk <= 1 << 20);
//! limiter.register(chunk);
//! ```
//!
//! # See also
//!
//! [`upload`](../upload/index.html) and [`queue`](../queue/index.html),
//! which each own one [`BandwidthLimiter`] for their respective transfer
//! direction.

mod limiter;
mod parse;

pub use crate::limiter::BandwidthLimiter;
#[cfg(any(test, feature = "test-support"))]
pub use crate::limiter::{RecordedSleepSession, recorded_sleep_session};
pub use crate::parse::{
    BandwidthLimitComponents, BandwidthParseError, parse_bandwidth_argument, parse_bandwidth_limit,
};
