#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `compress` implements ADC's `ZLIG`/NMDC's `ZLIG`-extension stream
//! compression (§4.1, §4.6): a raw zlib/DEFLATE stream wrapped around file
//! list transmission and, when both peers advertise the feature, around
//! `SND`-framed file data. The upload and download engines and the hub
//! session's file-list exchange all compose the same encoder/decoder pair
//! rather than each rolling their own zlib wrapper.
//!
//! # Design
//!
//! The crate provides the [`zlib`] module, a streaming-friendly encoder and
//! decoder built on top of [`flate2`](https://docs.rs/flate2). The API
//! emphasises incremental processing: callers provide scratch buffers that
//! are filled with compressed or decompressed data while the internal state
//! tracks totals for diagnostics and progress reporting. The [`strategy`]
//! module wraps this behind a `CompressionStrategy` trait so callers that
//! need to select an algorithm at runtime (or plug in the optional `zstd`/
//! `lz4` strategies for non-wire use) don't match on an enum by hand.
//!
//! # Invariants
//!
//! - Encoders and decoders never allocate internal output buffers. All output is
//!   written into the caller-provided vectors, allowing upper layers to reuse
//!   storage across files.
//! - Streams are finalised explicitly via
//!   [`zlib::CountingZlibEncoder::finish`], which emits trailer bytes and
//!   reports the final compressed length.
//! - Errors from the underlying zlib implementation are surfaced as
//!   [`std::io::Error`] values to integrate with the rest of the workspace.
//!
//! # Errors
//!
//! The encoder and decoder functions return [`std::io::Result`]. When zlib
//! reports an error the helper wraps it in [`std::io::ErrorKind::Other`].
//!
//! # Examples
//!
//! Compressing and decompressing a buffer with the streaming encoder and
//! convenience helpers:
//!
//! ```
//! use compress::zlib::{CompressionLevel, CountingZlibEncoder, compress_to_vec, decompress_to_vec};
//!
//! # fn main() -> std::io::Result<()> {
//! let data = b"streaming example payload";
//! let mut encoder = CountingZlibEncoder::new(CompressionLevel::Default);
//! encoder.write(data)?;
//! let compressed_len = encoder.finish()?;
//! assert!(compressed_len > 0);
//!
//! let compressed = compress_to_vec(data, CompressionLevel::Default)?;
//! let decompressed = decompress_to_vec(&compressed)?;
//! assert_eq!(decompressed, data);
//! # Ok(())
//! # }
//! ```
//!
//! # See also
//!
//! - [`zlib`] for the zlib encoder/decoder implementation and API surface.
//! - [`skip_compress`] for the skiplist of already-compressed file
//!   extensions that skip the `ZLIG` wrapper entirely.
//! - [`upload`](../upload/index.html) and [`queue`](../queue/index.html),
//!   which negotiate `ZLIG` per the peer's advertised `SUP` features.

pub mod algorithm;
mod common;
#[cfg(feature = "lz4")]
pub mod lz4;
pub mod skip_compress;
pub mod strategy;
pub mod zlib;
#[cfg(feature = "zstd")]
pub mod zstd;

pub use common::CountingSink;
