//! ADC's parameter escaping: `\s` for space, `\n` for newline, `\\` for a
//! literal backslash. No other byte needs escaping.
//!
//! The actual substitution lives in `core::text` so that `identity`'s
//! synthetic CID derivation and `persistence`'s XML writer can reuse it
//! without depending on the rest of this codec.

pub use core::text::{escape, unescape};
