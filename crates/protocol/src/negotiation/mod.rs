//! Sniffing which protocol a freshly accepted socket is speaking.

pub mod detect;
#[cfg(feature = "async")]
pub mod sniffer;

pub use detect::{detect_prologue, Detection};
#[cfg(feature = "async")]
pub use sniffer::{Prefixed, PrologueSniffer};
