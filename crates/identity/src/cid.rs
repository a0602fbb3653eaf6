//! The client identifier (§3.1): a 192-bit Tiger hash, stable across
//! sessions, primary user identity.

use checksums::tth::{hash_leaf, Tiger192};

/// A client identifier. Reuses [`Tiger192`] - CID and TTH are the same
///192-bit Tiger digest shape, differing only in what bytes produced them.
pub type Cid = Tiger192;

/// Derives the synthetic CID NMDC users are assigned so they can share the
/// process-wide [`crate::User`] map with ADC users (§4.2.3): the Tiger hash
/// of `lowercase(nick) || lowercase(hub_url)`, single-block THEX-leaf-hashed
/// since no real CID exists on that network.
#[must_use]
pub fn synthetic_nmdc_cid(nick: &str, hub_url: &str) -> Cid {
    let mut input = nick.to_lowercase().into_bytes();
    input.extend(hub_url.to_lowercase().into_bytes());
    hash_leaf(&input)
}
