//! The C-C connection token store (§4.4).
//!
//! A token is a small random numeric string handed to a peer in `CTM`/
//! `RCM`/`DNAT` so the inbound connection it opens back to us can be
//! matched to the download/upload/PM it was created for, without racing
//! two concurrent connect attempts onto the same purpose.

use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;

/// What a token was minted for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnType {
    /// An outbound or inbound connection expected to serve a download.
    Download,
    /// An outbound or inbound connection expected to serve an upload.
    Upload,
    /// A CCPM private-message side channel.
    Pm,
}

/// A spinlock-protected store of live tokens (§4.4, §5 `tokens.cs`).
#[derive(Default)]
pub struct TokenStore {
    tokens: Mutex<HashMap<String, ConnType>>,
}

impl TokenStore {
    /// Creates an empty token store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh token unique within this store for `kind`.
    pub fn create(&self, kind: ConnType) -> String {
        let mut tokens = self.tokens.lock();
        loop {
            let candidate: u64 = rand::thread_rng().gen();
            let candidate = candidate.to_string();
            if let std::collections::hash_map::Entry::Vacant(slot) = tokens.entry(candidate.clone()) {
                slot.insert(kind);
                return candidate;
            }
        }
    }

    /// Records an expected inbound connection under an already-known
    /// token (the ADC-side analogue of `adcExpect`, used when `create`
    /// was called elsewhere, e.g. by the download engine before it asked
    /// the hub session to send `CTM`).
    pub fn expect(&self, token: impl Into<String>, kind: ConnType) {
        self.tokens.lock().insert(token.into(), kind);
    }

    /// Returns whether `token` is currently held, and for what purpose.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<ConnType> {
        self.tokens.lock().get(token).copied()
    }

    /// Whether `token` is held as `kind` specifically.
    #[must_use]
    pub fn has_token(&self, token: &str, kind: ConnType) -> bool {
        self.get(token) == Some(kind)
    }

    /// Releases `token`. A later `create`/`expect` may reuse the same
    /// string (§8 property 9: `remove(t); add(t)` is allowed).
    pub fn remove(&self, token: &str) {
        self.tokens.lock().remove(token);
    }

    /// The number of live tokens (diagnostic/test use).
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    /// Whether the store holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
