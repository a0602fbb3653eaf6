//! A sliding 15-minute window of outgoing SUDP keys (§4.7).
//!
//! Every search we issue to an SUDP-capable hub mints a fresh key; a
//! reply may arrive late (the hub's own queueing, a slow peer), so keys
//! are kept around rather than discarded the moment the search that
//! minted them is answered. [`KeyStore::try_decrypt`] tries the newest
//! key first, matching §4.7's "insertion order most-recent-first".

use crate::sudp::{self, SudpError, SudpKey};
use core::clock::Clock;
use std::sync::Arc;

const KEY_TTL_MS: u64 = 15 * 60 * 1000;

struct Entry {
    key: SudpKey,
    added_tick: u64,
}

/// A clock-driven store of recently issued SUDP keys.
pub struct KeyStore<C: Clock> {
    clock: Arc<C>,
    entries: parking_lot::Mutex<Vec<Entry>>,
}

impl<C: Clock> KeyStore<C> {
    /// Creates an empty key store driven by `clock`.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self { clock, entries: parking_lot::Mutex::new(Vec::new()) }
    }

    /// Records a freshly minted key, most-recent first.
    pub fn insert(&self, key: SudpKey) {
        let added_tick = self.clock.now_ms();
        self.entries.lock().insert(0, Entry { key, added_tick });
    }

    /// Drops every key older than the 15-minute TTL.
    pub fn sweep_expired(&self) {
        let now = self.clock.now_ms();
        self.entries.lock().retain(|entry| now.saturating_sub(entry.added_tick) < KEY_TTL_MS);
    }

    /// Tries every non-expired key, newest first, against `packet`.
    /// Returns `None` (dropped silently, §9 "SUDP key TTL silent-drop")
    /// if no cached key decrypts it.
    pub fn try_decrypt(&self, packet: &[u8]) -> Result<Vec<u8>, SudpError> {
        self.sweep_expired();
        let entries = self.entries.lock();
        sudp::decrypt_with_any_key(entries.iter().map(|entry| &entry.key), packet)
            .ok_or(SudpError::BadPadding)
    }

    /// The number of keys currently retained (test/diagnostic use).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::clock::FakeClock;

    #[test]
    fn decrypts_with_the_matching_cached_key() {
        let clock = Arc::new(FakeClock::new());
        let store = KeyStore::new(Arc::clone(&clock));
        let key = SudpKey::generate();
        store.insert(key);

        let packet = sudp::encrypt(&key, b"$URES payload");
        let plaintext = store.try_decrypt(&packet).unwrap();
        assert_eq!(plaintext, b"$URES payload");
    }

    #[test]
    fn expired_key_is_dropped_silently() {
        let clock = Arc::new(FakeClock::new());
        let store = KeyStore::new(Arc::clone(&clock));
        let key = SudpKey::generate();
        store.insert(key);

        clock.advance(15 * 60 * 1000 + 1);
        let packet = sudp::encrypt(&key, b"late reply");
        assert!(store.try_decrypt(&packet).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn newest_key_wins_when_multiple_are_cached() {
        let clock = Arc::new(FakeClock::new());
        let store = KeyStore::new(Arc::clone(&clock));
        let older = SudpKey::generate();
        store.insert(older);
        clock.advance(1000);
        let newer = SudpKey::generate();
        store.insert(newer);

        let packet = sudp::encrypt(&newer, b"payload");
        assert_eq!(store.try_decrypt(&packet).unwrap(), b"payload");
    }
}
