//! The two hook shapes described in §4.8: a vetoing, synchronous
//! [`Hook`] and an observe-only, best-effort [`Listener`].

use parking_lot::RwLock;
use std::sync::Arc;

/// Identifies one subscriber registration so it can be removed later.
/// Opaque to callers beyond equality - typically a crate/feature name like
/// `"sfv-verify"` or `"share-index"`.
pub type SubscriberId = String;

/// A structured rejection from a validation [`Hook`] subscriber (§4.8):
/// which hook fired, a short machine-readable reason, and a human-readable
/// message. Propagated to the caller and, where the spec calls for it
/// (`hook_error` on a `QueueFile`/`Bundle`), stored verbatim for later
/// display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    /// Which hook point raised the rejection (e.g. `"bundle_completion"`).
    pub hook_id: String,
    /// A short, stable reason code (e.g. `"missing"`, `"crc_mismatch"`).
    pub reason_id: String,
    /// A human-readable explanation surfaced to the UI/log.
    pub message: String,
}

impl Rejection {
    /// Builds a rejection.
    #[must_use]
    pub fn new(
        hook_id: impl Into<String>,
        reason_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            hook_id: hook_id.into(),
            reason_id: reason_id.into(),
            message: message.into(),
        }
    }
}

/// A synchronous, vetoing extension point (§4.8).
///
/// Every subscriber runs in registration order; the first [`Rejection`]
/// short-circuits the remaining subscribers and is returned to the caller.
/// Subscribers that don't reject contribute their `O` payload to the
/// aggregated result, mirroring "reject short-circuits; data payloads are
/// accumulated."
pub struct Hook<I, O> {
    name: &'static str,
    subscribers: RwLock<Vec<(SubscriberId, Arc<dyn Fn(&I) -> Result<O, Rejection> + Send + Sync>)>>,
}

impl<I, O> Hook<I, O> {
    /// Names a new, empty hook point. `name` is used as `hook_id` in any
    /// [`Rejection`] a subscriber builds without naming itself explicitly.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// The hook point's name, as used in [`Rejection::hook_id`].
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Registers a subscriber under `id`, replacing any previous
    /// registration with the same id.
    pub fn subscribe(
        &self,
        id: impl Into<SubscriberId>,
        callback: impl Fn(&I) -> Result<O, Rejection> + Send + Sync + 'static,
    ) {
        let id = id.into();
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|(existing, _)| existing != &id);
        subscribers.push((id, Arc::new(callback)));
    }

    /// Removes the subscriber registered under `id`, if any. Removing a
    /// subscriber that was never registered is not an error (§4.8).
    pub fn unsubscribe(&self, id: &str) {
        self.subscribers.write().retain(|(existing, _)| existing != id);
    }

    /// Runs every subscriber against `input` in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first [`Rejection`] encountered, skipping any
    /// subscribers after it.
    pub fn fire(&self, input: &I) -> Result<Vec<O>, Rejection> {
        let subscribers = self.subscribers.read().clone();
        let mut results = Vec::with_capacity(subscribers.len());
        for (_, callback) in subscribers {
            results.push(callback(input)?);
        }
        Ok(results)
    }

    /// The number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

/// An observe-only extension point (§4.8). Listeners never veto and never
/// block the caller on each other's failures - there is no failure mode,
/// since a listener callback returns nothing.
pub struct Listener<E> {
    subscribers: RwLock<Vec<(SubscriberId, Arc<dyn Fn(&E) + Send + Sync>)>>,
}

impl<E> Default for Listener<E> {
    fn default() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }
}

impl<E> Listener<E> {
    /// Creates an empty listener.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber under `id`, replacing any previous
    /// registration with the same id.
    pub fn subscribe(&self, id: impl Into<SubscriberId>, callback: impl Fn(&E) + Send + Sync + 'static) {
        let id = id.into();
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|(existing, _)| existing != &id);
        subscribers.push((id, Arc::new(callback)));
    }

    /// Removes the subscriber registered under `id`, if any.
    pub fn unsubscribe(&self, id: &str) {
        self.subscribers.write().retain(|(existing, _)| existing != id);
    }

    /// Delivers `event` to every subscriber in registration order.
    /// Best-effort: a subscriber has no way to signal failure back.
    pub fn emit(&self, event: &E) {
        let subscribers = self.subscribers.read().clone();
        for (_, callback) in subscribers {
            callback(event);
        }
    }

    /// The number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
