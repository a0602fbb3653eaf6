//! Async-friendly wrapper around the synchronous [`bandwidth::BandwidthLimiter`].

use bandwidth::BandwidthLimiter;
use std::num::NonZeroU64;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A shared, cloneable handle to a per-connection [`BandwidthLimiter`].
///
/// `BandwidthLimiter::register` sleeps synchronously to enforce pacing;
/// [`RateLimiter::register`] runs that call on the blocking thread pool via
/// [`tokio::task::spawn_blocking`] so a throttled connection never parks an
/// async worker thread.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    inner: Arc<Mutex<BandwidthLimiter>>,
}

impl RateLimiter {
    /// Constructs a limiter enforcing `limit` bytes per second.
    #[must_use]
    pub fn new(limit: NonZeroU64) -> Self {
        Self { inner: Arc::new(Mutex::new(BandwidthLimiter::new(limit))) }
    }

    /// Constructs a limiter from an already-configured [`BandwidthLimiter`].
    #[must_use]
    pub fn from_limiter(limiter: BandwidthLimiter) -> Self {
        Self { inner: Arc::new(Mutex::new(limiter)) }
    }

    /// Updates the limiter's byte-per-second rate, taking effect on the
    /// next [`RateLimiter::register`] call.
    pub async fn update_limit(&self, limit: NonZeroU64) {
        self.inner.lock().await.update_limit(limit);
    }

    /// Returns the largest chunk of `buffer_len` bytes that should be
    /// written before the next [`RateLimiter::register`] call.
    pub async fn recommended_read_size(&self, buffer_len: usize) -> usize {
        self.inner.lock().await.recommended_read_size(buffer_len)
    }

    /// Records a completed write of `bytes`, sleeping off the blocking
    /// pool if the limiter has accumulated debt.
    pub async fn register(&self, bytes: usize) {
        if bytes == 0 {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = inner.blocking_lock();
            guard.register(bytes);
        })
        .await;
        if let Err(error) = result {
            logging::info_log(
                |f| f.conn > 0,
                || format!("rate limiter blocking task panicked: {error}"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recommended_read_size_never_exceeds_buffer() {
        let limiter = RateLimiter::new(NonZeroU64::new(1024).unwrap());
        let size = limiter.recommended_read_size(1 << 20).await;
        assert!(size <= 1 << 20);
        assert!(size > 0);
    }

    #[tokio::test]
    async fn register_zero_bytes_is_a_noop() {
        let limiter = RateLimiter::new(NonZeroU64::new(1024).unwrap());
        limiter.register(0).await;
    }

    #[tokio::test]
    async fn update_limit_changes_recommended_chunk() {
        let limiter = RateLimiter::new(NonZeroU64::new(1024).unwrap());
        let before = limiter.recommended_read_size(1 << 20).await;
        limiter.update_limit(NonZeroU64::new(10 * 1024 * 1024).unwrap()).await;
        let after = limiter.recommended_read_size(1 << 20).await;
        assert!(after >= before);
    }
}
