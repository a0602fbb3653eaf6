use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A source of monotonic milliseconds, abstracted so the one-second/
/// one-minute timer ticks described in §5 of the spec (and the
/// PSR re-query pacing, auto-priority interval, and bandwidth limiter that
/// build on them) can be driven deterministically in tests instead of
/// sleeping on the wall clock.
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds elapsed since some fixed but unspecified epoch. Only
    /// differences between two calls on the same [`Clock`] are meaningful.
    fn now_ms(&self) -> u64;
}

/// The default [`Clock`], backed by [`std::time::Instant`].
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Creates a new clock anchored to the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// A [`Clock`] whose value is advanced explicitly, used by tests that need
/// to simulate the passage of the `SEGMENT_TIME`/`AUTOPRIO_INTERVAL`/PSR
/// pacing windows without sleeping.
#[derive(Debug, Default)]
pub struct FakeClock {
    millis: AtomicU64,
}

impl FakeClock {
    /// Creates a fake clock starting at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by `delta_ms` milliseconds.
    pub fn advance(&self, delta_ms: u64) {
        self.millis.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute millisecond value.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}
