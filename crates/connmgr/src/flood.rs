//! Per-IP inbound connection flood control (§4.4, §5).

use core::clock::Clock;
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;

const DEFAULT_WINDOW_MS: u64 = 60_000;

/// The outcome of a flood-control admission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloodVerdict {
    /// Below the minor threshold - accept normally.
    Admit,
    /// At or above the minor threshold but below severe - accept, but the
    /// caller may want to log more aggressively.
    Minor,
    /// At or above the severe threshold - reject the socket immediately.
    Severe,
}

struct Counter {
    hits: Vec<u64>,
}

/// Tracks inbound connection attempts per source IP over a sliding
/// window, admitting, warning, or rejecting per §4.4's minor/severe
/// threshold pair.
pub struct FloodCounter<C: Clock> {
    clock: Arc<C>,
    window_ms: u64,
    minor_threshold: usize,
    severe_threshold: usize,
    counters: DashMap<IpAddr, Counter>,
}

impl<C: Clock> FloodCounter<C> {
    /// Creates a flood counter with the default 60 s window.
    #[must_use]
    pub fn new(clock: Arc<C>, minor_threshold: usize, severe_threshold: usize) -> Self {
        Self { clock, window_ms: DEFAULT_WINDOW_MS, minor_threshold, severe_threshold, counters: DashMap::new() }
    }

    /// Records an inbound attempt from `addr` and returns the resulting
    /// verdict for this accept.
    pub fn record(&self, addr: IpAddr) -> FloodVerdict {
        let now = self.clock.now_ms();
        let mut entry = self.counters.entry(addr).or_insert_with(|| Counter { hits: Vec::new() });
        entry.hits.retain(|&tick| now.saturating_sub(tick) < self.window_ms);
        entry.hits.push(now);
        let count = entry.hits.len();
        if count >= self.severe_threshold {
            FloodVerdict::Severe
        } else if count >= self.minor_threshold {
            FloodVerdict::Minor
        } else {
            FloodVerdict::Admit
        }
    }
}
