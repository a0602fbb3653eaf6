//! Per-hub search fan-out, cancellation, and incoming result routing
//! (§4.7).

use crate::key_store::KeyStore;
use crate::query::SearchQuery;
use crate::sudp::SudpKey;
use crate::token::{SearchToken, SearchTokenGenerator};
use core::clock::Clock;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// ADC hubs enforce roughly a 5 s minimum interval between outgoing
/// searches from the same client (§4.7).
const ADC_MIN_SEARCH_INTERVAL_MS: u64 = 5_000;

/// A search awaiting replies, tracked so `cancel_search(owner)` can tear
/// it down across every hub it was sent to and so an incoming `URES` can
/// be matched back to its originating query.
#[derive(Clone, Debug)]
pub struct PendingSearch {
    /// The token issued for this search.
    pub token: SearchToken,
    /// The caller-supplied owner tag, used by [`SearchManager::cancel_search`].
    pub owner: String,
    /// The query that was issued.
    pub query: SearchQuery,
}

struct HubQueue {
    pending_tokens: VecDeque<SearchToken>,
    last_dispatch_tick: Option<u64>,
}

impl HubQueue {
    fn new() -> Self {
        Self { pending_tokens: VecDeque::new(), last_dispatch_tick: None }
    }
}

/// One incoming search result, decrypted and routed.
#[derive(Clone, Debug)]
pub enum IncomingSearchEvent {
    /// A `URES` matched against an outstanding [`PendingSearch`].
    Result { token: SearchToken, payload: Vec<u8> },
    /// A `URES` whose token matched nothing we're tracking (late reply
    /// after local cancellation, or a token we never issued).
    UnmatchedResult { payload: Vec<u8> },
    /// A `USCH` search request from a passive-hub peer, to be matched
    /// against our own share and answered with a `URES` (share matching
    /// itself is outside this crate, §1 scope).
    IncomingRequest { payload: Vec<u8> },
}

/// Owns the outgoing per-hub search queues, the SUDP key cache, and
/// incoming UDP result routing.
pub struct SearchManager<C: Clock> {
    clock: Arc<C>,
    tokens: SearchTokenGenerator,
    pub(crate) pending: DashMap<u32, PendingSearch>,
    hub_queues: DashMap<String, parking_lot::Mutex<HubQueue>>,
    key_store: KeyStore<C>,
}

impl<C: Clock> SearchManager<C> {
    /// Creates an empty search manager driven by `clock`.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        let key_store = KeyStore::new(Arc::clone(&clock));
        Self {
            clock,
            tokens: SearchTokenGenerator::new(),
            pending: DashMap::new(),
            hub_queues: DashMap::new(),
            key_store,
        }
    }

    /// Queues `query` to each of `hub_urls` under `owner`, returning the
    /// expected queue delay (ms) per hub so the caller can warn about
    /// overflow (§4.5.9).
    ///
    /// For hubs whose queue is SUDP-capable, a fresh key is generated and
    /// recorded; the caller is responsible for attaching its base32 form
    /// as the outgoing `KY` parameter.
    pub fn queue_search(
        &self,
        hub_urls: &[String],
        query: SearchQuery,
        owner: impl Into<String>,
        sudp_capable: bool,
    ) -> Vec<(String, u64)> {
        let owner = owner.into();
        let token = self.tokens.next();
        self.pending.insert(token.value(), PendingSearch { token, owner, query });

        if sudp_capable {
            self.key_store.insert(SudpKey::generate());
        }

        let now = self.clock.now_ms();
        hub_urls
            .iter()
            .map(|hub_url| {
                let entry = self.hub_queues.entry(hub_url.clone()).or_insert_with(|| parking_lot::Mutex::new(HubQueue::new()));
                let mut queue = entry.lock();
                queue.pending_tokens.push_back(token);
                let wait_ms = match queue.last_dispatch_tick {
                    Some(last) => {
                        let elapsed = now.saturating_sub(last);
                        ADC_MIN_SEARCH_INTERVAL_MS.saturating_sub(elapsed)
                    }
                    None => 0,
                };
                queue.last_dispatch_tick = Some(now + wait_ms);
                (hub_url.clone(), wait_ms)
            })
            .collect()
    }

    /// Removes every queued search tagged with `owner`, across every hub
    /// (§4.4 cancellation semantics, reused here for searches).
    pub fn cancel_search(&self, owner: &str) {
        let tokens_to_remove: Vec<u32> = self
            .pending
            .iter()
            .filter(|entry| entry.value().owner == owner)
            .map(|entry| *entry.key())
            .collect();
        for token in &tokens_to_remove {
            self.pending.remove(token);
        }
        for queue in &self.hub_queues {
            queue.value().lock().pending_tokens.retain(|token| !tokens_to_remove.contains(&(token.value())));
        }
    }

    /// The SUDP key cache, for decrypting incoming UDP search replies.
    #[must_use]
    pub fn key_store(&self) -> &KeyStore<C> {
        &self.key_store
    }

    /// Marks a hub's oldest queued search as dispatched, freeing it from
    /// the queue-depth accounting.
    pub fn mark_dispatched(&self, hub_url: &str) {
        if let Some(queue) = self.hub_queues.get(hub_url) {
            queue.lock().pending_tokens.pop_front();
        }
    }

    /// Routes a decrypted `URES`/`USCH` payload, matching a `URES`'s
    /// embedded token (parsed by the caller from the ADC command and
    /// passed here) against [`PendingSearch`]es.
    #[must_use]
    pub fn route_result(&self, token: Option<u32>, payload: Vec<u8>) -> IncomingSearchEvent {
        match token.and_then(|t| self.pending.get(&t).map(|entry| entry.value().token)) {
            Some(token) => IncomingSearchEvent::Result { token, payload },
            None => IncomingSearchEvent::UnmatchedResult { payload },
        }
    }
}
