//! The top-level [`App`] value (§9: "Replace [global mutable singletons]
//! with a single `App` value constructed at start-up that owns each
//! subsystem; cross-subsystem references are immutable handles obtained
//! from `App`").

use crate::config::AppConfig;
use connmgr::{FloodCounter, McnTracker, TokenStore};
use core::Clock;
use filters::Skiplist;
use hooks::{HookRegistry, ListenerRegistry};
use hub_registry::HubRegistry;
use identity::Registry as IdentityRegistry;
use persistence::BundleStore;
use queue::persist::SaveScheduler;
use queue::QueueManager;
use search::SearchManager;
use std::sync::Arc;
use upload::{ShareResolver, UploadManager};

/// Every subsystem the spec names, composed behind one value. Nothing
/// above `App` reaches a manager except through a field or method here -
/// there is no other way to get at a [`QueueManager`] or a
/// [`HubRegistry`] in this workspace.
///
/// Generic over [`Clock`] so a test can drive every subsystem's timers
/// from one shared [`core::clock::FakeClock`] deterministically (the same
/// reason every manager below it takes the same type parameter).
pub struct App<C: Clock> {
    /// The configuration this app was built from.
    pub config: AppConfig,
    pub(crate) clock: Arc<C>,
    /// The hook/event bus every validating and observing extension point
    /// shares (§4.8, L11).
    pub hooks: Arc<HookRegistry>,
    /// The listener half of the hook/event bus.
    pub listeners: Arc<ListenerRegistry>,
    /// The C-C connection token store (§4.4, `tokens.cs`).
    pub tokens: Arc<TokenStore>,
    /// The process-wide `CID -> User` registry (§3.2, L3).
    pub identity: Arc<IdentityRegistry<C>>,
    /// The set of live hub sessions (§3.5, L5).
    pub hubs: Arc<HubRegistry<C>>,
    /// Per-IP inbound C-C flood admission (§4.4, §5).
    pub flood: Arc<FloodCounter<C>>,
    /// Per-user MCN sub-connection accounting, shared between `connmgr`'s
    /// handshake layer and `upload`'s slot classifier (§4.4, §4.6.2).
    pub mcn: Arc<McnTracker>,
    /// The download engine (§4.5, L8).
    pub queue: Arc<QueueManager<C>>,
    /// The upload engine (§4.6, L9).
    pub upload: Arc<UploadManager<C>>,
    /// Search fan-out, SUDP keys, and UDP result routing (§4.7, L6).
    pub search: Arc<SearchManager<C>>,
    /// The on-disk per-bundle XML store (§4.5.10, L10).
    pub bundle_store: BundleStore,
    /// The debounced per-bundle save scheduler.
    pub save_scheduler: SaveScheduler<C>,
}

impl<C: Clock> App<C> {
    /// Wires every subsystem from `config`, sharing one clock and one
    /// hook/listener registry pair across all of them. Does not yet join
    /// any hub or load the queue store - see [`crate::startup`].
    #[must_use]
    pub fn new(config: AppConfig, clock: Arc<C>, share: Arc<dyn ShareResolver>) -> Self {
        let hooks = Arc::new(HookRegistry::new());
        let listeners = Arc::new(ListenerRegistry::new());
        let tokens = Arc::new(TokenStore::new());
        let identity = Arc::new(IdentityRegistry::new(Arc::clone(&clock)));
        let hubs = Arc::new(HubRegistry::new(Arc::clone(&hooks), Arc::clone(&listeners), Arc::clone(&tokens), Arc::clone(&clock)));
        let (minor, severe) = config.flood_thresholds;
        let flood = Arc::new(FloodCounter::new(Arc::clone(&clock), minor, severe));
        let mcn = Arc::new(McnTracker::new(config.mcn_per_user_ceiling));

        let skiplist = compile_skiplist(&config.skiplist_patterns);
        let queue = Arc::new(QueueManager::new(Arc::clone(&clock), Arc::clone(&hooks), Arc::clone(&listeners), skiplist));

        let mini_slot_glob = compile_skiplist(&config.mini_slot_patterns);
        let upload = Arc::new(UploadManager::new(
            Arc::clone(&clock),
            Arc::clone(&hooks),
            Arc::clone(&listeners),
            share,
            Some(Arc::clone(&queue)),
            Arc::clone(&mcn),
            config.slots,
            mini_slot_glob,
        ));

        let search = Arc::new(SearchManager::new(Arc::clone(&clock)));
        let bundle_store = BundleStore::new(config.queue_dir.clone());
        let save_scheduler = SaveScheduler::new(Arc::clone(&clock));

        Self {
            config,
            clock,
            hooks,
            listeners,
            tokens,
            identity,
            hubs,
            flood,
            mcn,
            queue,
            upload,
            search,
            bundle_store,
            save_scheduler,
        }
    }

    /// The clock this app (and therefore every subsystem built from it)
    /// was constructed with.
    #[must_use]
    pub fn clock(&self) -> &Arc<C> {
        &self.clock
    }
}

/// Compiles a glob pattern list into a [`Skiplist`], falling back to an
/// empty (match-nothing) skiplist and logging rather than failing app
/// construction over one malformed pattern a settings UI should have
/// rejected already.
fn compile_skiplist(patterns: &[String]) -> Skiplist {
    match Skiplist::new(patterns) {
        Ok(skiplist) => skiplist,
        Err(error) => {
            logging::info_log(|f| f.queue > 0, || format!("ignoring malformed skiplist configuration: {error}"));
            Skiplist::empty()
        }
    }
}
