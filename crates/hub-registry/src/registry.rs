//! The process-wide set of live hub sessions (§3.5, §4.2), keyed by hub
//! URL: the half of the reference implementation's `ClientManager` that
//! owns hub connections rather than drives transfers or hooks - those stay
//! in `connmgr`/`queue`/`upload` and `hooks` respectively.

use crate::error::HubRegistryError;
use core::Clock;
use dashmap::DashMap;
use hooks::events::{HookRegistry, ListenerRegistry};
use hub::{AdcHubSession, HubConfig, HubSession, NmdcHubSession};
use identity::{Cid, OnlineUser};
use parking_lot::Mutex;
use std::sync::Arc;

/// Which wire dialect a hub URL's scheme selects.
#[derive(Clone, Copy)]
enum Scheme {
    Adc,
    Nmdc,
}

impl Scheme {
    fn detect(hub_url: &str) -> Option<Self> {
        if hub_url.starts_with("adc://") || hub_url.starts_with("adcs://") {
            Some(Self::Adc)
        } else if hub_url.starts_with("dchub://") || hub_url.starts_with("nmdc://") {
            Some(Self::Nmdc)
        } else {
            None
        }
    }
}

struct Entry {
    session: Mutex<Box<dyn HubSession>>,
    config: HubConfig,
}

/// The set of hub sessions currently open, one per hub URL (§3.5's
/// "one `Client` per hub URL" rule).
///
/// A session is driven from whichever task owns its socket (§5), but
/// `connect_to_user`/favorite/search-fanout callers from other tasks need
/// to reach a specific hub or scan all of them, so each session sits
/// behind its own [`Mutex`] in a shared [`DashMap`] rather than a single
/// lock over the whole registry - two different hubs can be dispatched
/// into concurrently. §5's lock-order note places this registry's lock
/// below `queue`/`upload`/`download` and above the per-hub locks it hands
/// out, so callers must not hold one hub's lock while taking another's.
pub struct HubRegistry<C: Clock> {
    hooks: Arc<HookRegistry>,
    listeners: Arc<ListenerRegistry>,
    tokens: Arc<connmgr::TokenStore>,
    clock: Arc<C>,
    sessions: DashMap<String, Entry>,
}

impl<C: Clock> HubRegistry<C> {
    /// Creates an empty registry. `hooks`/`listeners`/`tokens`/`clock` are
    /// shared by every hub session this registry creates, mirroring how a
    /// single process has one hook bus, one token store, and one clock.
    #[must_use]
    pub fn new(hooks: Arc<HookRegistry>, listeners: Arc<ListenerRegistry>, tokens: Arc<connmgr::TokenStore>, clock: Arc<C>) -> Self {
        Self {
            hooks,
            listeners,
            tokens,
            clock,
            sessions: DashMap::new(),
        }
    }

    /// Creates and registers a new hub session for `config.hub_url`,
    /// choosing ADC or NMDC by URL scheme.
    ///
    /// # Errors
    ///
    /// Returns [`HubRegistryError::DuplicateHub`] if a session is already
    /// registered at this URL, or [`HubRegistryError::UnknownScheme`] if
    /// the URL doesn't start with `adc://`, `adcs://`, `dchub://`, or
    /// `nmdc://`.
    pub fn create_hub(&self, config: HubConfig) -> Result<(), HubRegistryError> {
        if self.sessions.contains_key(&config.hub_url) {
            return Err(HubRegistryError::DuplicateHub(config.hub_url.clone()));
        }
        let scheme = Scheme::detect(&config.hub_url).ok_or_else(|| HubRegistryError::UnknownScheme(config.hub_url.clone()))?;
        let hub_url = config.hub_url.clone();
        let session: Box<dyn HubSession> = match scheme {
            Scheme::Adc => Box::new(AdcHubSession::new(config.clone(), self.hooks.clone(), self.listeners.clone(), self.tokens.clone(), self.clock.clone())),
            Scheme::Nmdc => Box::new(NmdcHubSession::new(config.clone(), self.hooks.clone(), self.listeners.clone(), self.tokens.clone(), self.clock.clone())),
        };
        logging::info_log(|f| f.hub > 0, || format!("hub session created for {hub_url}"));
        self.sessions.insert(
            hub_url,
            Entry {
                session: Mutex::new(session),
                config,
            },
        );
        Ok(())
    }

    /// Tears down and drops the session registered at `hub_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HubRegistryError::UnknownHub`] if no session is
    /// registered there.
    pub fn remove_hub(&self, hub_url: &str, graceful: bool) -> Result<(), HubRegistryError> {
        let (_, entry) = self.sessions.remove(hub_url).ok_or_else(|| HubRegistryError::UnknownHub(hub_url.to_string()))?;
        entry.session.lock().disconnect(graceful);
        logging::info_log(|f| f.hub > 0, || format!("hub session removed for {hub_url}"));
        Ok(())
    }

    /// Moves the session at `hub_url` to `new_url`, preserving its
    /// configured nick/CID/share/slot settings: the hub-side counterpart
    /// of `IQUI`'s `RD` field and NMDC's `$ForceMove`, applied once the
    /// driver has already consumed the old session's
    /// [`hub::HubEffect::Redirect`] and closed its socket.
    ///
    /// # Errors
    ///
    /// Returns [`HubRegistryError::UnknownHub`] if no session is
    /// registered at `hub_url`, or [`HubRegistryError::DuplicateHub`] if
    /// one is already registered at `new_url`.
    pub fn redirect(&self, hub_url: &str, new_url: impl Into<String>) -> Result<(), HubRegistryError> {
        let new_url = new_url.into();
        if self.sessions.contains_key(&new_url) {
            return Err(HubRegistryError::DuplicateHub(new_url));
        }
        let (_, entry) = self.sessions.remove(hub_url).ok_or_else(|| HubRegistryError::UnknownHub(hub_url.to_string()))?;
        entry.session.lock().disconnect(false);
        let mut config = entry.config;
        config.hub_url = new_url;
        self.create_hub(config)
    }

    /// Whether a session is registered at `hub_url`.
    #[must_use]
    pub fn has_hub(&self, hub_url: &str) -> bool {
        self.sessions.contains_key(hub_url)
    }

    /// The number of hub sessions currently registered.
    #[must_use]
    pub fn hub_count(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no hub sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Every hub URL currently registered, for diagnostics and tests.
    pub fn hub_urls(&self) -> impl Iterator<Item = String> + '_ {
        self.sessions.iter().map(|entry| entry.key().clone())
    }

    /// Runs `f` against the session at `hub_url` while holding its lock,
    /// returning `None` if no session is registered there.
    pub fn with_hub<R>(&self, hub_url: &str, f: impl FnOnce(&mut dyn HubSession) -> R) -> Option<R> {
        let entry = self.sessions.get(hub_url)?;
        let mut session = entry.session.lock();
        Some(f(session.as_mut()))
    }

    /// Whether any registered hub session has reached
    /// [`hub::HubState::Normal`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.sessions.iter().any(|entry| entry.session.lock().state().is_normal())
    }

    /// Whether the session at `hub_url` has reached
    /// [`hub::HubState::Normal`]. Returns `false` if no session is
    /// registered there.
    #[must_use]
    pub fn is_active_hub(&self, hub_url: &str) -> bool {
        self.sessions.get(hub_url).is_some_and(|entry| entry.session.lock().state().is_normal())
    }

    /// The hub URLs on which `cid` currently has an online roster entry,
    /// the multi-hub aggregate `findOnlineUser`/`getOnlineUsers` provide in
    /// the reference implementation - a [`User`](identity::User) can be
    /// online on several hubs simultaneously.
    #[must_use]
    pub fn hubs_with_user(&self, cid: Cid) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|entry| entry.session.lock().find_by_cid(cid).is_some())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Runs `f` against the [`OnlineUser`] roster entry for `cid` on
    /// `hub_url`, returning `None` if no session is registered there or
    /// the user isn't currently on its roster. Use [`Self::hubs_with_user`]
    /// first when the caller doesn't already have a hub hint, mirroring
    /// `findOnlineUser`'s `allowFallback` scan across every hub.
    pub fn with_online_user<R>(&self, hub_url: &str, cid: Cid, f: impl FnOnce(&OnlineUser) -> R) -> Option<R> {
        let entry = self.sessions.get(hub_url)?;
        let session = entry.session.lock();
        session.find_by_cid(cid).map(f)
    }
}
