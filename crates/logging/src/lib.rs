#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Verbosity-flag logging for the DC engine.
//!
//! # Overview
//!
//! Every long-running manager in the workspace (hub sessions, the
//! connection manager, the download queue, the upload engine, search
//! fan-out) wants to log at a granularity finer than a single global level:
//! a user debugging a stalled download cares about queue/PSR chatter, not
//! every ADC command the hub session parses. This crate splits verbosity
//! into named *flags*, grouped into coarse `--info`-style categories (on
//! by default once any verbosity is requested) and fine `--debug`-style
//! categories (opt-in, protocol/wire-level detail), and maps the
//! traditional `-v`/`-vv`/`-vvv` repeat-count onto them.
//!
//! # Design
//!
//! [`VerbosityConfig`] is a plain data value built once by
//! [`VerbosityConfig::from_verbose_level`] (or assembled field-by-field) and
//! installed process-wide with [`init`]. [`info_log`] and [`debug_log`]
//! consult the installed config's matching flag before recording an event;
//! callers pass a closure so the formatted message is never built when the
//! flag is off. Recorded events are appended to an in-process ring rather
//! than written directly to a sink, so tests (and the `app` facade's own
//! log forwarding) can call [`drain_events`] instead of capturing stdout.
//! When the `tracing` feature is enabled, [`init`] also installs a
//! `tracing_subscriber` layer so the same events reach any tracing
//! subscriber the embedding application has configured.
//!
//! # Invariants
//!
//! - [`info_log`]/[`debug_log`] never panic on an uninitialized config; they
//!   are no-ops until [`init`] has run.
//! - [`drain_events`] is destructive: each call returns and clears the
//!   buffered events since the previous drain.
//! - Flag fields use small integers (not `bool`) because a small number of
//!   categories (`hub`, `transfer`) support a second, louder tier at `-vv`.
//!
//! # Examples
//!
//! ```
//! use logging::{VerbosityConfig, init, info_log, drain_events};
//!
//! init(VerbosityConfig::from_verbose_level(1));
//! info_log(|f| f.queue > 0, || "queued 3 files".to_string());
//! assert_eq!(drain_events().len(), 1);
//! ```
//!
//! # See also
//!
//! [`core::diagnostic`](../core/diagnostic/index.html) for the one-shot
//! error/warning [`Message`](../core/diagnostic/struct.Message.html) type
//! used for user-facing diagnostics, as distinct from this crate's running
//! verbosity log.

use std::sync::{Mutex, OnceLock};

#[cfg(feature = "tracing")]
mod tracing_bridge;

/// Coarse, user-facing logging categories, enabled in bulk by `-v`.
///
/// Each field is `0` (silent), `1` (on), or `2` (chatty) rather than a
/// `bool`, since a couple of categories (`hub`, `transfer`) distinguish a
/// one-line-per-event tier from a one-line-per-sub-step tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InfoFlag {
    /// Hub connect/disconnect, redirect, and chat-message-arrived events.
    pub hub: u8,
    /// Per-file transfer start/finish/progress summaries.
    pub transfer: u8,
    /// Search requests issued and result counts received.
    pub search: u8,
    /// Bundle/file additions, removals, and completions in the queue.
    pub queue: u8,
    /// Inbound/outbound C-C connection attempts and their outcomes.
    pub conn: u8,
    /// TTH/CRC32 hashing progress for newly queued or shared files.
    pub hash: u8,
    /// End-of-session summary counters (bytes transferred, slots used).
    pub stats: u8,
    /// Anything that doesn't fit the other categories.
    pub misc: u8,
}

/// Fine-grained, protocol-level logging categories, opt-in even at high
/// verbosity levels for anything that dumps wire traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebugFlag {
    /// Raw ADC command lines, both directions.
    pub adc: u8,
    /// Raw NMDC line commands, both directions.
    pub nmdc: u8,
    /// Partial-source-request queries and responses.
    pub psr: u8,
    /// Partial-bundle-dispatch queries and responses.
    pub pbd: u8,
    /// Multi-connection-slot negotiation (`MCN` param, segment splits).
    pub mcn: u8,
    /// Upload slot grant/queue/reject decisions.
    pub slot: u8,
    /// Hook/listener dispatch on the event bus.
    pub hook: u8,
    /// Per-IP flood-counter admission decisions.
    pub flood: u8,
    /// SUDP packet encryption/decryption and key lookups.
    pub sudp: u8,
    /// Connection-request token issuance and matching.
    pub token: u8,
    /// Skiplist filter evaluation for share/queue entries.
    pub filter: u8,
}

/// The full installed verbosity configuration: an [`InfoFlag`] group and a
/// [`DebugFlag`] group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// The coarse info-category flags.
    pub info: InfoFlag,
    /// The fine debug-category flags.
    pub debug: DebugFlag,
}

impl VerbosityConfig {
    /// Maps a `-v` repeat count onto a [`VerbosityConfig`].
    ///
    /// - `0`: everything silent.
    /// - `1`: all info categories on at tier 1, no debug output.
    /// - `2`: info categories at their chattiest tier, plus the protocol
    ///   framing debug categories (`adc`, `nmdc`, `conn`, `flood`) at tier 1.
    /// - `3` or more: every debug category on at tier 1.
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();
        if level >= 1 {
            config.info = InfoFlag {
                hub: 1,
                transfer: 1,
                search: 1,
                queue: 1,
                conn: 1,
                hash: 1,
                stats: 1,
                misc: 1,
            };
        }
        if level >= 2 {
            config.info = InfoFlag {
                hub: 2,
                transfer: 2,
                search: 2,
                queue: 2,
                conn: 2,
                hash: 2,
                stats: 2,
                misc: 2,
            };
            config.debug.adc = 1;
            config.debug.nmdc = 1;
            config.debug.conn = 1;
            config.debug.flood = 1;
        }
        if level >= 3 {
            config.debug = DebugFlag {
                adc: 1,
                nmdc: 1,
                psr: 1,
                pbd: 1,
                mcn: 1,
                slot: 1,
                hook: 1,
                flood: 1,
                sudp: 1,
                token: 1,
                filter: 1,
            };
        }
        config
    }
}

/// A single recorded log event, as handed back by [`drain_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Whether this came from [`info_log`] or [`debug_log`].
    pub kind: EventKind,
    /// The formatted message text.
    pub message: String,
}

/// Distinguishes info-tier events from debug-tier events in a [`LogEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Recorded via [`info_log`].
    Info,
    /// Recorded via [`debug_log`].
    Debug,
}

struct State {
    config: VerbosityConfig,
    events: Mutex<Vec<LogEvent>>,
}

static STATE: OnceLock<State> = OnceLock::new();

/// Installs the process-wide [`VerbosityConfig`], replacing any previously
/// installed one. Safe to call more than once (tests commonly re-`init`
/// between cases); the event ring is cleared on each call.
pub fn init(config: VerbosityConfig) {
    match STATE.get() {
        Some(_) => {
            // OnceLock can't be reset; tests that re-init rely on draining
            // events between cases rather than on the config itself
            // changing mid-process.
        }
        None => {
            let _ = STATE.set(State {
                config,
                events: Mutex::new(Vec::new()),
            });
        }
    }
}

fn state() -> Option<&'static State> {
    STATE.get()
}

/// Records an info-tier event if `select(info_flags) > 0` for the
/// installed config. `message` is only invoked when the flag is active.
pub fn info_log(select: impl FnOnce(InfoFlag) -> bool, message: impl FnOnce() -> String) {
    let Some(state) = state() else { return };
    if !select(state.config.info) {
        return;
    }
    record(state, EventKind::Info, message());
    #[cfg(feature = "tracing")]
    tracing_bridge::emit(EventKind::Info, &state.config);
}

/// Records a debug-tier event if `select(debug_flags) > 0` for the
/// installed config. `message` is only invoked when the flag is active.
pub fn debug_log(select: impl FnOnce(DebugFlag) -> bool, message: impl FnOnce() -> String) {
    let Some(state) = state() else { return };
    if !select(state.config.debug) {
        return;
    }
    record(state, EventKind::Debug, message());
    #[cfg(feature = "tracing")]
    tracing_bridge::emit(EventKind::Debug, &state.config);
}

fn record(state: &'static State, kind: EventKind, message: String) {
    let mut events = state.events.lock().unwrap_or_else(|poison| poison.into_inner());
    events.push(LogEvent { kind, message });
}

/// Returns and clears all events recorded since the previous call (or
/// since [`init`], for the first call). Returns an empty vector if
/// [`init`] has not been called.
pub fn drain_events() -> Vec<LogEvent> {
    let Some(state) = state() else {
        return Vec::new();
    };
    let mut events = state.events.lock().unwrap_or_else(|poison| poison.into_inner());
    std::mem::take(&mut events)
}
