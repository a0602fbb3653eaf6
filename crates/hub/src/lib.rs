#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `hub` is the L4 layer (§2, §4.2): per-hub connection, authentication,
//! roster maintenance, and the chat/search/connect operations every other
//! layer drives through a hub session. Both wire dialects the spec covers
//! are implemented behind one shared shape: [`adc::AdcHubSession`] speaks
//! ADC's `HSUP`/`BINF`/`IQUI` state machine (§4.2.1-§4.2.2) and
//! [`nmdc::NmdcHubSession`] speaks NMDC's `$Lock`/`$MyINFO`/`$Quit` line
//! protocol (§4.2.3), including the synthetic per-nick CID that lets an
//! NMDC peer share the same process-wide [`identity::User`] map as an ADC
//! one.
//!
//! # Design
//!
//! Neither session type touches a socket directly: [`session::HubSession`]
//! is the shared trait a thin async driver (in `app`) programs against,
//! and [`effect::HubEffect`] is the list of actions - write a line, open a
//! C-C connection, redirect, disconnect - that driver is expected to carry
//! out after each `dispatch_line`/`tick` call, mirroring the way
//! `connmgr::handshake` keeps protocol state separate from I/O. Both
//! session types share [`state::HubState`] (`PROTOCOL` → `IDENTIFY` →
//! `VERIFY` → `NORMAL`) even though the wire commands that drive the
//! transitions differ, and both resolve a `connect_to_user` request
//! through the wire-agnostic [`connect::decide_connect`].
//!
//! # Invariants
//!
//! - A session only ever reaches [`state::HubState::Normal`] after its own
//!   identity has been both assigned an address (SID for ADC, nick lock
//!   for NMDC) and acknowledged by the hub.
//! - `IQUI`/`$Quit` for our own identity always disconnects the whole
//!   session, never just removes a roster entry (§4.2.2).
//!
//! # Examples
//!
//! See [`adc`] and [`nmdc`] for worked session examples; both require a
//! [`core::Clock`], a [`hooks::HookRegistry`], a [`hooks::ListenerRegistry`]
//! and a [`connmgr::TokenStore`] at construction.
//!
//! # See also
//!
//! - [`hub-registry`](../hub_registry/index.html), which owns the set of
//!   live sessions this crate's types describe one of.
//! - [`connmgr`](../connmgr/index.html) for the C-C connections a
//!   `connect_to_user` call ultimately produces.
//! - [`search`](../search/index.html) for the query type `queue_search`
//!   renders onto the wire.

/// The ADC hub session state machine (§4.2.1-§4.2.2).
pub mod adc;
/// Per-hub connection configuration (§4.2).
pub mod config;
/// The wire-agnostic `connect_to_user` negotiation (§4.2.4).
pub mod connect;
/// `connect_to_user` error outcomes.
pub mod error;
/// Actions a hub session asks its driver to carry out (§5).
pub mod effect;
/// The NMDC hub session state machine (§4.2.3).
pub mod nmdc;
/// The live ADC/NMDC user rosters (§3.2, §4.2).
pub mod roster;
/// The shared `HubSession` trait both wire dialects implement.
pub mod session;
/// The shared `PROTOCOL`/`IDENTIFY`/`VERIFY`/`NORMAL` state machine.
pub mod state;

pub use adc::AdcHubSession;
pub use config::HubConfig;
pub use connect::{decide_connect, ConnectDecision, PeerConnectFacts};
pub use effect::HubEffect;
pub use error::ConnectError;
pub use nmdc::NmdcHubSession;
pub use session::HubSession;
pub use state::HubState;
