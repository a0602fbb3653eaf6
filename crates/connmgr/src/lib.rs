#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `connmgr` is the L7 layer (§4.4): everything about a single
//! client-to-client socket that isn't the protocol codec itself or the
//! bytes of a transfer. It mints and tracks the tokens `CTM`/`RCM`
//! exchanges carry, drives the ADC handshake (`CSUP`→`CINF`) that
//! resolves a freshly opened socket to a download, upload, or PM role,
//! enforces per-IP inbound flood limits, and tracks per-user MCN
//! (`MCN1`) connection fan-out.
//!
//! # Design
//!
//! [`token::TokenStore`] is the single source of truth for "what is this
//! token for" (§5 `tokens.cs`); [`handshake::Handshake`] is a small state
//! machine per connection that consumes `CSUP`/`CINF` and resolves a
//! [`handshake::Role`] by looking the token up there. [`flood::FloodCounter`]
//! is a per-IP sliding-window admission check run before a handshake is
//! even attempted. [`mcn::McnTracker`] keeps the `multi_uploads`/
//! `multi_downloads` counts the upload and download engines consult before
//! opening another sub-connection to an already-connected user.
//! [`listener::negotiate`] wires protocol sniffing, the token store, and
//! the handshake state machine together over one socket.
//!
//! # Invariants
//!
//! - `TokenStore::remove(t)` followed by `create`/`expect` reusing `t` is
//!   allowed (§8 property 9); a token is never handed out to two
//!   purposes at once.
//! - A handshake's state only ever advances; a failed verification moves
//!   it to [`handshake::ConnState::Failed`] and it is never resumed.
//! - A user is never disconnected below their first MCN slot by the
//!   rebalance pass (§4.6.2).
//!
//! # Examples
//!
//! ```
//! use connmgr::token::{ConnType, TokenStore};
//!
//! let tokens = TokenStore::new();
//! let token = tokens.create(ConnType::Download);
//! assert!(tokens.has_token(&token, ConnType::Download));
//! ```
//!
//! # See also
//!
//! - [`transport`](../transport/index.html) for the line/length socket
//!   types a negotiated connection hands off to.
//! - [`protocol`](../protocol/index.html) for the ADC command codec and
//!   prologue sniffer this crate drives.
//! - [`queue`](../queue/index.html) and [`upload`](../upload/index.html)
//!   for the engines that request tokens and consume negotiated
//!   connections.

/// Per-IP inbound connection flood control.
pub mod flood;
/// The per-connection ADC handshake state machine.
pub mod handshake;
/// Accepting and negotiating freshly opened sockets.
pub mod listener;
/// Multi-channel (MCN1) per-user connection accounting.
pub mod mcn;
/// The C-C connection token store.
pub mod token;

pub use flood::{FloodCounter, FloodVerdict};
pub use handshake::{ConnState, Handshake, HandshakeError, Role};
pub use listener::{negotiate, NegotiatedConnection, NegotiationError};
pub use mcn::{Direction, McnTracker};
pub use token::{ConnType, TokenStore};
