#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `app` is the process composition root (§9): it owns one [`state::App`]
//! value wiring together every other crate's manager, and the thin async
//! drivers that actually move bytes - dialing and accepting C-C
//! connections, running each hub's socket loop, reloading the persisted
//! queue at start-up, and the recurring one-second maintenance tick.
//!
//! # Design
//!
//! Every manager in this workspace (`queue::QueueManager`,
//! `hub_registry::HubRegistry`, `search::SearchManager`, ...) is a pure
//! state machine that queues typed effects rather than touching a socket
//! or a clock directly. `app` is where those effects meet the network:
//! [`net`] resolves a hub URL's wire scheme and dials it,
//! [`connect`] negotiates outbound/inbound C-C connections
//! (`connmgr::listener::negotiate`), [`hub_task`] drives one hub's line
//! socket for the process lifetime, [`startup`] reloads the on-disk queue
//! and joins every configured hub, [`tick`] runs the recurring
//! maintenance pass, and [`shutdown`] flushes and tears everything back
//! down.
//!
//! `app` deliberately stops at connection establishment and role
//! resolution for C-C sockets - see [`connect`]'s module doc - rather
//! than inventing a wire-level GET/SND byte-transfer pump this workspace
//! has no grounding for anywhere else.
//!
//! # Invariants
//!
//! - A [`state::App`] is constructed once per process and shared by
//!   `Arc` with every task it spawns; nothing clones a manager out from
//!   under it.
//! - [`startup::reload_queue`] runs before [`startup::join_configured_hubs`]
//!   so restored bundles exist before a hub session can offer alternate
//!   sources against them.
//! - [`shutdown::run`] flushes every dirty bundle before disconnecting any
//!   hub, so a crash during hub teardown never loses queue state that was
//!   already due to be saved.
//!
//! # Examples
//!
//! ```ignore
//! use app::config::AppConfig;
//! use app::state::App;
//! use core::clock::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn run(share: Arc<dyn upload::ShareResolver>) {
//! let config = AppConfig::default();
//! let app = Arc::new(App::new(config, Arc::new(SystemClock::new()), share));
//! app::startup::reload_queue(&app);
//! let handles = app::startup::join_configured_hubs(&app);
//! // ... run the process until asked to stop ...
//! app::shutdown::run(&app, handles).await;
//! # }
//! ```
//!
//! # See also
//!
//! - [`hub_registry`](../hub_registry/index.html), whose `HubRegistry` is
//!   what [`hub_task`] and [`tick`] drive.
//! - [`connmgr`](../connmgr/index.html), whose `listener::negotiate` and
//!   `handshake::Handshake` back [`connect`].
//! - [`persistence`](../persistence/index.html), read and written by
//!   [`startup::reload_queue`] and [`tick::run_once`]/[`shutdown::run`].

/// Process configuration (§6, §9).
pub mod config;
/// Outbound dial, inbound accept, and C-C handshake execution.
pub mod connect;
/// Process-level errors.
pub mod error;
/// Per-hub socket loop.
pub mod hub_task;
/// Wire scheme detection and transport dialing.
pub mod net;
/// Graceful shutdown.
pub mod shutdown;
/// Start-up: queue reload and hub join.
pub mod startup;
/// The top-level [`App`] value.
pub mod state;
/// The recurring one-second maintenance pass.
pub mod tick;

pub use config::AppConfig;
pub use error::AppError;
pub use state::App;
