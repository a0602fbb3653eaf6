#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `protocol` implements the two wire command languages the engine speaks
//! with hubs and other clients: ADC's typed, SID-addressed command lines
//! (§4.1) and NMDC's older `$Command param|` line format (§4.2.3, §6.2).
//! Both protocols frame commands as `|`- or newline-terminated text over
//! the same TCP (and, for ADC search results, UDP) sockets that
//! `transport` manages; this crate only owns parsing, escaping, and
//! building those lines.
//!
//! # Design
//!
//! - [`adc`] covers the ADC command codec: [`adc::FourCc`] for the
//!   three-letter command codes, [`adc::escape`] for `\s`/`\n`/`\\`
//!   parameter escaping, [`adc::Command`] for the full addressed command
//!   line, and [`adc::status`] for the `STA` severity/error vocabulary.
//! - [`nmdc`] covers the NMDC line codec: [`nmdc::escape`] for `&`/`|`/`$`
//!   entity escaping and [`nmdc::Line`] for splitting a line into its
//!   keyword and parameter blob.
//! - [`negotiation`] sniffs which of the two protocols a freshly accepted
//!   C-C connection is speaking before handing the socket to a codec,
//!   since both can arrive on the same listening port.
//!
//! Hub session state machines, search fan-out, and the connection manager
//! build on top of these codecs rather than parsing wire bytes themselves.
//!
//! # Examples
//!
//! ```
//! use protocol::adc::{Command, CommandType, FourCc};
//!
//! let command = Command::new(CommandType::Broadcast, FourCc::INF)
//!     .with_from("AAAA")
//!     .with_named_param("NI", "example nick");
//! assert_eq!(command.to_wire_string(), "BINF AAAA NIexample\\snick");
//! ```
//!
//! # See also
//!
//! - [`transport`](../transport/index.html) for the socket and framing
//!   layer these codecs run on top of.
//! - [`hub`](../hub/index.html) and [`connmgr`](../connmgr/index.html) for
//!   the state machines that drive these codecs.

pub mod adc;
pub mod negotiation;
pub mod nmdc;
