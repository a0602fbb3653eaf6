//! The NMDC line codec: `$Command param|`-framed text with `&`/`|`/`$`
//! entity escaping.
//!
//! NMDC predates ADC and has no structured header addressing - every line
//! is self-contained text terminated by `|`, with the hub responsible for
//! routing rather than the command carrying a source/destination SID. This
//! module only handles line splitting and escaping; command-specific
//! semantics live in the hub session that consumes it.

pub mod command;
pub mod escape;

pub use command::Line;
