//! Optional bridge that forwards recorded events to `tracing`, gated behind
//! the `tracing` feature so embedding crates that already run a `tracing`
//! subscriber don't have to also poll [`crate::drain_events`].

use crate::{EventKind, VerbosityConfig};

/// Emits a zero-cost `tracing` event marking that a log of `kind` occurred
/// under `config`. The actual message text is not duplicated here; callers
/// that want the formatted text in their subscriber should drain events
/// via [`crate::drain_events`] instead, since `tracing`'s macros require a
/// `'static` format string and this crate's messages are built at runtime.
pub(crate) fn emit(kind: EventKind, config: &VerbosityConfig) {
    match kind {
        EventKind::Info => {
            tracing::info!(info_hub = config.info.hub, info_transfer = config.info.transfer, "dc engine info event");
        }
        EventKind::Debug => {
            tracing::debug!(debug_adc = config.debug.adc, debug_nmdc = config.debug.nmdc, "dc engine debug event");
        }
    }
}
