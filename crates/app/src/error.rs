//! The composition facade's own error taxonomy (§7): failures that
//! originate at the wiring layer itself rather than inside one subsystem
//! (whose own `thiserror` enums are surfaced unchanged through
//! [`AppError::Hub`]/[`AppError::Store`]).

use thiserror::Error;

/// Everything that can go wrong starting, running, or shutting down an
/// [`crate::App`].
#[derive(Debug, Error)]
pub enum AppError {
    /// A hub could not be registered (duplicate URL, or `hub-registry`'s
    /// own construction failure).
    #[error("hub registry error: {0}")]
    Hub(#[from] hub_registry::HubRegistryError),
    /// The on-disk bundle store failed to load or save a record.
    #[error("queue store error: {0}")]
    Store(#[from] persistence::StoreError),
}
