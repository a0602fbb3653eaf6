//! Outcomes of registry operations that can fail.

/// Why a [`crate::HubRegistry`] operation could not be carried out.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HubRegistryError {
    /// A hub is already registered under this URL.
    #[error("a hub session is already registered at {0}")]
    DuplicateHub(String),
    /// No hub is registered under this URL.
    #[error("no hub session is registered at {0}")]
    UnknownHub(String),
    /// The URL's scheme isn't one of the recognized ADC/NMDC forms.
    #[error("unrecognized hub URL scheme in {0}")]
    UnknownScheme(String),
}
