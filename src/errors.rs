//! Error hierarchy for the table namespace layer.
//!
//! Configuration and registration errors are raised synchronously to the
//! caller. Nothing here is retried; retry policy belongs to the engine.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation not allowed in the current lifecycle or registration state
    #[error(transparent)]
    IllegalState(#[from] IllegalStateError),

    /// Value or buffer that cannot be handed to the engine
    #[error("Invalid argument for key {key:?}: {reason}")]
    InvalidArgument { key: String, reason: String },

    /// Raised only by the legacy getters that take no default
    #[error("Unknown table key: {0}")]
    KeyNotDefined(String),

    /// Save/load of persistent entries failed
    #[error(transparent)]
    Persistent(#[from] PersistentError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum IllegalStateError {
    /// A lifecycle setting was changed after the engine started
    #[error("Network tables has already been initialized (cannot change {setting})")]
    AlreadyInitialized { setting: &'static str },

    /// Same connection listener added twice on one table
    #[error("Cannot add the same connection listener twice on table {path:?}")]
    ListenerAlreadyRegistered { path: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PersistentError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Encoding or decoding of the persistent file failed
    #[error(transparent)]
    Codec(#[from] bincode::Error),
}

impl Error {
    pub(crate) fn invalid_argument(
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidArgument {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn already_initialized(setting: &'static str) -> Self {
        IllegalStateError::AlreadyInitialized { setting }.into()
    }
}
