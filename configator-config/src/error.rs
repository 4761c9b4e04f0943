//! Configuration errors.

use configator_adapters::traits::VaultError;
use thiserror::Error;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while assembling client settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable required by the selected backend is unset or empty.
    #[error("{name} must be set")]
    MissingVariable {
        /// Environment variable name.
        name: &'static str,
    },

    /// A variable holds a value that cannot be used.
    #[error("invalid {name}: {reason}")]
    InvalidVariable {
        /// Environment variable name.
        name: &'static str,
        /// Details about the failure.
        reason: String,
    },

    /// The vault client rejected the settings.
    #[error(transparent)]
    Client(#[from] VaultError),
}

impl ConfigError {
    /// Convenience constructor for [`ConfigError::InvalidVariable`].
    #[must_use]
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidVariable {
            name,
            reason: reason.into(),
        }
    }
}
