//! Shared vault client trait and data structures.

use std::fmt;

use async_trait::async_trait;
use configator_primitives::VaultRecord;
use thiserror::Error;

/// Result alias used by vault clients.
pub type VaultResult<T> = Result<T, VaultError>;

/// Error type shared by vault client implementations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Client is misconfigured or missing credentials.
    #[error("vault client not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// Transport-level failures (network, process spawn, timeouts).
    #[error("vault transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// The vault service rejected the credentials.
    #[error("vault authentication failed (check the access token)")]
    Unauthorized,

    /// A vault, item, or field addressed by the request does not exist.
    #[error("vault resource not found: {what}")]
    NotFound {
        /// Description of the missing resource.
        what: String,
    },

    /// The vault service returned a malformed or unexpected response.
    #[error("vault response error: {reason}")]
    Response {
        /// Additional context about the response failure.
        reason: String,
    },

    /// A secret reference could not be parsed.
    #[error("invalid secret reference `{reference}`: {reason}")]
    InvalidReference {
        /// The offending reference.
        reference: String,
        /// Why the reference was rejected.
        reason: String,
    },
}

impl VaultError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for missing resources.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Convenience constructor for malformed responses.
    #[must_use]
    pub fn response(reason: impl Into<String>) -> Self {
        Self::Response {
            reason: reason.into(),
        }
    }
}

/// Minimal metadata describing a vault client instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientMetadata {
    provider: &'static str,
    endpoint: Option<String>,
}

impl ClientMetadata {
    /// Creates metadata for the supplied provider identifier.
    #[must_use]
    pub const fn new(provider: &'static str) -> Self {
        Self {
            provider,
            endpoint: None,
        }
    }

    /// Records where the client talks to (URL or binary path).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Returns the provider identifier (e.g. "onepassword-connect").
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Returns the configured endpoint, if any.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

/// Located vault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultHandle {
    id: String,
    title: String,
}

impl VaultHandle {
    /// Creates a handle from the vault id and title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Returns the vault identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the vault title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for VaultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}

/// Located item inside a vault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemHandle {
    id: String,
    title: String,
}

impl ItemHandle {
    /// Creates a handle from the item id and title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Returns the item identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the item title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}

/// Trait implemented by all vault clients.
///
/// Clients are shared read-only across concurrent hydrations, so every
/// operation takes `&self`.
#[async_trait]
pub trait VaultClient: Send + Sync {
    /// Returns basic metadata describing the client instance.
    fn metadata(&self) -> &ClientMetadata;

    /// Finds a vault by title. `Ok(None)` means the vault does not exist.
    async fn resolve_vault(&self, name: &str) -> VaultResult<Option<VaultHandle>>;

    /// Finds an item by title inside a vault. `Ok(None)` means it does not exist.
    async fn resolve_item(&self, vault: &VaultHandle, name: &str)
    -> VaultResult<Option<ItemHandle>>;

    /// Fetches the fields and sections of an item.
    async fn fetch_record(&self, vault: &VaultHandle, item: &ItemHandle)
    -> VaultResult<VaultRecord>;

    /// Follows exactly one `op://` reference and returns the raw target value.
    async fn dereference(&self, link: &str) -> VaultResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_display_title_and_id() {
        let vault = VaultHandle::new("abc123", "Personal");
        assert_eq!(vault.to_string(), "Personal (abc123)");
        let item = ItemHandle::new("i1", "api");
        assert_eq!(item.title(), "api");
    }

    #[test]
    fn metadata_records_endpoint() {
        let metadata = ClientMetadata::new("test").with_endpoint("http://localhost:8080");
        assert_eq!(metadata.provider(), "test");
        assert_eq!(metadata.endpoint(), Some("http://localhost:8080"));
    }
}
