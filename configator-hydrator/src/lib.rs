//! Schema hydration engine.
//!
//! This crate walks a [`SchemaDescriptor`] tree against a vault record:
//! nested schemas map to vault sections, leaves map to fields, `op://`
//! references are followed, and raw strings are coerced to the declared
//! primitive kinds.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod hydrator;
mod matching;
mod resolver;

use std::sync::Arc;

use configator_adapters::traits::VaultClient;
use configator_primitives::{Schema, SchemaDescriptor, ValueMap};

pub use error::{HydrateError, HydrateResult};
pub use hydrator::{hydrate, hydrate_descriptor, hydrate_record};
pub use resolver::{MAX_REFERENCE_HOPS, resolve_reference};

/// Shared handle binding a vault client to the hydration entry points.
#[derive(Clone)]
pub struct Hydrator {
    client: Arc<dyn VaultClient>,
}

impl std::fmt::Debug for Hydrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hydrator")
            .field("client", self.client.metadata())
            .finish()
    }
}

impl Hydrator {
    /// Creates a hydrator backed by `client`.
    #[must_use]
    pub fn new(client: Arc<dyn VaultClient>) -> Self {
        Self { client }
    }

    /// Returns the underlying vault client.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn VaultClient> {
        &self.client
    }

    /// Loads item `item` of vault `vault` into a new `S`.
    ///
    /// # Errors
    ///
    /// See [`hydrate`].
    pub async fn load<S: Schema>(&self, vault: &str, item: &str) -> HydrateResult<S> {
        hydrate(self.client.as_ref(), vault, item).await
    }

    /// Loads item `item` of vault `vault` following a runtime-built schema.
    ///
    /// # Errors
    ///
    /// See [`hydrate_descriptor`].
    pub async fn load_values(
        &self,
        descriptor: &SchemaDescriptor,
        vault: &str,
        item: &str,
    ) -> HydrateResult<ValueMap> {
        hydrate_descriptor(self.client.as_ref(), descriptor, vault, item).await
    }
}
