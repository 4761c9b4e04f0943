//! Typed configuration loaded from 1Password.
//!
//! Declare a schema with `#[derive(Schema)]`, pick a vault client, and call
//! [`hydrate`](crate::hydrator::hydrate). Nested structs map to item
//! sections, leaf fields to item fields, and `op://` references are followed
//! until a plain value is reached.
//!
//! ```ignore
//! use configator::prelude::*;
//!
//! #[derive(Debug, Schema)]
//! struct Database {
//!     host: String,
//!     port: u16,
//! }
//!
//! #[derive(Debug, Schema)]
//! struct Settings {
//!     database: Database,
//!     #[schema(default = false)]
//!     debug: bool,
//! }
//!
//! let client = ClientSettings::from_env()?.build_client()?;
//! let settings: Settings = hydrate(client.as_ref(), "Production", "api").await?;
//! ```
//!
//! Each component lives in its own crate and is enabled through a feature of
//! the same name.

#![warn(missing_docs, clippy::pedantic)]

/// Schema descriptors, values, and vault records.
pub use configator_primitives as primitives;

/// Hydration engine (enabled by `hydrator` feature).
#[cfg(feature = "hydrator")]
pub use configator_hydrator as hydrator;

/// Vault clients (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use configator_adapters as adapters;

/// Client selection from the environment (enabled by `config` feature).
#[cfg(feature = "config")]
pub use configator_config as config;

/// Logging setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use configator_telemetry as telemetry;

/// `#[derive(Schema)]` (enabled by `derive` feature).
#[cfg(feature = "derive")]
pub use configator_macros::Schema;

/// Common imports for loading configuration.
pub mod prelude {
    pub use crate::primitives::{
        FieldDescriptor, PrimitiveKind, Schema, SchemaDescriptor, Value, ValueMap,
    };

    #[cfg(feature = "derive")]
    pub use configator_macros::Schema;

    #[cfg(feature = "adapters")]
    pub use crate::adapters::traits::VaultClient;

    #[cfg(feature = "hydrator")]
    pub use crate::hydrator::{
        HydrateError, Hydrator, hydrate, hydrate_descriptor, hydrate_record,
    };

    #[cfg(feature = "config")]
    pub use crate::config::ClientSettings;
}
