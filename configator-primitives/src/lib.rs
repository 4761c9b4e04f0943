//! Core shared types and traits for configator.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod record;
mod schema;
mod value;

/// Error types and result alias shared across the workspace.
pub use error::{CoercionError, Error, Result};
/// Vault item records and the title normalization used to match them.
pub use record::{VaultField, VaultRecord, VaultSection, normalize_title};
/// Schema descriptors and the traits implemented by hydratable types.
pub use schema::{
    FieldDescriptor, FieldKind, PrimitiveField, PrimitiveKind, Schema, SchemaDescriptor,
    SchemaField, parse_bool,
};
/// Dynamic hydrated values.
pub use value::{Value, ValueMap};
