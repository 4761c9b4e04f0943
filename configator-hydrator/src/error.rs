//! Errors surfaced by hydration.

use configator_adapters::traits::VaultError;
use configator_primitives::{CoercionError, Error as SchemaError};
use thiserror::Error;

/// Result alias for hydration.
pub type HydrateResult<T> = Result<T, HydrateError>;

/// Every way a hydration call can fail. All variants abort the whole call.
#[derive(Debug, Error)]
pub enum HydrateError {
    /// No vault with the requested title exists.
    #[error("vault `{vault}` not found")]
    VaultNotFound {
        /// Requested vault title.
        vault: String,
    },

    /// The vault exists but has no item with the requested title.
    #[error("item `{item}` not found in vault `{vault}`")]
    ItemNotFound {
        /// Requested item title.
        item: String,
        /// Title of the searched vault.
        vault: String,
    },

    /// A nested schema has no matching vault section.
    #[error("section `{section}` not found for field `{path}` of schema `{schema}`")]
    SectionNotFound {
        /// Schema field name used as the section title.
        section: String,
        /// Schema declaring the nested field.
        schema: String,
        /// Dotted path of the nested field.
        path: String,
    },

    /// Several vault sections normalize to the nested schema's name.
    #[error("section `{section}` for field `{path}` matches {count} vault sections")]
    AmbiguousSection {
        /// Schema field name used as the section title.
        section: String,
        /// Number of matching sections.
        count: usize,
        /// Dotted path of the nested field.
        path: String,
    },

    /// A required field has no vault counterpart and no default.
    #[error(
        "field `{field}` of schema `{schema}` not found in {}",
        describe_section(.section.as_deref())
    )]
    FieldNotFound {
        /// Dotted path of the schema field.
        field: String,
        /// Schema declaring the field.
        schema: String,
        /// Title of the vault section searched, `None` at top level.
        section: Option<String>,
    },

    /// The resolved vault value could not be converted to the declared type.
    #[error("cannot hydrate field `{path}`: {source}")]
    Coercion {
        /// Dotted path of the field.
        path: String,
        /// Underlying coercion failure.
        #[source]
        source: CoercionError,
    },

    /// An `op://` chain did not reach a plain value within the hop limit.
    #[error("reference `{reference}` still unresolved after {hops} hops")]
    ReferenceCycle {
        /// The reference the chain started from.
        reference: String,
        /// Hops followed before giving up.
        hops: usize,
    },

    /// The vault client failed.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// The hydrated values could not be assembled into the target type, or
    /// the schema itself is invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn describe_section(section: Option<&str>) -> String {
    section.map_or_else(
        || "the item's top level".to_owned(),
        |title| format!("section `{title}`"),
    )
}

impl HydrateError {
    /// Whether this is a boolean parse failure.
    #[must_use]
    pub const fn is_boolean_parse(&self) -> bool {
        matches!(
            self,
            Self::Coercion {
                source: CoercionError::Boolean { .. },
                ..
            }
        )
    }
}
