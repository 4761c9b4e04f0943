//! Shared error definitions for configator primitives.

use thiserror::Error;

/// Result alias used throughout configator.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building schemas or assembling hydrated instances.
#[derive(Debug, Error)]
pub enum Error {
    /// A hydrated value did not carry the kind expected by the target field.
    #[error("field `{field}` expected a {expected} value but received {found}")]
    TypeMismatch {
        /// Name of the field being assembled.
        field: String,
        /// Kind the target type accepts.
        expected: &'static str,
        /// Kind that was actually supplied.
        found: &'static str,
    },

    /// A hydrated value does not fit into the target numeric type.
    #[error("field `{field}` value {value} is out of range for {target}")]
    OutOfRange {
        /// Name of the field being assembled.
        field: String,
        /// Target Rust type.
        target: &'static str,
        /// Rendered value that did not fit.
        value: String,
    },

    /// The hydrated map was missing a value for a declared field.
    #[error("no hydrated value for field `{field}` of schema `{schema}`")]
    MissingValue {
        /// Name of the missing field.
        field: String,
        /// Name of the schema being assembled.
        schema: String,
    },

    /// Schema descriptor failed validation.
    #[error("invalid schema `{schema}`: {reason}")]
    InvalidSchema {
        /// Name of the offending schema.
        schema: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl Error {
    /// Convenience constructor for schema validation failures.
    #[must_use]
    pub fn invalid_schema(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            schema: schema.into(),
            reason: reason.into(),
        }
    }
}

/// Failure to turn a resolved vault string into a typed value.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoercionError {
    /// The string is not in the accepted boolean vocabulary.
    #[error("cannot parse `{value}` as boolean")]
    Boolean {
        /// The offending string, untrimmed.
        value: String,
    },

    /// The target type's standard parser rejected the string.
    #[error("cannot parse `{value}` as {target}: {reason}")]
    Type {
        /// Target type name (e.g. `i64`).
        target: &'static str,
        /// The offending string, untrimmed.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },
}

impl CoercionError {
    /// Returns the raw value that failed to coerce.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Boolean { value } | Self::Type { value, .. } => value,
        }
    }
}
