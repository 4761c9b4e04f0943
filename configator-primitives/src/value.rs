//! Dynamic values produced by hydration.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::schema::SchemaField;

/// A single hydrated value: either a typed primitive or a nested section.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// UTF-8 string, used verbatim.
    String(String),
    /// Boolean parsed from the accepted vocabulary.
    Boolean(bool),
    /// Signed integer, widened to 64 bits.
    Signed(i64),
    /// Unsigned integer, widened to 64 bits.
    Unsigned(u64),
    /// Floating point number, widened to 64 bits.
    Float(f64),
    /// Hydrated nested schema.
    Section(ValueMap),
}

impl Value {
    /// Returns a short name for the value's kind, used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Signed(_) => "signed integer",
            Self::Unsigned(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::Section(_) => "section",
        }
    }

    /// Returns the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the nested section, if any.
    #[must_use]
    pub const fn as_section(&self) -> Option<&ValueMap> {
        match self {
            Self::Section(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => f.write_str(value),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Signed(value) => write!(f, "{value}"),
            Self::Unsigned(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Section(map) => write!(f, "<section with {} fields>", map.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Self::Section(value)
    }
}

/// Hydrated values of one schema level, keyed by schema field name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValueMap {
    entries: BTreeMap<String, Value>,
}

impl ValueMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value under the supplied field name, returning any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(name.into(), value)
    }

    /// Looks up a value by field name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Number of hydrated fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field has been hydrated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Removes a field and converts it into its typed representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingValue`] when the field is absent, or the
    /// conversion error reported by [`SchemaField::from_value`].
    pub fn take<T: SchemaField>(&mut self, schema: &str, field: &str) -> Result<T> {
        let value = self.entries.remove(field).ok_or_else(|| Error::MissingValue {
            field: field.to_owned(),
            schema: schema.to_owned(),
        })?;
        T::from_value(field, value)
    }
}

impl FromIterator<(String, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_converts_and_removes() {
        let mut map = ValueMap::new();
        map.insert("port", Value::Signed(8080));
        map.insert("name", Value::from("api"));

        let port: u16 = map.take("Server", "port").unwrap();
        assert_eq!(port, 8080);
        assert!(map.get("port").is_none());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn take_missing_field_errors() {
        let mut map = ValueMap::new();
        let err = map.take::<String>("Server", "host").expect_err("missing");
        assert!(
            matches!(err, Error::MissingValue { ref field, ref schema } if field == "host" && schema == "Server")
        );
    }

    #[test]
    fn serializes_as_plain_json() {
        let mut inner = ValueMap::new();
        inner.insert("debug", Value::Boolean(false));
        let mut map = ValueMap::new();
        map.insert("ENV", Value::Section(inner));
        map.insert("name", Value::from("svc"));

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({ "ENV": { "debug": false }, "name": "svc" }));
    }
}
