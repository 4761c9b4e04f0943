//! Schema descriptors and the traits that bind them to Rust types.
//!
//! A schema is described once as a tree of [`FieldDescriptor`]s. Leaf kinds
//! are tagged by [`PrimitiveKind`], each variant owning its parse function;
//! nested kinds carry their own [`SchemaDescriptor`] and map onto vault
//! sections.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoercionError, Error, Result};
use crate::record::normalize_title;
use crate::value::{Value, ValueMap};

const TRUTHY: [&str; 4] = ["true", "1", "yes", "on"];
const FALSY: [&str; 4] = ["false", "0", "no", "off"];

/// Primitive leaf kinds supported by hydration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// UTF-8 string, taken verbatim.
    String,
    /// Boolean from the `true/1/yes/on` and `false/0/no/off` vocabulary.
    Boolean,
    /// 8-bit signed integer.
    I8,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 32-bit unsigned integer.
    U32,
    /// 64-bit unsigned integer.
    U64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

impl PrimitiveKind {
    /// Returns the Rust type name of the kind.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Boolean => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Coerces a resolved vault string into a value of this kind.
    ///
    /// Strings are kept as-is. Every other kind parses the trimmed input.
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError::Boolean`] for unrecognised booleans and
    /// [`CoercionError::Type`] when a numeric parser rejects the input.
    pub fn parse(self, raw: &str) -> std::result::Result<Value, CoercionError> {
        match self {
            Self::String => Ok(Value::String(raw.to_owned())),
            Self::Boolean => parse_bool(raw).map(Value::Boolean),
            Self::I8 => parse_number::<i8>(self, raw).map(|v| Value::Signed(v.into())),
            Self::I16 => parse_number::<i16>(self, raw).map(|v| Value::Signed(v.into())),
            Self::I32 => parse_number::<i32>(self, raw).map(|v| Value::Signed(v.into())),
            Self::I64 => parse_number::<i64>(self, raw).map(Value::Signed),
            Self::U8 => parse_number::<u8>(self, raw).map(|v| Value::Unsigned(v.into())),
            Self::U16 => parse_number::<u16>(self, raw).map(|v| Value::Unsigned(v.into())),
            Self::U32 => parse_number::<u32>(self, raw).map(|v| Value::Unsigned(v.into())),
            Self::U64 => parse_number::<u64>(self, raw).map(Value::Unsigned),
            Self::F32 => parse_number::<f32>(self, raw).map(|v| Value::Float(v.into())),
            Self::F64 => parse_number::<f64>(self, raw).map(Value::Float),
        }
    }

    /// Whether `value` is a valid value of this kind, integer range included.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_)) | (Self::Boolean, Value::Boolean(_)) => true,
            (Self::I8, Value::Signed(v)) => i8::try_from(*v).is_ok(),
            (Self::I8, Value::Unsigned(v)) => i8::try_from(*v).is_ok(),
            (Self::I16, Value::Signed(v)) => i16::try_from(*v).is_ok(),
            (Self::I16, Value::Unsigned(v)) => i16::try_from(*v).is_ok(),
            (Self::I32, Value::Signed(v)) => i32::try_from(*v).is_ok(),
            (Self::I32, Value::Unsigned(v)) => i32::try_from(*v).is_ok(),
            (Self::I64, Value::Signed(_)) => true,
            (Self::I64, Value::Unsigned(v)) => i64::try_from(*v).is_ok(),
            (Self::U8, Value::Signed(v)) => u8::try_from(*v).is_ok(),
            (Self::U8, Value::Unsigned(v)) => u8::try_from(*v).is_ok(),
            (Self::U16, Value::Signed(v)) => u16::try_from(*v).is_ok(),
            (Self::U16, Value::Unsigned(v)) => u16::try_from(*v).is_ok(),
            (Self::U32, Value::Signed(v)) => u32::try_from(*v).is_ok(),
            (Self::U32, Value::Unsigned(v)) => u32::try_from(*v).is_ok(),
            (Self::U64, Value::Signed(v)) => u64::try_from(*v).is_ok(),
            (Self::U64, Value::Unsigned(_)) => true,
            (Self::F32, Value::Float(v)) => !v.is_finite() || v.abs() <= f64::from(f32::MAX),
            (Self::F32 | Self::F64, Value::Float(_) | Value::Signed(_) | Value::Unsigned(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Parses a boolean from the accepted vocabulary, ignoring case and surrounding whitespace.
///
/// # Errors
///
/// Returns [`CoercionError::Boolean`] for anything outside the vocabulary.
pub fn parse_bool(raw: &str) -> std::result::Result<bool, CoercionError> {
    let lowered = raw.trim().to_lowercase();
    if TRUTHY.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(CoercionError::Boolean {
            value: raw.to_owned(),
        })
    }
}

fn parse_number<T>(kind: PrimitiveKind, raw: &str) -> std::result::Result<T, CoercionError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|err| CoercionError::Type {
        target: kind.type_name(),
        value: raw.to_owned(),
        reason: err.to_string(),
    })
}

/// Kind of a schema field: a primitive leaf or a nested schema.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    /// Leaf field hydrated from a single vault field.
    Primitive(PrimitiveKind),
    /// Nested schema hydrated from the vault section of the same name.
    Section(Box<SchemaDescriptor>),
}

impl FieldKind {
    /// Returns the nested descriptor when this kind is a section.
    #[must_use]
    pub fn as_section(&self) -> Option<&SchemaDescriptor> {
        match self {
            Self::Section(schema) => Some(schema),
            Self::Primitive(_) => None,
        }
    }
}

/// Declaration of a single named field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    default: Option<Value>,
}

impl FieldDescriptor {
    /// Declares a required field.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Declares a required primitive field.
    #[must_use]
    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::new(name, FieldKind::Primitive(kind))
    }

    /// Declares a nested section field.
    #[must_use]
    pub fn section(name: impl Into<String>, schema: SchemaDescriptor) -> Self {
        Self::new(name, FieldKind::Section(Box::new(schema)))
    }

    /// Attaches a default used when the vault has no matching field.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns the field name as declared in the schema.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field kind.
    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Returns the declared default, if any.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether the field must be present in the vault.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Named, ordered collection of field declarations.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    /// Creates an empty schema with the supplied name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field declaration.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field declarations in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Checks the descriptor tree for empty names, fields that collide once
    /// normalized, and defaults that do not fit their field's kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] naming the first offending schema.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(Error::invalid_schema(&self.name, "field names cannot be empty"));
            }
            if !seen.insert(normalize_title(&field.name)) {
                return Err(Error::invalid_schema(
                    &self.name,
                    format!("field `{}` collides with another field once normalized", field.name),
                ));
            }
            match (&field.kind, &field.default) {
                (FieldKind::Section(_), Some(_)) => {
                    return Err(Error::invalid_schema(
                        &self.name,
                        format!("section `{}` cannot declare a default", field.name),
                    ));
                }
                (FieldKind::Section(nested), None) => nested.validate()?,
                (FieldKind::Primitive(kind), Some(default)) if !kind.accepts(default) => {
                    return Err(Error::invalid_schema(
                        &self.name,
                        format!(
                            "default for `{}` is not a valid {kind} ({} `{default}`)",
                            field.name,
                            default.kind_name()
                        ),
                    ));
                }
                (FieldKind::Primitive(_), _) => {}
            }
        }
        Ok(())
    }
}

/// Implemented by types that can be hydrated from a vault item.
///
/// Usually derived with `#[derive(Schema)]`.
pub trait Schema: Sized {
    /// Describes the fields of the type.
    fn descriptor() -> SchemaDescriptor;

    /// Builds the typed instance from hydrated values.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a value is missing or of the wrong kind.
    fn from_values(values: ValueMap) -> Result<Self>;
}

/// Implemented by every type usable as a schema field.
pub trait SchemaField: Sized {
    /// Kind reported in the schema descriptor.
    fn kind() -> FieldKind;

    /// Converts a hydrated value into the field type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] or [`Error::OutOfRange`] when the value
    /// does not fit.
    fn from_value(field: &str, value: Value) -> Result<Self>;
}

/// Primitive field types that can carry a schema default.
pub trait PrimitiveField: SchemaField {
    /// Converts a typed default into a hydrated value.
    fn into_value(self) -> Value;
}

fn mismatch(field: &str, expected: &'static str, found: &Value) -> Error {
    Error::TypeMismatch {
        field: field.to_owned(),
        expected,
        found: found.kind_name(),
    }
}

impl SchemaField for String {
    fn kind() -> FieldKind {
        FieldKind::Primitive(PrimitiveKind::String)
    }

    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::String(value) => Ok(value),
            other => Err(mismatch(field, "string", &other)),
        }
    }
}

impl PrimitiveField for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl SchemaField for bool {
    fn kind() -> FieldKind {
        FieldKind::Primitive(PrimitiveKind::Boolean)
    }

    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Boolean(value) => Ok(value),
            other => Err(mismatch(field, "boolean", &other)),
        }
    }
}

impl PrimitiveField for bool {
    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

macro_rules! integer_field {
    ($($ty:ty => $kind:ident, $variant:ident, $wide:ty);* $(;)?) => {
        $(
            impl SchemaField for $ty {
                fn kind() -> FieldKind {
                    FieldKind::Primitive(PrimitiveKind::$kind)
                }

                fn from_value(field: &str, value: Value) -> Result<Self> {
                    let converted = match &value {
                        Value::Signed(v) => <$ty>::try_from(*v).ok(),
                        Value::Unsigned(v) => <$ty>::try_from(*v).ok(),
                        other => return Err(mismatch(field, "integer", other)),
                    };
                    converted.ok_or_else(|| Error::OutOfRange {
                        field: field.to_owned(),
                        target: stringify!($ty),
                        value: value.to_string(),
                    })
                }
            }

            impl PrimitiveField for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(<$wide>::from(self))
                }
            }
        )*
    };
}

integer_field! {
    i8 => I8, Signed, i64;
    i16 => I16, Signed, i64;
    i32 => I32, Signed, i64;
    i64 => I64, Signed, i64;
    u8 => U8, Unsigned, u64;
    u16 => U16, Unsigned, u64;
    u32 => U32, Unsigned, u64;
    u64 => U64, Unsigned, u64;
}

impl SchemaField for f64 {
    fn kind() -> FieldKind {
        FieldKind::Primitive(PrimitiveKind::F64)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(field: &str, value: Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Signed(v) => Ok(v as f64),
            Value::Unsigned(v) => Ok(v as f64),
            other => Err(mismatch(field, "float", &other)),
        }
    }
}

impl PrimitiveField for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl SchemaField for f32 {
    fn kind() -> FieldKind {
        FieldKind::Primitive(PrimitiveKind::F32)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(field: &str, value: Value) -> Result<Self> {
        f64::from_value(field, value).map(|v| v as f32)
    }
}

impl PrimitiveField for f32 {
    fn into_value(self) -> Value {
        Value::Float(self.into())
    }
}
