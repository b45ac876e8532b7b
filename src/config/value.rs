//! Stored value union and scalar coercion for the configuration tree.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Raw nested data handed to the tree by external loaders.
///
/// The `preserve_order` feature keeps mapping insertion order, which the
/// tree mirrors in its own field ordering and in [`as_dict`] output.
///
/// [`as_dict`]: super::ConfigTree::as_dict
pub type RawValue = serde_json::Value;

/// Raw mapping type matching [`RawValue`] objects.
pub type RawMap = serde_json::Map<String, serde_json::Value>;

/// Opaque handle to a node (section or list) owned by a
/// [`ConfigTree`](super::ConfigTree) arena.
///
/// Handles are only meaningful for the tree that produced them; using a
/// handle against another tree yields `UnknownNode` or arbitrary lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A single stored configuration value.
///
/// Every field of a section and every item of a list is one of these:
/// a scalar, a nested section or a nested list. Nested nodes are held as
/// arena handles; resolve them through the owning tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null / unset value.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Integer(i64),
    /// Floating point scalar.
    Float(f64),
    /// Text scalar.
    String(String),
    /// Filesystem path scalar, produced by path coercion.
    Path(PathBuf),
    /// Nested configuration section.
    Section(NodeId),
    /// Nested configuration list.
    List(NodeId),
}

impl Value {
    /// True when the value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean scalar, if this value is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer scalar, if this value is one.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// The float scalar, if this value is one.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// The string scalar, if this value is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// The path scalar, if this value is one.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(value) => Some(value),
            _ => None,
        }
    }

    /// The nested section handle, if this value is one.
    #[must_use]
    pub const fn as_section(&self) -> Option<NodeId> {
        match self {
            Self::Section(id) => Some(*id),
            _ => None,
        }
    }

    /// The nested list handle, if this value is one.
    #[must_use]
    pub const fn as_list(&self) -> Option<NodeId> {
        match self {
            Self::List(id) => Some(*id),
            _ => None,
        }
    }

    /// Short type label used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Path(_) => "path",
            Self::Section(_) => "section",
            Self::List(_) => "list",
        }
    }
}

/// Convert a raw scalar into a stored [`Value`].
///
/// Empty strings normalise to [`Value::Null`]. Mappings and sequences are
/// handled by the tree itself and are rejected here.
pub(crate) fn scalar_from_raw(field: &str, raw: RawValue) -> Result<Value, ConfigError> {
    match raw {
        RawValue::Null => Ok(Value::Null),
        RawValue::Bool(value) => Ok(Value::Bool(value)),
        RawValue::Number(number) => number.as_i64().map_or_else(
            || {
                number
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| unsupported(field, "number is not representable"))
            },
            |value| Ok(Value::Integer(value)),
        ),
        RawValue::String(value) if value.is_empty() => Ok(Value::Null),
        RawValue::String(value) => Ok(Value::String(value)),
        RawValue::Array(_) | RawValue::Object(_) => {
            Err(unsupported(field, "expected a scalar value"))
        }
    }
}

/// Serialize a stored scalar back into raw data.
///
/// Paths render with `Path::display`, so non-UTF-8 paths degrade lossily.
pub(crate) fn scalar_to_raw(value: &Value) -> RawValue {
    match value {
        Value::Null | Value::Section(_) | Value::List(_) => RawValue::Null,
        Value::Bool(b) => RawValue::Bool(*b),
        Value::Integer(i) => RawValue::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(RawValue::Null, RawValue::Number),
        Value::String(s) => RawValue::String(s.clone()),
        Value::Path(p) => RawValue::String(p.display().to_string()),
    }
}

/// Coerce a stored scalar to an integer (declared via `integer_settings`).
///
/// Strings are parsed, floats are truncated, null passes through.
pub(crate) fn coerce_integer(field: &str, value: Value) -> Result<Value, ConfigError> {
    match value {
        Value::Null | Value::Integer(_) => Ok(value),
        #[allow(clippy::cast_possible_truncation)]
        Value::Float(f) => Ok(Value::Integer(f as i64)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| unsupported(field, &format!("cannot parse '{s}' as integer"))),
        other => Err(unsupported(
            field,
            &format!("cannot coerce {} to integer", other.type_name()),
        )),
    }
}

/// Coerce a stored scalar to a float (declared via `float_settings`).
pub(crate) fn coerce_float(field: &str, value: Value) -> Result<Value, ConfigError> {
    match value {
        Value::Null | Value::Float(_) => Ok(value),
        #[allow(clippy::cast_precision_loss)]
        Value::Integer(i) => Ok(Value::Float(i as f64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| unsupported(field, &format!("cannot parse '{s}' as float"))),
        other => Err(unsupported(
            field,
            &format!("cannot coerce {} to float", other.type_name()),
        )),
    }
}

/// Coerce a stored scalar to a filesystem path (declared via `path_settings`).
pub(crate) fn coerce_path(field: &str, value: Value) -> Result<Value, ConfigError> {
    match value {
        Value::Null | Value::Path(_) => Ok(value),
        Value::String(s) => Ok(Value::Path(PathBuf::from(s))),
        other => Err(unsupported(
            field,
            &format!("cannot coerce {} to path", other.type_name()),
        )),
    }
}

fn unsupported(field: &str, detail: &str) -> ConfigError {
    ConfigError::UnsupportedValueType {
        field: field.to_string(),
        detail: detail.to_string(),
    }
}
