use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Basic value type held by a generated field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Nullable string.
    Text,
    /// Nullable (boxed) integer.
    Integer,
    /// Primitive integer; cannot hold null.
    Int,
}

impl ValueType {
    /// Every value type, in the order random draws index into.
    pub const ALL: [ValueType; 3] = [ValueType::Text, ValueType::Integer, ValueType::Int];

    pub fn is_nullable(self) -> bool {
        !matches!(self, ValueType::Int)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Integer => "integer",
            ValueType::Int => "int",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sample value stored in a constraint bundle and assigned to basic fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SampleValue {
    Null,
    Text(String),
    Int(i64),
}

impl SampleValue {
    pub fn text(value: impl Into<String>) -> Self {
        SampleValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SampleValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SampleValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SampleValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Whether the value can be stored in a field of `value_type`.
    pub fn fits(&self, value_type: ValueType) -> bool {
        match self {
            SampleValue::Null => value_type.is_nullable(),
            SampleValue::Text(_) => value_type == ValueType::Text,
            SampleValue::Int(_) => matches!(value_type, ValueType::Integer | ValueType::Int),
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Null => f.write_str("null"),
            SampleValue::Text(value) => write!(f, "{value:?}"),
            SampleValue::Int(value) => write!(f, "{value}"),
        }
    }
}

/// Parameter value of a constraint descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Text(String),
    /// Qualified name of a generated type (group, entity, validator).
    TypeRef(String),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    pub fn text(value: impl Into<String>) -> Self {
        ParamValue::Text(value.into())
    }

    pub fn type_ref(value: impl Into<String>) -> Self {
        ParamValue::TypeRef(value.into())
    }

    pub fn as_type_ref(&self) -> Option<&str> {
        match self {
            ParamValue::TypeRef(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::Array(values) => Some(values.as_slice()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_only_fits_nullable_types() {
        assert!(SampleValue::Null.fits(ValueType::Text));
        assert!(SampleValue::Null.fits(ValueType::Integer));
        assert!(!SampleValue::Null.fits(ValueType::Int));
        assert!(SampleValue::Int(3).fits(ValueType::Int));
        assert!(!SampleValue::text("good").fits(ValueType::Integer));
    }
}
