//! The closed set of frontmatter value types used by `--check`.

use crate::query::coerce::{parse_date, to_number};
use crate::value::{DynamicValue, FieldAccessor};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Date,
    Array,
    Null,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown type {0:?} (expected one of: string, number, boolean, date, array, null)")]
pub struct UnknownType(pub String);

impl FromStr for ValueType {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "string" | "text" => ValueType::String,
            "number" | "int" | "float" => ValueType::Number,
            "boolean" | "bool" => ValueType::Boolean,
            "date" => ValueType::Date,
            "array" | "list" => ValueType::Array,
            "null" => ValueType::Null,
            _ => return Err(UnknownType(s.to_string())),
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::Array => "array",
            ValueType::Null => "null",
        })
    }
}

impl ValueType {
    /// Whether `value` already is, or reads as, this type. Strings count as
    /// numbers, booleans or dates when their text parses as one.
    pub fn is_type(self, value: &DynamicValue) -> bool {
        match self {
            ValueType::String => matches!(value, DynamicValue::String(_)),
            ValueType::Number => match value {
                DynamicValue::Integer(_) | DynamicValue::Float(_) => true,
                DynamicValue::String(_) => to_number(value).is_ok(),
                _ => false,
            },
            ValueType::Boolean => match value {
                DynamicValue::Boolean(_) => true,
                DynamicValue::String(s) => parse_bool(s).is_some(),
                _ => false,
            },
            ValueType::Date => match value {
                DynamicValue::String(s) => parse_date(s).is_ok(),
                _ => false,
            },
            ValueType::Array => matches!(value, DynamicValue::List(_)),
            ValueType::Null => value.is_null(),
        }
    }

    /// Converts `value` into this type, or `None` when it does not fit.
    pub fn cast(self, value: &DynamicValue) -> Option<DynamicValue> {
        match self {
            ValueType::String => match value {
                DynamicValue::List(_) | DynamicValue::Null => None,
                other => Some(DynamicValue::String(other.to_string())),
            },
            ValueType::Number => match value {
                DynamicValue::Integer(_) | DynamicValue::Float(_) => Some(value.clone()),
                DynamicValue::String(s) => s
                    .parse::<i64>()
                    .map(DynamicValue::Integer)
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(DynamicValue::Float)),
                _ => None,
            },
            ValueType::Boolean => match value {
                DynamicValue::Boolean(_) => Some(value.clone()),
                DynamicValue::String(s) => parse_bool(s).map(DynamicValue::Boolean),
                _ => None,
            },
            ValueType::Date => self.is_type(value).then(|| value.clone()),
            ValueType::Array => match value {
                DynamicValue::List(_) => Some(value.clone()),
                DynamicValue::Null => Some(DynamicValue::List(Vec::new())),
                other => Some(DynamicValue::List(vec![other.clone()])),
            },
            ValueType::Null => value.is_null().then_some(DynamicValue::Null),
        }
    }
}

/// The most specific type name for `value`; date-shaped strings report as
/// `date`.
pub fn type_of(value: &DynamicValue) -> ValueType {
    match value {
        DynamicValue::String(_) if ValueType::Date.is_type(value) => ValueType::Date,
        DynamicValue::String(_) => ValueType::String,
        DynamicValue::Integer(_) | DynamicValue::Float(_) => ValueType::Number,
        DynamicValue::Boolean(_) => ValueType::Boolean,
        DynamicValue::List(_) => ValueType::Array,
        DynamicValue::Null => ValueType::Null,
    }
}

/// A `FIELD:TYPE` requirement from `--check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCheck {
    pub field: String,
    pub expected: ValueType,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeCheckError {
    #[error("expected FIELD:TYPE, got {0:?}")]
    Format(String),

    #[error(transparent)]
    Type(#[from] UnknownType),
}

impl FromStr for TypeCheck {
    type Err = TypeCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, ty) = s
            .rsplit_once(':')
            .filter(|(field, _)| !field.trim().is_empty())
            .ok_or_else(|| TypeCheckError::Format(s.to_string()))?;
        Ok(TypeCheck {
            field: field.trim().to_string(),
            expected: ty.trim().parse()?,
        })
    }
}

impl TypeCheck {
    /// The field must be present and of the expected type.
    pub fn matches<A: FieldAccessor + ?Sized>(&self, fields: &A) -> bool {
        match fields.get_field(&self.field) {
            Some(value) if self.expected.is_type(&value) => true,
            Some(value) => {
                tracing::debug!(
                    field = %self.field,
                    expected = %self.expected,
                    found = %type_of(&value),
                    "type check failed"
                );
                false
            }
            None => false,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}
