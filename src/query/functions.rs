use super::coerce::{parse_date, CoercionError};
use crate::value::DynamicValue;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FunctionError {
    #[error("{name}() takes {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("{name}() expects a {expected} argument")]
    ArgumentType { name: String, expected: &'static str },

    #[error("unknown function: {0}")]
    Unknown(String),

    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionValue {
    Time(DateTime<Utc>),
    Value(DynamicValue),
}

impl FunctionValue {
    /// Times become RFC 3339 strings, which the date parser reads back.
    pub fn into_value(self) -> DynamicValue {
        match self {
            FunctionValue::Time(t) => {
                DynamicValue::String(t.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            FunctionValue::Value(v) => v,
        }
    }
}

impl fmt::Display for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionValue::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            FunctionValue::Value(v) => write!(f, "{}", v),
        }
    }
}

pub fn evaluate_function(name: &str, args: &[DynamicValue]) -> Result<FunctionValue, FunctionError> {
    evaluate_function_at(Utc::now(), name, args)
}

/// Same as [`evaluate_function`] with `now()` pinned to `now`.
pub fn evaluate_function_at(
    now: DateTime<Utc>,
    name: &str,
    args: &[DynamicValue],
) -> Result<FunctionValue, FunctionError> {
    match name.to_lowercase().as_str() {
        "now" => {
            check_args(name, args, 0)?;
            Ok(FunctionValue::Time(now))
        }
        "date" => {
            check_args(name, args, 1)?;
            let DynamicValue::String(s) = &args[0] else {
                return Err(FunctionError::ArgumentType {
                    name: name.to_string(),
                    expected: "string",
                });
            };
            Ok(FunctionValue::Time(parse_date(s)?))
        }
        "len" => {
            check_args(name, args, 1)?;
            let len = match &args[0] {
                DynamicValue::String(s) => s.chars().count(),
                DynamicValue::List(items) => items.len(),
                other => other.to_string().chars().count(),
            };
            Ok(FunctionValue::Value(DynamicValue::Integer(len as i64)))
        }
        "lower" => {
            check_args(name, args, 1)?;
            Ok(FunctionValue::Value(DynamicValue::String(args[0].to_string().to_lowercase())))
        }
        "upper" => {
            check_args(name, args, 1)?;
            Ok(FunctionValue::Value(DynamicValue::String(args[0].to_string().to_uppercase())))
        }
        _ => Err(FunctionError::Unknown(name.to_string())),
    }
}

fn check_args(name: &str, args: &[DynamicValue], expected: usize) -> Result<(), FunctionError> {
    if args.len() != expected {
        return Err(FunctionError::Arity {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}
