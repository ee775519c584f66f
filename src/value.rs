use serde_yaml::Value as YamlValue;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A frontmatter value as seen by the query engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<DynamicValue>),
    Null,
}

impl DynamicValue {
    pub fn as_list(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }
}

/// Display form used for every string-based comparison. Lists render as
/// `[a b c]`, null renders empty, floats follow [`format_float`].
impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicValue::String(s) => f.write_str(s),
            DynamicValue::Integer(i) => write!(f, "{}", i),
            DynamicValue::Float(x) => f.write_str(&format_float(*x)),
            DynamicValue::Boolean(b) => write!(f, "{}", b),
            DynamicValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            DynamicValue::Null => Ok(()),
        }
    }
}

/// Shortest round-trip digits, switching to exponent form (`1e+06`,
/// `1.5e-05`) when the decimal exponent is below -4 or at least 6.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let scientific = format!("{:e}", x);
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return x.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return x.to_string();
    };
    if x == 0.0 || (-4..6).contains(&exp) {
        return x.to_string();
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.abs())
}

impl From<&YamlValue> for DynamicValue {
    fn from(v: &YamlValue) -> Self {
        match v {
            YamlValue::String(s) => DynamicValue::String(s.clone()),
            YamlValue::Bool(b) => DynamicValue::Boolean(*b),
            YamlValue::Number(n) => match n.as_i64() {
                Some(i) => DynamicValue::Integer(i),
                None => DynamicValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            YamlValue::Sequence(items) => {
                DynamicValue::List(items.iter().map(DynamicValue::from).collect())
            }
            YamlValue::Null => DynamicValue::Null,
            YamlValue::Tagged(tagged) => DynamicValue::from(&tagged.value),
            YamlValue::Mapping(_) => match serde_yaml::to_string(v) {
                Ok(text) => DynamicValue::String(text.trim_end().to_string()),
                Err(_) => DynamicValue::Null,
            },
        }
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        DynamicValue::String(s.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(s: String) -> Self {
        DynamicValue::String(s)
    }
}

impl From<i64> for DynamicValue {
    fn from(i: i64) -> Self {
        DynamicValue::Integer(i)
    }
}

impl From<f64> for DynamicValue {
    fn from(x: f64) -> Self {
        DynamicValue::Float(x)
    }
}

impl From<bool> for DynamicValue {
    fn from(b: bool) -> Self {
        DynamicValue::Boolean(b)
    }
}

impl<T: Into<DynamicValue>> From<Vec<T>> for DynamicValue {
    fn from(items: Vec<T>) -> Self {
        DynamicValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Read-only lookup of named fields. Evaluation only ever calls this, so
/// implementors shared across threads need no locking.
pub trait FieldAccessor {
    fn get_field(&self, name: &str) -> Option<DynamicValue>;
}

impl FieldAccessor for HashMap<String, DynamicValue> {
    fn get_field(&self, name: &str) -> Option<DynamicValue> {
        self.get(name).cloned()
    }
}

impl FieldAccessor for BTreeMap<String, DynamicValue> {
    fn get_field(&self, name: &str) -> Option<DynamicValue> {
        self.get(name).cloned()
    }
}

impl<A: FieldAccessor + ?Sized> FieldAccessor for &A {
    fn get_field(&self, name: &str) -> Option<DynamicValue> {
        (**self).get_field(name)
    }
}
