use super::ast::{CompareOp, Expr, LogicalOp, Operand};
use super::coerce::{compare_values, parse_date, parse_duration, to_number, values_equal};
use super::functions::{evaluate_function_at, FunctionError, FunctionValue};
use crate::value::{DynamicValue, FieldAccessor};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Evaluates expression trees against field accessors.
///
/// Evaluation is total: a missing field or an operand that does not coerce
/// makes that predicate false instead of failing the whole query.
///
/// `matches` patterns are compiled once per evaluator and shared by its
/// clones; an invalid pattern is remembered as `None`.
#[derive(Debug, Clone)]
pub struct Evaluator {
    now: DateTime<Utc>,
    resolve_functions: bool,
    patterns: Arc<RwLock<HashMap<String, Option<Regex>>>>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An evaluator whose notion of "now" is fixed to `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            resolve_functions: false,
            patterns: Arc::default(),
        }
    }

    /// When enabled, a function call on the right of a comparison is
    /// evaluated and its result compared. When disabled (the default) the
    /// call is compared as its bare name.
    pub fn resolve_functions(mut self, enabled: bool) -> Self {
        self.resolve_functions = enabled;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn evaluate<A: FieldAccessor + ?Sized>(&self, expr: &Expr, fields: &A) -> bool {
        match expr {
            Expr::Field(name) => fields.get_field(name).is_some(),
            Expr::Literal(lit) => is_truthy(&lit.to_value()),
            Expr::Comparison { field, op, value } => self.compare(field, *op, value, fields),
            Expr::Not(inner) => !self.evaluate(inner, fields),
            Expr::Logical { left, op, right } => {
                let left = self.evaluate(left, fields);
                let right = self.evaluate(right, fields);
                match op {
                    LogicalOp::And => left && right,
                    LogicalOp::Or => left || right,
                }
            }
            Expr::FunctionCall { name, args } => {
                self.resolve_functions
                    && self
                        .call(name, args, fields)
                        .is_ok_and(|v| is_truthy(&v.into_value()))
            }
        }
    }

    fn compare<A: FieldAccessor + ?Sized>(
        &self,
        field: &str,
        op: CompareOp,
        operand: &Operand,
        fields: &A,
    ) -> bool {
        let Some(actual) = fields.get_field(field) else {
            return false;
        };
        let Some(expected) = self.operand_value(operand, fields) else {
            return false;
        };

        match op {
            CompareOp::Eq => values_equal(&actual, &expected),
            CompareOp::Ne => !values_equal(&actual, &expected),
            CompareOp::Gt => compare_values(&actual, &expected) == Ordering::Greater,
            CompareOp::Lt => compare_values(&actual, &expected) == Ordering::Less,
            CompareOp::Ge => {
                compare_values(&actual, &expected) == Ordering::Greater
                    || values_equal(&actual, &expected)
            }
            CompareOp::Le => {
                compare_values(&actual, &expected) == Ordering::Less
                    || values_equal(&actual, &expected)
            }
            CompareOp::Contains => contains(&actual, &expected),
            CompareOp::NotContains => !contains(&actual, &expected),
            CompareOp::Has => has(&actual, &expected),
            CompareOp::NotHas => !has(&actual, &expected),
            CompareOp::In => is_in(&actual, &expected),
            CompareOp::NotIn => !is_in(&actual, &expected),
            CompareOp::StartsWith => {
                let prefix = expected.to_string().to_lowercase();
                any_text(&actual, |s| s.to_lowercase().starts_with(&prefix))
            }
            CompareOp::EndsWith => {
                let suffix = expected.to_string().to_lowercase();
                any_text(&actual, |s| s.to_lowercase().ends_with(&suffix))
            }
            CompareOp::Matches => match self.pattern(&expected.to_string()) {
                Some(re) => any_text(&actual, |s| re.is_match(s)),
                None => false,
            },
            CompareOp::Between => between(&actual, &expected),
            CompareOp::After => compare_dates(&actual, &expected) == Some(Ordering::Greater),
            CompareOp::Before => compare_dates(&actual, &expected) == Some(Ordering::Less),
            CompareOp::Within => self.within(&actual, &expected),
        }
    }

    fn operand_value<A: FieldAccessor + ?Sized>(
        &self,
        operand: &Operand,
        fields: &A,
    ) -> Option<DynamicValue> {
        match operand {
            Operand::Literal(lit) => Some(lit.to_value()),
            Operand::Call { name, args } if self.resolve_functions => self
                .call(name, args, fields)
                .map(FunctionValue::into_value)
                .map_err(|e| tracing::trace!(function = %name, error = %e, "function call failed"))
                .ok(),
            Operand::Call { name, .. } => Some(DynamicValue::String(name.clone())),
        }
    }

    fn call<A: FieldAccessor + ?Sized>(
        &self,
        name: &str,
        args: &[Expr],
        fields: &A,
    ) -> Result<FunctionValue, FunctionError> {
        let values = args
            .iter()
            .map(|arg| self.argument_value(arg, fields))
            .collect::<Result<Vec<_>, _>>()?;
        evaluate_function_at(self.now, name, &values)
    }

    fn argument_value<A: FieldAccessor + ?Sized>(
        &self,
        arg: &Expr,
        fields: &A,
    ) -> Result<DynamicValue, FunctionError> {
        Ok(match arg {
            Expr::Literal(lit) => lit.to_value(),
            Expr::Field(name) => fields.get_field(name).unwrap_or(DynamicValue::Null),
            Expr::FunctionCall { name, args } => self.call(name, args, fields)?.into_value(),
            other => DynamicValue::Boolean(self.evaluate(other, fields)),
        })
    }

    fn pattern(&self, source: &str) -> Option<Regex> {
        if let Ok(cache) = self.patterns.read() {
            if let Some(compiled) = cache.get(source) {
                return compiled.clone();
            }
        }

        let compiled = Regex::new(source)
            .map_err(|e| tracing::trace!(pattern = source, error = %e, "invalid pattern"))
            .ok();
        if let Ok(mut cache) = self.patterns.write() {
            cache.insert(source.to_string(), compiled.clone());
        }
        compiled
    }

    /// Directional: the field date is later than `now - duration`.
    fn within(&self, actual: &DynamicValue, duration: &DynamicValue) -> bool {
        let (Ok(date), Ok(duration)) = (
            parse_date(&actual.to_string()),
            parse_duration(&duration.to_string()),
        ) else {
            return false;
        };
        self.now
            .checked_sub_signed(duration)
            .is_some_and(|start| date > start)
    }
}

impl Expr {
    /// Evaluates against `fields` with the current time and call operands
    /// compared by name.
    pub fn evaluate<A: FieldAccessor + ?Sized>(&self, fields: &A) -> bool {
        Evaluator::new().evaluate(self, fields)
    }
}

fn is_truthy(value: &DynamicValue) -> bool {
    match value {
        DynamicValue::Boolean(b) => *b,
        DynamicValue::String(s) => !s.is_empty(),
        DynamicValue::Integer(i) => *i != 0,
        DynamicValue::Float(x) => *x != 0.0,
        DynamicValue::List(items) => !items.is_empty(),
        DynamicValue::Null => false,
    }
}

/// Applies `pred` to each element's text for lists, or to the value's text.
fn any_text(value: &DynamicValue, pred: impl Fn(&str) -> bool) -> bool {
    match value.as_list() {
        Some(items) => items.iter().any(|item| pred(&item.to_string())),
        None => pred(&value.to_string()),
    }
}

fn any_value(value: &DynamicValue, pred: impl Fn(&DynamicValue) -> bool) -> bool {
    match value.as_list() {
        Some(items) => items.iter().any(pred),
        None => pred(value),
    }
}

fn contains(haystack: &DynamicValue, needle: &DynamicValue) -> bool {
    let needle = needle.to_string().to_lowercase();
    any_text(haystack, |s| s.to_lowercase().contains(&needle))
}

fn has(haystack: &DynamicValue, needle: &DynamicValue) -> bool {
    let needle = needle.to_string();
    any_text(haystack, |s| s == needle)
}

fn is_in(haystack: &DynamicValue, needle: &DynamicValue) -> bool {
    match haystack.as_list() {
        Some(items) => items.iter().any(|item| values_equal(item, needle)),
        None => contains(haystack, needle),
    }
}

fn compare_dates(actual: &DynamicValue, expected: &DynamicValue) -> Option<Ordering> {
    let actual = parse_date(&actual.to_string()).ok()?;
    let expected = parse_date(&expected.to_string()).ok()?;
    Some(actual.cmp(&expected))
}

fn in_range<T: PartialOrd>(x: &T, a: &T, b: &T) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    lo <= x && x <= hi
}

/// `bounds` is `"low,high"` in either order; inclusive on both ends.
fn between(actual: &DynamicValue, bounds: &DynamicValue) -> bool {
    let text = bounds.to_string();
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let [low, high] = parts[..] else {
        return false;
    };
    let low = DynamicValue::from(low);
    let high = DynamicValue::from(high);

    any_value(actual, |value| {
        if let (Ok(x), Ok(a), Ok(b)) = (to_number(value), to_number(&low), to_number(&high)) {
            return in_range(&x, &a, &b);
        }
        if let (Ok(x), Ok(a), Ok(b)) = (
            parse_date(&value.to_string()),
            parse_date(&low.to_string()),
            parse_date(&high.to_string()),
        ) {
            return in_range(&x, &a, &b);
        }
        in_range(&value.to_string(), &low.to_string(), &high.to_string())
    })
}
