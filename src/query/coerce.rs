//! Numeric, date and duration coercion shared by the evaluator and the
//! built-in functions.

use crate::value::DynamicValue;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("not a number: {0:?}")]
    Number(String),

    #[error("unrecognized date: {0:?}")]
    Date(String),

    #[error("invalid duration: {0:?}")]
    Duration(String),
}

pub fn to_number(value: &DynamicValue) -> Result<f64, CoercionError> {
    match value {
        DynamicValue::Integer(i) => Ok(*i as f64),
        DynamicValue::Float(x) => Ok(*x),
        DynamicValue::String(s) => s
            .parse::<i64>()
            .map(|i| i as f64)
            .or_else(|_| s.parse::<f64>())
            .map_err(|_| CoercionError::Number(s.clone())),
        other => Err(CoercionError::Number(other.to_string())),
    }
}

enum DateFormat {
    Date(&'static str),
    DateTime(&'static str),
    Rfc3339,
}

/// Tried in order; the first format that parses wins.
const DATE_FORMATS: &[DateFormat] = &[
    DateFormat::Date("%Y-%m-%d"),
    DateFormat::Rfc3339,
    DateFormat::DateTime("%Y-%m-%dT%H:%M:%S"),
    DateFormat::DateTime("%Y-%m-%d %H:%M:%S"),
    DateFormat::Date("%b %d, %Y"),
    DateFormat::Date("%B %d, %Y"),
    DateFormat::Date("%Y/%m/%d"),
];

pub fn parse_date(input: &str) -> Result<DateTime<Utc>, CoercionError> {
    let s = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| match format {
            DateFormat::Date(f) => NaiveDate::parse_from_str(s, f)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            DateFormat::DateTime(f) => NaiveDateTime::parse_from_str(s, f)
                .ok()
                .map(|dt| dt.and_utc()),
            DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        })
        .ok_or_else(|| CoercionError::Date(input.to_string()))
}

static DURATION_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)\s*(minutes?|mins?|hours?|hrs?|days?|weeks?|months?|years?)$")
        .expect("duration phrase pattern is valid")
});

/// Parses `"7 days"`-style phrases, falling back to compact notation such
/// as `2h30m`. Months count as 30 days and years as 365.
pub fn parse_duration(input: &str) -> Result<Duration, CoercionError> {
    let s = input.trim();
    let Some(caps) = DURATION_PHRASE.captures(s) else {
        return parse_compact_duration(s);
    };

    let amount: i64 = caps[1]
        .parse()
        .map_err(|_| CoercionError::Duration(input.to_string()))?;
    let unit = caps[2].to_lowercase();
    let unit_secs: i64 = match unit.trim_end_matches('s') {
        "minute" | "min" => 60,
        "hour" | "hr" => 3_600,
        "day" => 86_400,
        "week" => 7 * 86_400,
        "month" => 30 * 86_400,
        "year" => 365 * 86_400,
        _ => return Err(CoercionError::Duration(input.to_string())),
    };
    amount
        .checked_mul(unit_secs)
        .filter(|secs| *secs <= i64::MAX / 1_000)
        .map(Duration::seconds)
        .ok_or_else(|| CoercionError::Duration(input.to_string()))
}

fn unit_nanos(unit: &str) -> Option<f64> {
    Some(match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60e9,
        "h" => 3600e9,
        _ => return None,
    })
}

/// `[-+]?(<decimal><unit>)+`, or a bare `0`.
fn parse_compact_duration(s: &str) -> Result<Duration, CoercionError> {
    let err = || CoercionError::Duration(s.to_string());

    let (negative, mut rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(err());
    }

    let mut total_nanos = 0f64;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(err)?;
        if num_len == 0 {
            return Err(err());
        }
        let amount: f64 = rest[..num_len].parse().map_err(|_| err())?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos = unit_nanos(&rest[..unit_len]).ok_or_else(err)?;
        rest = &rest[unit_len..];

        total_nanos += amount * nanos;
    }

    if !total_nanos.is_finite() || total_nanos > i64::MAX as f64 {
        return Err(err());
    }
    let nanos = total_nanos as i64;
    Ok(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

/// Numeric ordering when both sides coerce, otherwise byte-wise ordering of
/// the display forms.
pub fn compare_values(a: &DynamicValue, b: &DynamicValue) -> Ordering {
    match (to_number(a), to_number(b)) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

pub fn values_equal(a: &DynamicValue, b: &DynamicValue) -> bool {
    a.to_string() == b.to_string()
}
