use super::coerce::parse_date;
use crate::value::FieldAccessor;
use chrono::{DateTime, Duration, Utc};

/// Date-range filter behind `--date-field`.
///
/// `within` here is a symmetric window around now (`now ± duration`),
/// unlike the query operator of the same name, which only bounds the past.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    pub field: String,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub within: Option<Duration>,
}

impl DateRange {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            from: None,
            to: None,
            within: None,
        }
    }

    pub fn since(mut self, date: DateTime<Utc>) -> Self {
        self.from = Some(date);
        self
    }

    pub fn until(mut self, date: DateTime<Utc>) -> Self {
        self.to = Some(date);
        self
    }

    pub fn within(mut self, window: Duration) -> Self {
        self.within = Some(window);
        self
    }

    /// Every configured bound must hold. A missing or unparsable field never
    /// matches.
    pub fn matches<A: FieldAccessor + ?Sized>(&self, fields: &A, now: DateTime<Utc>) -> bool {
        let Some(value) = fields.get_field(&self.field) else {
            return false;
        };
        let Ok(date) = parse_date(&value.to_string()) else {
            return false;
        };

        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        match self.within {
            Some(window) => (date - now).abs() <= window.abs(),
            None => true,
        }
    }
}
