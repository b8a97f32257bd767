use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::{Serialize, Serializer};
use std::fmt;

use super::locale::weekday_name;
use crate::queries::SaleFact;

/// Calendar month grouping key; orders chronologically and renders as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A fact plus the calendar columns every time-based aggregation groups by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedFact {
    #[serde(flatten)]
    pub fact: SaleFact,
    pub date: NaiveDate,
    pub hour: u32,
    pub weekday: Weekday,
    pub month_bucket: MonthBucket,
    pub year: i32,
}

impl EnrichedFact {
    pub fn new(fact: SaleFact) -> Self {
        let date = fact.sold_at.date();
        Self {
            date,
            hour: fact.sold_at.hour(),
            weekday: date.weekday(),
            month_bucket: MonthBucket::of(date),
            year: date.year(),
            fact,
        }
    }

    /// Canonical English weekday name, e.g. `Friday`.
    pub fn weekday_name(&self) -> &'static str {
        weekday_name(self.weekday)
    }
}

/// Attaches derived calendar columns. The input is left untouched; empty in, empty out.
pub fn enrich(facts: &[SaleFact]) -> Vec<EnrichedFact> {
    facts.iter().cloned().map(EnrichedFact::new).collect()
}
