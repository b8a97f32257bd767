//! Period-over-period comparisons.

use chrono::Month;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::locale::{month_from_number, month_label, Locale, MONTH_ORDER};
use super::series::{monthly_series, MonthTotal};
use super::EnrichedFact;

/// Change between two consecutive monthly totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PeriodChange {
    /// `(current - previous) / previous * 100`, only when `previous > 0`
    Percent(Decimal),
    /// Previous month had no value but the current one does
    FromZero,
    /// Neither month gives a baseline
    NoBaseline,
}

impl PeriodChange {
    pub fn between(previous: Decimal, current: Decimal) -> Self {
        if previous > Decimal::ZERO {
            Self::Percent((current - previous) / previous * Decimal::ONE_HUNDRED)
        } else if current > Decimal::ZERO {
            Self::FromZero
        } else {
            Self::NoBaseline
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MonthOverMonth {
    InsufficientData,
    Single(MonthTotal),
    Compared {
        previous: MonthTotal,
        current: MonthTotal,
        change: PeriodChange,
    },
}

/// Compares the last two buckets of an ascending monthly series.
pub fn compare_last_months(series: &[MonthTotal]) -> MonthOverMonth {
    match series {
        [] => MonthOverMonth::InsufficientData,
        [only] => MonthOverMonth::Single(*only),
        [.., previous, current] => MonthOverMonth::Compared {
            previous: *previous,
            current: *current,
            change: PeriodChange::between(previous.total, current.total),
        },
    }
}

pub fn month_over_month(facts: &[EnrichedFact]) -> MonthOverMonth {
    compare_last_months(&monthly_series(facts))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YoyRow {
    pub month: Month,
    /// Aligned with [`YearOverYear::years`]; zero where a year has no sales that month
    pub totals: Vec<Decimal>,
}

impl YoyRow {
    pub fn label(&self, locale: Locale) -> &'static str {
        month_label(self.month, locale)
    }
}

/// Month x year pivot of total value. Months without sales in any year are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearOverYear {
    pub years: Vec<i32>,
    pub rows: Vec<YoyRow>,
}

/// `None` unless at least two distinct years are present.
pub fn year_over_year(facts: &[EnrichedFact]) -> Option<YearOverYear> {
    let years: Vec<i32> = facts
        .iter()
        .map(|f| f.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if years.len() < 2 {
        return None;
    }

    let mut cells: BTreeMap<(u32, i32), Decimal> = BTreeMap::new();
    for f in facts {
        *cells.entry((f.month_bucket.month, f.year)).or_default() += f.fact.total_value;
    }

    let rows = MONTH_ORDER
        .iter()
        .filter_map(|&month| {
            let number = month.number_from_month();
            let present = years.iter().any(|y| cells.contains_key(&(number, *y)));
            present.then(|| YoyRow {
                month,
                totals: years
                    .iter()
                    .map(|y| cells.get(&(number, *y)).copied().unwrap_or_default())
                    .collect(),
            })
        })
        .collect();

    Some(YearOverYear { years, rows })
}

impl YearOverYear {
    /// Total for a month number (1-12) and year, if that cell is in the pivot.
    pub fn cell(&self, month: u32, year: i32) -> Option<Decimal> {
        let month = month_from_number(month)?;
        let col = self.years.iter().position(|y| *y == year)?;
        self.rows
            .iter()
            .find(|r| r.month == month)
            .and_then(|r| r.totals.get(col).copied())
    }
}
