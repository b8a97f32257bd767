//! Time-bucketed series over the enriched view.

use chrono::{NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::locale::{weekday_label, weekday_name, Locale, WEEK_ORDER};
use super::{EnrichedFact, MonthBucket};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourTotal {
    pub hour: u32,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekdayTotal {
    pub weekday: Weekday,
    pub total: Decimal,
}

impl WeekdayTotal {
    pub fn name(&self) -> &'static str {
        weekday_name(self.weekday)
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        weekday_label(self.weekday, locale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub bucket: MonthBucket,
    pub total: Decimal,
}

/// Value per calendar date, ascending. Only dates with sales appear.
pub fn daily_series(facts: &[EnrichedFact]) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for f in facts {
        *by_date.entry(f.date).or_default() += f.fact.total_value;
    }
    by_date
        .into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect()
}

/// Value per hour of day, ascending. Only hours with sales appear.
pub fn hourly_series(facts: &[EnrichedFact]) -> Vec<HourTotal> {
    let mut by_hour: BTreeMap<u32, Decimal> = BTreeMap::new();
    for f in facts {
        *by_hour.entry(f.hour).or_default() += f.fact.total_value;
    }
    by_hour
        .into_iter()
        .map(|(hour, total)| HourTotal { hour, total })
        .collect()
}

/// Busiest hour; the earliest hour wins a tie.
pub fn peak_hour(series: &[HourTotal]) -> Option<HourTotal> {
    series
        .iter()
        .copied()
        .fold(None, |best: Option<HourTotal>, h| match best {
            Some(b) if b.total >= h.total => Some(b),
            _ => Some(h),
        })
}

/// Value per weekday, always seven entries Monday..Sunday, zero-filled.
pub fn weekday_totals(facts: &[EnrichedFact]) -> [WeekdayTotal; 7] {
    let mut sums = [Decimal::ZERO; 7];
    for f in facts {
        sums[f.weekday.num_days_from_monday() as usize] += f.fact.total_value;
    }
    WEEK_ORDER.map(|weekday| WeekdayTotal {
        weekday,
        total: sums[weekday.num_days_from_monday() as usize],
    })
}

/// Weekday with the largest total; the earliest day wins a tie. `None` when every day is zero,
/// including a non-empty view of zero-value sales, where a plain arg-max would pick Monday.
pub fn strongest_weekday(totals: &[WeekdayTotal; 7]) -> Option<WeekdayTotal> {
    let best = totals
        .iter()
        .copied()
        .fold(totals[0], |best, d| if d.total > best.total { d } else { best });
    (!best.total.is_zero()).then_some(best)
}

/// Value per calendar month, ascending by bucket.
pub fn monthly_series(facts: &[EnrichedFact]) -> Vec<MonthTotal> {
    let mut by_month: BTreeMap<MonthBucket, Decimal> = BTreeMap::new();
    for f in facts {
        *by_month.entry(f.month_bucket).or_default() += f.fact.total_value;
    }
    by_month
        .into_iter()
        .map(|(bucket, total)| MonthTotal { bucket, total })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::enrich;
    use crate::analytics::test_support::{fact, valued};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn daily_series_groups_by_date_not_time() {
        let facts = enrich(&[
            valued("2024-01-05 09:00:00", dec!(10)),
            valued("2024-01-05 21:00:00", dec!(5)),
            valued("2024-01-03 12:00:00", dec!(7)),
        ]);
        let series = daily_series(&facts);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(series[0].total, dec!(7));
        assert_eq!(series[1].total, dec!(15));
    }

    #[test]
    fn weekday_totals_zero_fill_missing_days() {
        // 2024-01-05 is a Friday
        let facts = enrich(&[valued("2024-01-05 14:30:00", dec!(24))]);
        let totals = weekday_totals(&facts);
        assert_eq!(totals.len(), 7);
        assert_eq!(totals[0].weekday, Weekday::Mon);
        assert_eq!(totals[4].weekday, Weekday::Fri);
        assert_eq!(totals[4].total, dec!(24));
        assert_eq!(
            totals.iter().filter(|d| d.total.is_zero()).count(),
            6
        );
        assert_eq!(totals[4].label(Locale::Portuguese), "Sexta");
    }

    #[test]
    fn strongest_weekday_prefers_earliest_on_tie() {
        // Tuesday and Thursday
        let facts = enrich(&[
            valued("2024-01-04 10:00:00", dec!(30)),
            valued("2024-01-02 10:00:00", dec!(30)),
        ]);
        let best = strongest_weekday(&weekday_totals(&facts)).unwrap();
        assert_eq!(best.weekday, Weekday::Tue);
        assert_eq!(best.name(), "Tuesday");
    }

    #[test]
    fn strongest_weekday_of_empty_view_is_none() {
        assert!(strongest_weekday(&weekday_totals(&[])).is_none());
    }

    #[test]
    fn strongest_weekday_of_zero_value_sales_is_none() {
        let facts = enrich(&[valued("2024-01-03 10:00:00", dec!(0))]);
        assert!(strongest_weekday(&weekday_totals(&facts)).is_none());
    }

    #[rstest]
    #[case(&[(9, 10), (14, 40), (20, 40)], Some(14))]
    #[case(&[(8, 5)], Some(8))]
    #[case(&[], None)]
    fn peak_hour_cases(#[case] hours: &[(u32, i64)], #[case] expected: Option<u32>) {
        let series: Vec<HourTotal> = hours
            .iter()
            .map(|&(hour, total)| HourTotal {
                hour,
                total: Decimal::from(total),
            })
            .collect();
        assert_eq!(peak_hour(&series).map(|h| h.hour), expected);
    }

    #[test]
    fn hourly_series_lists_only_present_hours() {
        let facts = enrich(&[
            fact(1, "2024-01-05 14:30:00", "Maria", "Açaí 300ml", 2, dec!(24)),
            fact(2, "2024-01-06 14:05:00", "João", "Açaí 300ml", 1, dec!(12)),
            fact(3, "2024-01-06 08:00:00", "João", "Açaí 300ml", 1, dec!(12)),
        ]);
        let series = hourly_series(&facts);
        assert_eq!(
            series,
            vec![
                HourTotal { hour: 8, total: dec!(12) },
                HourTotal { hour: 14, total: dec!(36) },
            ]
        );
    }

    #[test]
    fn monthly_series_is_chronological_across_years() {
        let facts = enrich(&[
            valued("2024-01-10 10:00:00", dec!(1)),
            valued("2023-12-10 10:00:00", dec!(2)),
            valued("2024-01-20 10:00:00", dec!(3)),
        ]);
        let series = monthly_series(&facts);
        let labels: Vec<String> = series.iter().map(|m| m.bucket.to_string()).collect();
        assert_eq!(labels, vec!["2023-12", "2024-01"]);
        assert_eq!(series[1].total, dec!(4));
    }
}
