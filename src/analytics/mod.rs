//! Aggregation engine.
//!
//! Everything here is a pure function of an enriched fact view: no storage, no
//! shared state. Empty input always degrades to empty or zero output.

pub mod comparison;
pub mod enrich;
pub mod kpi;
pub mod locale;
pub mod product;
pub mod ranking;
pub mod series;

use rust_decimal::Decimal;

pub use comparison::{
    compare_last_months, month_over_month, year_over_year, MonthOverMonth, PeriodChange,
    YearOverYear, YoyRow,
};
pub use enrich::{enrich, EnrichedFact, MonthBucket};
pub use kpi::{kpi_rollup, KpiSummary};
pub use locale::{month_label, weekday_label, weekday_name, Locale, MONTH_ORDER, WEEK_ORDER};
pub use product::{product_breakdown, product_names, ProductBreakdown};
pub use ranking::{
    average_item_price_by, average_ticket_by, group_totals, leader, ratio_by_group,
    share_of_total, top_n, Dimension, GroupRatio, GroupShare, GroupTotal, Measure,
};
pub use series::{
    daily_series, hourly_series, monthly_series, peak_hour, strongest_weekday, weekday_totals,
    DailyTotal, HourTotal, MonthTotal, WeekdayTotal,
};

/// Division that yields zero instead of failing on a zero (or overflowing) quotient.
pub(crate) fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}


#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn safe_div_tolerates_zero() {
        assert_eq!(safe_div(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_div(dec!(10), dec!(4)), dec!(2.5));
    }
}
