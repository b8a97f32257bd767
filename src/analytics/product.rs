use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;

use super::series::{daily_series, hourly_series, weekday_totals, DailyTotal, HourTotal, WeekdayTotal};
use super::{safe_div, EnrichedFact};

/// Drill-down for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductBreakdown {
    pub product: String,
    pub total_value: Decimal,
    pub quantity: i64,
    /// Value per unit; zero when nothing was sold
    pub average_price: Decimal,
    pub daily: Vec<DailyTotal>,
    pub weekdays: [WeekdayTotal; 7],
    pub hourly: Vec<HourTotal>,
}

/// Distinct product names, sorted.
pub fn product_names(facts: &[EnrichedFact]) -> Vec<String> {
    facts
        .iter()
        .map(|f| f.fact.product.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Totals and series restricted to `product`. An unknown product gives an all-zero breakdown.
pub fn product_breakdown(facts: &[EnrichedFact], product: &str) -> ProductBreakdown {
    let subset: Vec<EnrichedFact> = facts
        .iter()
        .filter(|f| f.fact.product == product)
        .cloned()
        .collect();

    let total_value: Decimal = subset.iter().map(|f| f.fact.total_value).sum();
    let quantity: i64 = subset.iter().map(|f| i64::from(f.fact.quantity)).sum();

    ProductBreakdown {
        product: product.to_string(),
        total_value,
        quantity,
        average_price: safe_div(total_value, Decimal::from(quantity)),
        daily: daily_series(&subset),
        weekdays: weekday_totals(&subset),
        hourly: hourly_series(&subset),
    }
}
