//! Page-level report bundles.
//!
//! Each report is assembled purely from engine calls over an enriched view and is
//! what the presentation layer (or the CLI) renders.

use chrono::{Month, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::analytics::{
    average_item_price_by, average_ticket_by, compare_last_months, daily_series, group_totals,
    hourly_series, kpi_rollup, leader, monthly_series, peak_hour, product_breakdown,
    product_names, share_of_total, strongest_weekday, top_n, weekday_totals, year_over_year,
    DailyTotal, Dimension, EnrichedFact, GroupRatio, GroupShare, GroupTotal, HourTotal,
    KpiSummary, Locale, Measure, MonthOverMonth, MonthTotal, ProductBreakdown, WeekdayTotal,
};

const OVERVIEW_TOP_PRODUCTS: usize = 5;
const OVERVIEW_TOP_CATEGORIES: usize = 3;
const TOP_CUSTOMERS: usize = 10;
const TOP_PRODUCTS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct OverviewReport {
    pub kpis: KpiSummary,
    pub daily: Vec<DailyTotal>,
    pub top_products_by_quantity: Vec<GroupTotal>,
    pub top_categories_by_value: Vec<GroupTotal>,
}

impl OverviewReport {
    pub fn build(facts: &[EnrichedFact]) -> Self {
        Self {
            kpis: kpi_rollup(facts),
            daily: daily_series(facts),
            top_products_by_quantity: top_n(
                facts,
                Dimension::Product,
                Measure::Quantity,
                OVERVIEW_TOP_PRODUCTS,
            ),
            top_categories_by_value: top_n(
                facts,
                Dimension::Category,
                Measure::TotalValue,
                OVERVIEW_TOP_CATEGORIES,
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerReport {
    pub customer_count: usize,
    pub top_by_value: Vec<GroupTotal>,
    pub top_by_sales: Vec<GroupTotal>,
    pub average_ticket: Vec<GroupRatio>,
}

impl CustomerReport {
    pub fn build(facts: &[EnrichedFact]) -> Self {
        Self {
            customer_count: kpi_rollup(facts).customer_count,
            top_by_value: top_n(facts, Dimension::Customer, Measure::TotalValue, TOP_CUSTOMERS),
            top_by_sales: top_n(
                facts,
                Dimension::Customer,
                Measure::DistinctSales,
                TOP_CUSTOMERS,
            ),
            average_ticket: average_ticket_by(facts, Dimension::Customer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub payment_method: String,
    pub total_value: Decimal,
    pub transactions: Decimal,
    pub average_ticket: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReport {
    /// Method with the most distinct sales
    pub most_used: Option<GroupTotal>,
    /// One row per method, descending by total value
    pub methods: Vec<PaymentSummary>,
}

impl PaymentReport {
    pub fn build(facts: &[EnrichedFact]) -> Self {
        let mut methods: Vec<PaymentSummary> = average_ticket_by(facts, Dimension::PaymentMethod)
            .into_iter()
            .map(|r| PaymentSummary {
                payment_method: r.key,
                total_value: r.numerator,
                transactions: r.denominator,
                average_ticket: r.ratio,
            })
            .collect();
        methods.sort_by(|a, b| {
            b.total_value
                .cmp(&a.total_value)
                .then_with(|| a.payment_method.cmp(&b.payment_method))
        });

        Self {
            most_used: leader(facts, Dimension::PaymentMethod, Measure::DistinctSales),
            methods,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekdayRow {
    pub weekday: Weekday,
    pub label: &'static str,
    pub total: Decimal,
}

impl WeekdayRow {
    fn from_total(total: &WeekdayTotal, locale: Locale) -> Self {
        Self {
            weekday: total.weekday,
            label: total.label(locale),
            total: total.total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct YoyTableRow {
    pub month: Month,
    pub label: &'static str,
    pub totals: Vec<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YoyTable {
    pub years: Vec<i32>,
    pub rows: Vec<YoyTableRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemporalReport {
    pub hourly: Vec<HourTotal>,
    pub peak_hour: Option<HourTotal>,
    pub weekdays: Vec<WeekdayRow>,
    pub strongest_weekday: Option<WeekdayRow>,
    pub monthly: Vec<MonthTotal>,
    pub month_over_month: MonthOverMonth,
    /// `None` with fewer than two years in view
    pub year_over_year: Option<YoyTable>,
}

impl TemporalReport {
    pub fn build(facts: &[EnrichedFact], locale: Locale) -> Self {
        let hourly = hourly_series(facts);
        let weekdays = weekday_totals(facts);
        let monthly = monthly_series(facts);

        let year_over_year = year_over_year(facts).map(|pivot| YoyTable {
            years: pivot.years,
            rows: pivot
                .rows
                .into_iter()
                .map(|row| YoyTableRow {
                    month: row.month,
                    label: row.label(locale),
                    totals: row.totals,
                })
                .collect(),
        });

        Self {
            peak_hour: peak_hour(&hourly),
            hourly,
            strongest_weekday: strongest_weekday(&weekdays)
                .map(|d| WeekdayRow::from_total(&d, locale)),
            weekdays: weekdays
                .iter()
                .map(|d| WeekdayRow::from_total(d, locale))
                .collect(),
            month_over_month: compare_last_months(&monthly),
            monthly,
            year_over_year,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductReport {
    pub best_seller_by_quantity: Option<GroupTotal>,
    pub best_seller_by_value: Option<GroupTotal>,
    pub top_by_value: Vec<GroupTotal>,
    pub top_by_quantity: Vec<GroupTotal>,
    pub category_value: Vec<GroupTotal>,
    pub category_quantity: Vec<GroupTotal>,
    pub category_average_price: Vec<GroupRatio>,
    pub category_share: Vec<GroupShare>,
    pub products: Vec<String>,
    pub breakdown: Option<ProductBreakdown>,
}

impl ProductReport {
    /// `product` selects an optional drill-down.
    pub fn build(facts: &[EnrichedFact], product: Option<&str>) -> Self {
        Self {
            best_seller_by_quantity: leader(facts, Dimension::Product, Measure::Quantity),
            best_seller_by_value: leader(facts, Dimension::Product, Measure::TotalValue),
            top_by_value: top_n(facts, Dimension::Product, Measure::TotalValue, TOP_PRODUCTS),
            top_by_quantity: top_n(facts, Dimension::Product, Measure::Quantity, TOP_PRODUCTS),
            category_value: group_totals(facts, Dimension::Category, Measure::TotalValue),
            category_quantity: group_totals(facts, Dimension::Category, Measure::Quantity),
            category_average_price: average_item_price_by(facts, Dimension::Category),
            category_share: share_of_total(facts, Dimension::Category, Measure::TotalValue),
            products: product_names(facts),
            breakdown: product.map(|name| product_breakdown(facts, name)),
        }
    }
}
