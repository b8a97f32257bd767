use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

use super::{safe_div, EnrichedFact};

/// Headline numbers for a fact view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiSummary {
    pub total_value: Decimal,
    /// Unique sale ids, not fact rows
    pub sale_count: usize,
    /// Zero when `sale_count` is zero
    pub average_ticket: Decimal,
    pub total_quantity: i64,
    pub customer_count: usize,
}

pub fn kpi_rollup(facts: &[EnrichedFact]) -> KpiSummary {
    let mut total_value = Decimal::ZERO;
    let mut total_quantity = 0i64;
    let mut sales = HashSet::new();
    let mut customers = HashSet::new();

    for f in facts {
        total_value += f.fact.total_value;
        total_quantity += i64::from(f.fact.quantity);
        sales.insert(f.fact.sale_id);
        customers.insert(f.fact.customer.as_str());
    }

    KpiSummary {
        total_value,
        sale_count: sales.len(),
        average_ticket: safe_div(total_value, Decimal::from(sales.len())),
        total_quantity,
        customer_count: customers.len(),
    }
}
