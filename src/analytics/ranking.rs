//! Dimension rankings, ratio metrics and composition shares.
//!
//! Grouping is always done into a `BTreeMap`, so the pre-sort order is lexical by
//! key and the stable descending sort leaves ties in lexical order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use strum::{Display, EnumIter, EnumString};

use super::{safe_div, EnrichedFact};
use crate::queries::SaleFact;

/// Grouping key of a ranking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
    Product,
    Category,
    Customer,
    PaymentMethod,
}

impl Dimension {
    /// Key of a fact under this dimension; uncategorised facts have no category key.
    pub fn key<'a>(&self, fact: &'a SaleFact) -> Option<&'a str> {
        match self {
            Dimension::Product => Some(fact.product.as_str()),
            Dimension::Category => fact.category.as_deref(),
            Dimension::Customer => Some(fact.customer.as_str()),
            Dimension::PaymentMethod => Some(fact.payment_method.as_str()),
        }
    }
}

/// Aggregate computed per group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Measure {
    TotalValue,
    Quantity,
    /// Count of unique sale ids
    DistinctSales,
}

#[derive(Debug, Default)]
struct Accumulator {
    total_value: Decimal,
    quantity: i64,
    sales: HashSet<i32>,
}

impl Accumulator {
    fn add(&mut self, fact: &SaleFact) {
        self.total_value += fact.total_value;
        self.quantity += i64::from(fact.quantity);
        self.sales.insert(fact.sale_id);
    }

    fn measure(&self, measure: Measure) -> Decimal {
        match measure {
            Measure::TotalValue => self.total_value,
            Measure::Quantity => Decimal::from(self.quantity),
            Measure::DistinctSales => Decimal::from(self.sales.len()),
        }
    }
}

fn accumulate(facts: &[EnrichedFact], dimension: Dimension) -> BTreeMap<&str, Accumulator> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for f in facts {
        if let Some(key) = dimension.key(&f.fact) {
            groups.entry(key).or_default().add(&f.fact);
        }
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub value: Decimal,
}

/// Every group with its aggregate, descending by value.
pub fn group_totals(
    facts: &[EnrichedFact],
    dimension: Dimension,
    measure: Measure,
) -> Vec<GroupTotal> {
    let mut totals: Vec<GroupTotal> = accumulate(facts, dimension)
        .into_iter()
        .map(|(key, acc)| GroupTotal {
            key: key.to_string(),
            value: acc.measure(measure),
        })
        .collect();
    totals.sort_by(|a, b| b.value.cmp(&a.value));
    totals
}

/// First `n` entries of [`group_totals`].
pub fn top_n(
    facts: &[EnrichedFact],
    dimension: Dimension,
    measure: Measure,
    n: usize,
) -> Vec<GroupTotal> {
    let mut totals = group_totals(facts, dimension, measure);
    totals.truncate(n);
    totals
}

pub fn leader(facts: &[EnrichedFact], dimension: Dimension, measure: Measure) -> Option<GroupTotal> {
    top_n(facts, dimension, measure, 1).into_iter().next()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRatio {
    pub key: String,
    pub numerator: Decimal,
    pub denominator: Decimal,
    /// Zero when `denominator` is zero
    pub ratio: Decimal,
}

/// Per-group `numerator / denominator`, descending by ratio. Groups with a zero
/// denominator stay in the output with ratio 0.
pub fn ratio_by_group(
    facts: &[EnrichedFact],
    dimension: Dimension,
    numerator: Measure,
    denominator: Measure,
) -> Vec<GroupRatio> {
    let mut ratios: Vec<GroupRatio> = accumulate(facts, dimension)
        .into_iter()
        .map(|(key, acc)| {
            let n = acc.measure(numerator);
            let d = acc.measure(denominator);
            GroupRatio {
                key: key.to_string(),
                numerator: n,
                denominator: d,
                ratio: safe_div(n, d),
            }
        })
        .collect();
    ratios.sort_by(|a, b| b.ratio.cmp(&a.ratio));
    ratios
}

/// Average ticket (value per distinct sale) per group.
pub fn average_ticket_by(facts: &[EnrichedFact], dimension: Dimension) -> Vec<GroupRatio> {
    ratio_by_group(facts, dimension, Measure::TotalValue, Measure::DistinctSales)
}

/// Average price per unit sold, per group.
pub fn average_item_price_by(facts: &[EnrichedFact], dimension: Dimension) -> Vec<GroupRatio> {
    ratio_by_group(facts, dimension, Measure::TotalValue, Measure::Quantity)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupShare {
    pub key: String,
    pub value: Decimal,
    /// Percentage of the grand total of all keyed groups
    pub percent: Decimal,
}

pub fn share_of_total(
    facts: &[EnrichedFact],
    dimension: Dimension,
    measure: Measure,
) -> Vec<GroupShare> {
    let totals = group_totals(facts, dimension, measure);
    let grand_total: Decimal = totals.iter().map(|t| t.value).sum();
    totals
        .into_iter()
        .map(|t| GroupShare {
            percent: safe_div(t.value * Decimal::ONE_HUNDRED, grand_total),
            key: t.key,
            value: t.value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::enrich;
    use crate::analytics::test_support::fact;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn sample() -> Vec<EnrichedFact> {
        let mut uncategorised = fact(5, "2024-01-07 10:00:00", "Ana", "Água", 3, dec!(9));
        uncategorised.category = None;
        uncategorised.payment_method = "Dinheiro".into();
        enrich(&[
            fact(1, "2024-01-05 10:00:00", "Maria", "Açaí 300ml", 2, dec!(24)),
            fact(2, "2024-01-05 11:00:00", "João", "Açaí 500ml", 1, dec!(18)),
            fact(3, "2024-01-06 12:00:00", "Maria", "Açaí 300ml", 1, dec!(12)),
            fact(4, "2024-01-06 13:00:00", "Bia", "Açaí 500ml", 1, dec!(18)),
            uncategorised,
        ])
    }

    #[test]
    fn group_totals_sort_desc_with_lexical_ties() {
        let totals = group_totals(&sample(), Dimension::Product, Measure::TotalValue);
        let keys: Vec<&str> = totals.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["Açaí 300ml", "Açaí 500ml", "Água"]);
        // 36 vs 36: tie resolved lexically
        assert_eq!(totals[0].value, dec!(36));
        assert_eq!(totals[1].value, dec!(36));
    }

    #[rstest]
    #[case(Measure::Quantity, "Açaí 300ml", dec!(3))]
    #[case(Measure::DistinctSales, "Açaí 300ml", dec!(2))]
    fn leader_by_measure(#[case] measure: Measure, #[case] key: &str, #[case] value: Decimal) {
        let best = leader(&sample(), Dimension::Product, measure).unwrap();
        assert_eq!(best.key, key);
        assert_eq!(best.value, value);
    }

    #[test]
    fn top_n_truncates_and_keeps_order() {
        let top = top_n(&sample(), Dimension::Customer, Measure::TotalValue, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].key, "Maria");
        assert_eq!(top[0].value, dec!(36));
    }

    #[test]
    fn category_grouping_skips_uncategorised_facts() {
        let totals = group_totals(&sample(), Dimension::Category, Measure::TotalValue);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].key, "Açaí");
        assert_eq!(totals[0].value, dec!(72));
    }

    #[test]
    fn zero_denominator_yields_zero_ratio() {
        let free = fact(9, "2024-01-08 10:00:00", "Caio", "Brinde", 0, dec!(0));
        let facts = enrich(&[free]);
        let ratios = average_item_price_by(&facts, Dimension::Product);
        assert_eq!(ratios.len(), 1);
        assert_eq!(ratios[0].denominator, Decimal::ZERO);
        assert_eq!(ratios[0].ratio, Decimal::ZERO);
    }

    #[test]
    fn average_ticket_per_customer() {
        let ratios = average_ticket_by(&sample(), Dimension::Customer);
        let maria = ratios.iter().find(|r| r.key == "Maria").unwrap();
        assert_eq!(maria.numerator, dec!(36));
        assert_eq!(maria.denominator, dec!(2));
        assert_eq!(maria.ratio, dec!(18));
    }

    #[test]
    fn shares_sum_to_one_hundred() {
        let shares = share_of_total(&sample(), Dimension::PaymentMethod, Measure::TotalValue);
        let pix = shares.iter().find(|s| s.key == "Pix").unwrap();
        assert_eq!(pix.value, dec!(72));
        assert_eq!(pix.percent, dec!(72) * dec!(100) / dec!(81));
        let total: Decimal = shares.iter().map(|s| s.percent).sum();
        assert!((total - dec!(100)).abs() < dec!(0.0000001));
    }

    #[test]
    fn empty_view_has_no_groups() {
        assert!(group_totals(&[], Dimension::Product, Measure::TotalValue).is_empty());
        assert!(leader(&[], Dimension::Customer, Measure::Quantity).is_none());
        assert!(share_of_total(&[], Dimension::Category, Measure::TotalValue).is_empty());
    }

    #[test]
    fn dimension_names_parse() {
        assert_eq!(Dimension::from_str("payment_method").unwrap(), Dimension::PaymentMethod);
        assert_eq!(Measure::DistinctSales.to_string(), "distinct_sales");
    }
}
