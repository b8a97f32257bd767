//! Flat sales ledger reader and normalization planning.
//!
//! Turns the denormalized CSV (`data_venda, cliente, produto, quantidade,
//! forma_pagamento, preco_unitario, valor_total, categoria`) into typed
//! [`FlatRecord`]s. Storage writes live in `services::ingestion`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::errors::ServiceError;

/// Columns the source must provide.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "data_venda",
    "cliente",
    "produto",
    "quantidade",
    "forma_pagamento",
    "preco_unitario",
    "valor_total",
    "categoria",
];

/// Day-first layouts tried before the ISO ones.
const DATETIME_FORMATS: [&str; 8] = [
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "data_venda", default)]
    sold_at: Option<String>,
    #[serde(rename = "cliente", default)]
    customer: Option<String>,
    #[serde(rename = "produto", default)]
    product: Option<String>,
    #[serde(rename = "quantidade", default)]
    quantity: Option<String>,
    #[serde(rename = "forma_pagamento", default)]
    payment_method: Option<String>,
    #[serde(rename = "preco_unitario", default)]
    unit_price: Option<String>,
    #[serde(rename = "valor_total", default)]
    total_value: Option<String>,
    #[serde(rename = "categoria", default)]
    category: Option<String>,
}

/// One parsed source row. Dimension names are trimmed; blank names are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRecord {
    pub sold_at: NaiveDateTime,
    pub customer: String,
    pub product: Option<String>,
    pub quantity: i32,
    pub payment_method: Option<String>,
    pub unit_price: Decimal,
    pub total_value: Decimal,
    pub category: Option<String>,
}

/// Parsed source plus row accounting.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub records: Vec<FlatRecord>,
    pub rows_read: usize,
    pub rows_rejected: usize,
}

/// Reads and parses the source file. A missing file is fatal for the run.
pub async fn read_source(path: &Path) -> Result<SourceBatch, ServiceError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServiceError::SourceNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    info!("Reading sales source {}", path.display());
    parse_source(&text)
}

/// Parses CSV text. Rows with unparseable dates or numbers are rejected and counted.
pub fn parse_source(text: &str) -> Result<SourceBatch, ServiceError> {
    let text = text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "source is missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut batch = SourceBatch::default();
    for (line, result) in reader.deserialize::<RawRecord>().enumerate() {
        batch.rows_read += 1;
        let parsed = result
            .map_err(|e| e.to_string())
            .and_then(FlatRecord::try_from);
        match parsed {
            Ok(record) => batch.records.push(record),
            Err(reason) => {
                // +2: header line and 1-based numbering
                warn!("Rejecting source row {}: {}", line + 2, reason);
                batch.rows_rejected += 1;
            }
        }
    }

    info!(
        rows_read = batch.rows_read,
        rows_rejected = batch.rows_rejected,
        "Parsed sales source"
    );
    Ok(batch)
}

impl TryFrom<RawRecord> for FlatRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let sold_at = raw
            .sold_at
            .as_deref()
            .ok_or_else(|| "missing data_venda".to_string())
            .and_then(|s| parse_sale_datetime(s).ok_or_else(|| format!("bad data_venda '{}'", s)))?;

        let quantity = raw
            .quantity
            .as_deref()
            .and_then(parse_quantity)
            .ok_or_else(|| format!("bad quantidade {:?}", raw.quantity))?;
        if quantity <= 0 {
            return Err(format!("non-positive quantidade {}", quantity));
        }

        let unit_price = raw
            .unit_price
            .as_deref()
            .and_then(parse_decimal)
            .ok_or_else(|| format!("bad preco_unitario {:?}", raw.unit_price))?;
        let total_value = raw
            .total_value
            .as_deref()
            .and_then(parse_decimal)
            .ok_or_else(|| format!("bad valor_total {:?}", raw.total_value))?;

        Ok(Self {
            sold_at,
            customer: raw.customer.map(|c| c.trim().to_string()).unwrap_or_default(),
            product: clean_name(raw.product),
            quantity,
            payment_method: clean_name(raw.payment_method),
            unit_price,
            total_value,
            category: clean_name(raw.category),
        })
    }
}

fn clean_name(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a day-first date with an optional time; a bare date means midnight.
pub fn parse_sale_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn parse_quantity(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    raw.parse::<i32>().ok().or_else(|| {
        // "2.0" style integers exported by spreadsheets
        parse_decimal(raw)
            .filter(|d| d.fract().is_zero())
            .and_then(|d| i32::try_from(d.mantissa() / 10i128.pow(d.scale())).ok())
    })
}

/// Accepts `12.5` and the comma-decimal `12,5`.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .ok()
        .or_else(|| Decimal::from_str(&raw.replace(',', ".")).ok())
}

/// Distinct names in first-seen order.
pub fn distinct_names<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .flatten()
        .filter(|n| seen.insert(*n))
        .map(str::to_string)
        .collect()
}

/// Product name to category name; the first row mentioning a product decides its category.
pub fn product_catalog(records: &[FlatRecord]) -> Vec<(String, Option<String>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut catalog: Vec<(String, Option<String>)> = Vec::new();
    for r in records {
        if let Some(product) = r.product.as_deref() {
            if !index.contains_key(product) {
                index.insert(product, catalog.len());
                catalog.push((product.to_string(), r.category.clone()));
            }
        }
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    const HEADER: &str =
        "data_venda,cliente,produto,quantidade,forma_pagamento,preco_unitario,valor_total,categoria";

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[rstest]
    #[case("05/01/2024 14:30:00", "2024-01-05 14:30:00")]
    #[case("05/01/2024 14:30", "2024-01-05 14:30:00")]
    #[case("05-01-2024 14:30:00", "2024-01-05 14:30:00")]
    #[case("05/01/2024", "2024-01-05 00:00:00")]
    #[case("2024-01-05 14:30:00", "2024-01-05 14:30:00")]
    #[case("2024-01-05T14:30:00.750", "2024-01-05 14:30:00.750")]
    fn parses_day_first_dates(#[case] raw: &str, #[case] expected: &str) {
        let expected = NaiveDateTime::parse_from_str(expected, "%Y-%m-%d %H:%M:%S%.f").unwrap();
        assert_eq!(parse_sale_datetime(raw), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("31/02/2024 10:00:00")]
    #[case("ontem")]
    fn rejects_bad_dates(#[case] raw: &str) {
        assert_eq!(parse_sale_datetime(raw), None);
    }

    #[rstest]
    #[case("12.00", Some(dec!(12)))]
    #[case("12,50", Some(dec!(12.5)))]
    #[case(" 7 ", Some(dec!(7)))]
    #[case("doze", None)]
    fn parses_decimals(#[case] raw: &str, #[case] expected: Option<Decimal>) {
        assert_eq!(parse_decimal(raw), expected);
    }

    #[test]
    fn parses_scenario_row_with_bom() {
        let text = format!(
            "\u{FEFF}{}\n05/01/2024 14:30:00,Maria,Açaí 300ml,2,Pix,12.00,24.00,Açaí\n",
            HEADER
        );
        let batch = parse_source(&text).unwrap();
        assert_eq!(batch.rows_read, 1);
        assert_eq!(batch.rows_rejected, 0);
        let r = &batch.records[0];
        assert_eq!(r.sold_at, dt("2024-01-05 14:30:00"));
        assert_eq!(r.customer, "Maria");
        assert_eq!(r.product.as_deref(), Some("Açaí 300ml"));
        assert_eq!(r.quantity, 2);
        assert_eq!(r.total_value, dec!(24));
        assert_eq!(r.category.as_deref(), Some("Açaí"));
    }

    #[test]
    fn bad_rows_are_counted_not_fatal() {
        let text = format!(
            "{}\n\
             xx/01/2024,Maria,Açaí 300ml,2,Pix,12.00,24.00,Açaí\n\
             06/01/2024 10:00:00,João,Açaí 500ml,0,Pix,18.00,0,Açaí\n\
             06/01/2024 11:00:00,  Ana , Granola ,1,  ,3.00,3.00,\n",
            HEADER
        );
        let batch = parse_source(&text).unwrap();
        assert_eq!(batch.rows_read, 3);
        assert_eq!(batch.rows_rejected, 2);
        let r = &batch.records[0];
        assert_eq!(r.customer, "Ana");
        assert_eq!(r.product.as_deref(), Some("Granola"));
        assert_eq!(r.payment_method, None);
        assert_eq!(r.category, None);
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = parse_source("data_venda,cliente\n05/01/2024,Maria\n").unwrap_err();
        assert_matches!(err, ServiceError::InvalidInput(msg) if msg.contains("produto"));
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        let err = read_source(&path).await.unwrap_err();
        assert_matches!(err, ServiceError::SourceNotFound(p) if p == path);
    }

    #[test]
    fn distinct_names_keep_first_seen_order() {
        let names = distinct_names(vec![Some("Pix"), None, Some("Dinheiro"), Some("Pix")]);
        assert_eq!(names, vec!["Pix", "Dinheiro"]);
    }

    #[test]
    fn first_row_decides_product_category() {
        let base = FlatRecord {
            sold_at: dt("2024-01-05 10:00:00"),
            customer: "Maria".into(),
            product: Some("Açaí 300ml".into()),
            quantity: 1,
            payment_method: Some("Pix".into()),
            unit_price: dec!(12),
            total_value: dec!(12),
            category: Some("Açaí".into()),
        };
        let second = FlatRecord {
            category: Some("Bebidas".into()),
            ..base.clone()
        };
        let catalog = product_catalog(&[base, second]);
        assert_eq!(catalog, vec![("Açaí 300ml".to_string(), Some("Açaí".to_string()))]);
    }
}
