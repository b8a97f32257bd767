mod common;

use std::sync::Arc;

use acai_analytics::{
    analytics::{enrich, month_over_month, MonthOverMonth, PeriodChange},
    errors::ServiceError,
    queries::{DateRange, LoadRequest},
};
use assert_matches::assert_matches;
use chrono::Duration;
use rust_decimal_macros::dec;

use common::{date, record, ts, TestStore};

async fn seeded() -> TestStore {
    let store = TestStore::new().await;
    store
        .ingestion
        .ingest(&[
            record("2024-01-05 23:59:59", "Maria", "Açaí 300ml", "Pix", dec!(24)),
            record("2024-01-06 00:00:00", "João", "Açaí 500ml", "Dinheiro", dec!(18)),
            record("2024-01-06 12:00:00", "Maria", "Açaí 500ml", "Dinheiro", dec!(18)),
            record("2024-01-06 12:00:00", "Ana", "Açaí 300ml", "Pix", dec!(12)),
        ])
        .await
        .unwrap();
    store
}

fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
    DateRange::new(date(start.0, start.1, start.2), date(end.0, end.1, end.2)).unwrap()
}

#[tokio::test]
async fn end_date_covers_the_whole_day() {
    let store = seeded().await;
    let facts = store
        .queries
        .load(&LoadRequest::new(range((2024, 1, 5), (2024, 1, 5))))
        .await
        .unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].sold_at, ts("2024-01-05 23:59:59"));
}

#[tokio::test]
async fn facts_are_ordered_by_time_then_id() {
    let store = seeded().await;
    let facts = store
        .queries
        .load(&LoadRequest::new(range((2024, 1, 1), (2024, 1, 31))))
        .await
        .unwrap();
    assert_eq!(facts.len(), 4);
    assert!(facts
        .windows(2)
        .all(|w| (w[0].sold_at, w[0].sale_id) < (w[1].sold_at, w[1].sale_id)));
}

#[tokio::test]
async fn filters_are_conjunctive() {
    let store = seeded().await;
    let request = LoadRequest::new(range((2024, 1, 1), (2024, 1, 31)))
        .with_payment_methods(["Dinheiro"])
        .with_customers(["Maria"]);
    let facts = store.queries.load(&request).await.unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].customer, "Maria");
    assert_eq!(facts[0].payment_method, "Dinheiro");

    let only_pix =
        LoadRequest::new(range((2024, 1, 1), (2024, 1, 31))).with_payment_methods(["Pix"]);
    assert_eq!(store.queries.load(&only_pix).await.unwrap().len(), 2);
}

#[tokio::test]
async fn no_match_is_an_empty_view() {
    let store = seeded().await;
    let facts = store
        .queries
        .load(&LoadRequest::new(range((2023, 1, 1), (2023, 12, 31))))
        .await
        .unwrap();
    assert!(facts.is_empty());
}

#[tokio::test]
async fn repeated_requests_are_served_from_cache() {
    let store = seeded().await;
    let month = range((2024, 1, 1), (2024, 1, 31));
    let a = LoadRequest::new(month).with_customers(["Maria", "Ana"]);
    let b = LoadRequest::new(month).with_customers(["Ana", "Maria"]);

    let first = store.queries.load(&a).await.unwrap();
    let second = store.queries.load(&b).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.cache.len(), 1);
}

#[tokio::test]
async fn month_over_month_growth_end_to_end() {
    let store = TestStore::new().await;
    store
        .ingestion
        .ingest(&[
            record("2024-01-10 10:00:00", "Maria", "Açaí 300ml", "Pix", dec!(60)),
            record("2024-01-25 18:00:00", "João", "Açaí 300ml", "Pix", dec!(40)),
            record("2024-02-14 15:00:00", "Ana", "Açaí 500ml", "Pix", dec!(150)),
        ])
        .await
        .unwrap();

    let facts = store
        .queries
        .load_enriched(&LoadRequest::new(range((2024, 1, 1), (2024, 2, 29))))
        .await
        .unwrap();
    assert_matches!(
        month_over_month(&facts),
        MonthOverMonth::Compared { change: PeriodChange::Percent(p), .. } if p == dec!(50)
    );
}

#[tokio::test]
async fn inverted_range_is_rejected_before_storage() {
    // no schema: any query would fail with a database error
    let store = TestStore::without_schema().await;
    let result = store
        .queries
        .load_filtered(
            date(2024, 2, 1),
            date(2024, 1, 1),
            Vec::<String>::new(),
            Vec::<String>::new(),
        )
        .await;
    let err = result.unwrap_err();
    assert_matches!(err, ServiceError::InvalidDateRange { .. });
    assert!(err.is_user_error());
}

#[tokio::test]
async fn filter_options_reflect_storage() {
    let store = seeded().await;
    let options = store.queries.filter_options().await.unwrap();
    assert!(options.has_sales);
    assert_eq!(options.payment_methods, vec!["Dinheiro", "Pix"]);
    assert_eq!(options.customers, vec!["Ana", "João", "Maria"]);
    assert_eq!(options.min_date, date(2024, 1, 5));
    assert_eq!(options.max_date, date(2024, 1, 6));

    let full = store
        .queries
        .load(&LoadRequest::new(options.full_range().unwrap()))
        .await
        .unwrap();
    assert_eq!(enrich(&full).len(), 4);
}

#[tokio::test]
async fn filter_options_fall_back_to_recent_window_when_empty() {
    let store = TestStore::new().await;
    let now = ts("2024-06-30 09:00:00");
    let options = store.queries.filter_options_at(now).await.unwrap();
    assert!(!options.has_sales);
    assert!(options.payment_methods.is_empty());
    assert!(options.customers.is_empty());
    assert_eq!(options.max_date, date(2024, 6, 30));
    assert_eq!(options.min_date, date(2024, 6, 30) - Duration::days(30));
}
