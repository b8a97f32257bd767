#![allow(dead_code)]

use std::sync::Arc;

use acai_analytics::{
    cache::FactCache,
    db::{self, DbConfig, DbPool},
    ingest::FlatRecord,
    services::{IngestionService, SalesQueryService},
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// In-memory SQLite store with the schema applied and both services wired to one cache.
pub struct TestStore {
    pub db: Arc<DbPool>,
    pub cache: FactCache,
    pub queries: SalesQueryService,
    pub ingestion: IngestionService,
}

impl TestStore {
    pub async fn new() -> Self {
        let pool = connect().await;
        db::run_migrations(&pool).await.expect("migrations");
        Self::with_pool(pool)
    }

    /// Store whose schema was never created; any storage access fails.
    pub async fn without_schema() -> Self {
        Self::with_pool(connect().await)
    }

    fn with_pool(pool: DbPool) -> Self {
        let db = Arc::new(pool);
        let cache = FactCache::new(16);
        Self {
            queries: SalesQueryService::new(db.clone(), cache.clone()),
            ingestion: IngestionService::new(db.clone(), cache.clone(), 2),
            db,
            cache,
        }
    }
}

async fn connect() -> DbPool {
    db::establish_connection_with_config(&DbConfig::in_memory())
        .await
        .expect("connect in-memory sqlite")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
}

/// Single-unit "Açaí" sale.
pub fn record(at: &str, customer: &str, product: &str, payment: &str, total: Decimal) -> FlatRecord {
    FlatRecord {
        sold_at: ts(at),
        customer: customer.to_string(),
        product: Some(product.to_string()),
        quantity: 1,
        payment_method: Some(payment.to_string()),
        unit_price: total,
        total_value: total,
        category: Some("Açaí".to_string()),
    }
}
