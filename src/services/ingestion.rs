use metrics::counter;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    cache::FactCache,
    db::DbPool,
    entities::{category, payment_method, product, sale},
    errors::ServiceError,
    ingest::{distinct_names, product_catalog, read_source, FlatRecord},
};

/// Row accounting for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_rejected: usize,
    pub categories_inserted: u64,
    pub payment_methods_inserted: u64,
    pub products_inserted: u64,
    pub sales_inserted: u64,
    /// Rows whose product or payment method could not be resolved
    pub sales_dropped: usize,
}

/// Normalizes flat records into the four sales tables.
///
/// Single writer: callers must not run two ingestions against the same storage at once.
#[derive(Clone)]
pub struct IngestionService {
    db_pool: Arc<DbPool>,
    cache: FactCache,
    batch_size: usize,
}

impl IngestionService {
    pub fn new(db_pool: Arc<DbPool>, cache: FactCache, batch_size: usize) -> Self {
        Self {
            db_pool,
            cache,
            batch_size: batch_size.max(1),
        }
    }

    /// Reads the source file and ingests its parseable rows.
    #[instrument(skip(self))]
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport, ServiceError> {
        let batch = read_source(path).await?;
        let mut report = self.ingest(&batch.records).await?;
        report.rows_read = batch.rows_read;
        report.rows_rejected = batch.rows_rejected;
        Ok(report)
    }

    /// Writes all records in one transaction. Existing dimension names are kept,
    /// so re-running on the same source never duplicates lookup rows.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn ingest(&self, records: &[FlatRecord]) -> Result<IngestReport, ServiceError> {
        let mut report = IngestReport {
            rows_read: records.len(),
            ..Default::default()
        };

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        // categories and payment methods first; products and sales reference them
        let categories: Vec<category::ActiveModel> =
            distinct_names(records.iter().map(|r| r.category.as_deref()))
                .into_iter()
                .map(|name| category::ActiveModel {
                    name: Set(name),
                    ..Default::default()
                })
                .collect();
        report.categories_inserted = insert_batched(
            &txn,
            categories,
            Some(category::Column::Name),
            self.batch_size,
        )
        .await?;

        let methods: Vec<payment_method::ActiveModel> =
            distinct_names(records.iter().map(|r| r.payment_method.as_deref()))
                .into_iter()
                .map(|name| payment_method::ActiveModel {
                    name: Set(name),
                    ..Default::default()
                })
                .collect();
        report.payment_methods_inserted = insert_batched(
            &txn,
            methods,
            Some(payment_method::Column::Name),
            self.batch_size,
        )
        .await?;

        let category_ids: HashMap<String, i32> = category::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect();

        let products: Vec<product::ActiveModel> = product_catalog(records)
            .into_iter()
            .map(|(name, category_name)| product::ActiveModel {
                name: Set(name),
                category_id: Set(category_name.and_then(|c| category_ids.get(&c).copied())),
                ..Default::default()
            })
            .collect();
        report.products_inserted = insert_batched(
            &txn,
            products,
            Some(product::Column::Name),
            self.batch_size,
        )
        .await?;

        let product_ids: HashMap<String, i32> = product::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.name, p.id))
            .collect();
        let method_ids: HashMap<String, i32> = payment_method::Entity::find()
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| (m.name, m.id))
            .collect();

        let mut sales = Vec::with_capacity(records.len());
        for r in records {
            let product_id = r.product.as_ref().and_then(|p| product_ids.get(p));
            let method_id = r.payment_method.as_ref().and_then(|m| method_ids.get(m));
            match (product_id, method_id) {
                (Some(&product_id), Some(&payment_method_id)) => sales.push(sale::ActiveModel {
                    sold_at: Set(sale::format_timestamp(r.sold_at)),
                    customer: Set(r.customer.clone()),
                    product_id: Set(product_id),
                    quantity: Set(r.quantity),
                    payment_method_id: Set(payment_method_id),
                    unit_price: Set(r.unit_price),
                    total_value: Set(r.total_value),
                    ..Default::default()
                }),
                _ => {
                    warn!(
                        "Dropping sale at {}: unresolved product {:?} or payment method {:?}",
                        r.sold_at, r.product, r.payment_method
                    );
                    report.sales_dropped += 1;
                }
            }
        }
        report.sales_inserted = insert_batched(&txn, sales, None, self.batch_size).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        self.cache.clear();

        counter!("acai_ingest.sales_inserted", report.sales_inserted);
        counter!("acai_ingest.sales_dropped", report.sales_dropped as u64);
        info!(
            categories = report.categories_inserted,
            payment_methods = report.payment_methods_inserted,
            products = report.products_inserted,
            sales = report.sales_inserted,
            dropped = report.sales_dropped,
            "Ingestion committed"
        );
        Ok(report)
    }
}

/// Inserts in chunks of `batch_size`, returning the number of rows written. With a
/// conflict column, rows whose value already exists are skipped.
async fn insert_batched<E, A, C>(
    db: &C,
    models: Vec<A>,
    conflict: Option<E::Column>,
    batch_size: usize,
) -> Result<u64, ServiceError>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E>,
    E::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    let mut written = 0;
    let mut rows = models.into_iter().peekable();
    while rows.peek().is_some() {
        let chunk: Vec<A> = rows.by_ref().take(batch_size).collect();
        let mut insert = E::insert_many(chunk);
        if let Some(column) = conflict {
            insert = insert.on_conflict(OnConflict::column(column).do_nothing().to_owned());
        }
        written += insert.exec_without_returning(db).await?;
    }
    Ok(written)
}
