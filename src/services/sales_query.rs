use chrono::{Local, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    analytics::{enrich, EnrichedFact},
    cache::FactCache,
    config::DEFAULT_WINDOW_DAYS,
    db::DbPool,
    errors::ServiceError,
    queries::{FilterOptions, FilterOptionsQuery, LoadFactsQuery, LoadRequest, Query, SaleFact},
};

/// Read side of the engine: the only component that queries storage for facts.
#[derive(Clone)]
pub struct SalesQueryService {
    db_pool: Arc<DbPool>,
    cache: FactCache,
    window_days: i64,
}

impl SalesQueryService {
    pub fn new(db_pool: Arc<DbPool>, cache: FactCache) -> Self {
        Self {
            db_pool,
            cache,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Window offered by [`Self::filter_options`] when no sales are stored.
    pub fn with_window_days(mut self, window_days: i64) -> Self {
        self.window_days = window_days;
        self
    }

    pub fn cache(&self) -> &FactCache {
        &self.cache
    }

    /// Loads the fact view for a validated request, serving repeats from the cache.
    #[instrument(skip(self), fields(start = %request.range.start(), end = %request.range.end()))]
    pub async fn load(&self, request: &LoadRequest) -> Result<Arc<Vec<SaleFact>>, ServiceError> {
        if let Some(facts) = self.cache.get(request) {
            return Ok(facts);
        }

        let facts = Arc::new(
            LoadFactsQuery {
                request: request.clone(),
            }
            .execute(&self.db_pool)
            .await?,
        );

        if !self.cache.insert(request.clone(), facts.clone()) {
            debug!("Load result not cached");
        }
        Ok(facts)
    }

    /// Validates raw filter input; `start > end` fails before storage is touched.
    pub async fn load_filtered<P, C>(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        payment_methods: P,
        customers: C,
    ) -> Result<Arc<Vec<SaleFact>>, ServiceError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let request = LoadRequest::from_parts(start, end, payment_methods, customers)?;
        self.load(&request).await
    }

    /// [`Self::load`] followed by calendar enrichment.
    pub async fn load_enriched(
        &self,
        request: &LoadRequest,
    ) -> Result<Vec<EnrichedFact>, ServiceError> {
        let facts = self.load(request).await?;
        Ok(enrich(&facts))
    }

    pub async fn filter_options(&self) -> Result<FilterOptions, ServiceError> {
        self.filter_options_at(Local::now().naive_local()).await
    }

    /// Filter discovery with an explicit clock for the empty-storage fallback.
    #[instrument(skip(self))]
    pub async fn filter_options_at(&self, now: NaiveDateTime) -> Result<FilterOptions, ServiceError> {
        FilterOptionsQuery {
            now,
            window_days: self.window_days,
        }
        .execute(&self.db_pool)
        .await
    }
}
