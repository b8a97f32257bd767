use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use metrics::histogram;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use crate::{
    db::DbPool,
    entities::{category, payment_method, product, sale},
    errors::ServiceError,
};

/// Last second stored for a day; `data_venda` has no sub-second precision.
const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Trait representing a read-only query against the sales schema.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    /// Executes the query using the provided database connection
    async fn execute(&self, db: &DbPool) -> Result<Self::Result, ServiceError>;
}

/// Inclusive calendar-day range. Construction rejects `start > end`, so an invalid
/// range can never reach storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ServiceError> {
        if start > end {
            return Err(ServiceError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// First instant of `start`.
    pub fn lower_bound(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Last stored instant of `end` (23:59:59).
    pub fn upper_bound(&self) -> NaiveDateTime {
        self.end.and_time(END_OF_DAY)
    }
}

/// Filtered fact load. Also the cache key: empty sets mean "no restriction", and
/// set semantics make the order and duplication of filter values irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadRequest {
    pub range: DateRange,
    pub payment_methods: BTreeSet<String>,
    pub customers: BTreeSet<String>,
}

impl LoadRequest {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            payment_methods: BTreeSet::new(),
            customers: BTreeSet::new(),
        }
    }

    /// Validates the dates and collects the optional filters.
    pub fn from_parts<P, C>(
        start: NaiveDate,
        end: NaiveDate,
        payment_methods: P,
        customers: C,
    ) -> Result<Self, ServiceError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let range = DateRange::new(start, end)?;
        Ok(Self {
            range,
            payment_methods: payment_methods.into_iter().map(Into::into).collect(),
            customers: customers.into_iter().map(Into::into).collect(),
        })
    }

    pub fn with_payment_methods<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.payment_methods = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_customers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.customers = names.into_iter().map(Into::into).collect();
        self
    }
}

/// One sale joined with its dimension names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleFact {
    pub sale_id: i32,
    pub sold_at: NaiveDateTime,
    pub customer: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_value: Decimal,
    pub product: String,
    /// `None` when the product has no category
    pub category: Option<String>,
    pub payment_method: String,
}

#[derive(Debug, FromQueryResult)]
struct FactRow {
    sale_id: i32,
    sold_at: String,
    customer: String,
    quantity: i32,
    unit_price: Decimal,
    total_value: Decimal,
    product: String,
    category: Option<String>,
    payment_method: String,
}

impl TryFrom<FactRow> for SaleFact {
    type Error = ServiceError;

    fn try_from(row: FactRow) -> Result<Self, Self::Error> {
        let sold_at =
            sale::parse_timestamp(&row.sold_at).map_err(|e| ServiceError::CorruptRow {
                id: row.sale_id,
                reason: format!("unparseable data_venda '{}': {}", row.sold_at, e),
            })?;

        Ok(Self {
            sale_id: row.sale_id,
            sold_at,
            customer: row.customer,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_value: row.total_value,
            product: row.product,
            category: row.category,
            payment_method: row.payment_method,
        })
    }
}

/// Loads the denormalized fact view for a request, ordered by `(sold_at, sale_id)`.
///
/// Categories are left-joined: sales of uncategorised products are returned with
/// `category: None` and count towards every KPI and ranking except the category ones.
#[derive(Debug, Clone)]
pub struct LoadFactsQuery {
    pub request: LoadRequest,
}

#[async_trait]
impl Query for LoadFactsQuery {
    type Result = Vec<SaleFact>;

    #[instrument(skip(self, db), fields(start = %self.request.range.start(), end = %self.request.range.end()))]
    async fn execute(&self, db: &DbPool) -> Result<Self::Result, ServiceError> {
        debug!("Executing LoadFactsQuery");
        let started = std::time::Instant::now();
        let request = &self.request;

        let lower = sale::format_timestamp(request.range.lower_bound());
        let upper = sale::format_timestamp(request.range.upper_bound());

        let mut query = sale::Entity::find()
            .select_only()
            .column_as(sale::Column::Id, "sale_id")
            .column_as(sale::Column::SoldAt, "sold_at")
            .column_as(sale::Column::Customer, "customer")
            .column_as(sale::Column::Quantity, "quantity")
            .column_as(sale::Column::UnitPrice, "unit_price")
            .column_as(sale::Column::TotalValue, "total_value")
            .column_as(product::Column::Name, "product")
            .column_as(category::Column::Name, "category")
            .column_as(payment_method::Column::Name, "payment_method")
            .join(JoinType::InnerJoin, sale::Relation::Product.def())
            .join(JoinType::LeftJoin, product::Relation::Category.def())
            .join(JoinType::InnerJoin, sale::Relation::PaymentMethod.def())
            .filter(sale::Column::SoldAt.between(lower, upper));

        if !request.payment_methods.is_empty() {
            query = query.filter(
                payment_method::Column::Name.is_in(request.payment_methods.iter().cloned()),
            );
        }

        if !request.customers.is_empty() {
            query = query.filter(sale::Column::Customer.is_in(request.customers.iter().cloned()));
        }

        let rows = query
            .order_by_asc(sale::Column::SoldAt)
            .order_by_asc(sale::Column::Id)
            .into_model::<FactRow>()
            .all(db)
            .await?;

        let facts = rows
            .into_iter()
            .map(SaleFact::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        histogram!("acai_loader.query.duration", started.elapsed());
        debug!(rows = facts.len(), "Loaded sale facts");
        Ok(facts)
    }
}

/// Values used to populate filter controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub payment_methods: Vec<String>,
    pub customers: Vec<String>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    /// False when the window is the fallback for an empty `vendas` table
    pub has_sales: bool,
}

impl FilterOptions {
    /// Full available window as a range.
    pub fn full_range(&self) -> Result<DateRange, ServiceError> {
        DateRange::new(self.min_date, self.max_date)
    }
}

/// Discovers payment methods, customers and the stored date span. An empty
/// sales table yields the window of `window_days` ending at `now`.
#[derive(Debug, Clone)]
pub struct FilterOptionsQuery {
    pub now: NaiveDateTime,
    pub window_days: i64,
}

#[async_trait]
impl Query for FilterOptionsQuery {
    type Result = FilterOptions;

    #[instrument(skip(self, db))]
    async fn execute(&self, db: &DbPool) -> Result<Self::Result, ServiceError> {
        debug!("Executing FilterOptionsQuery");

        let payment_methods = payment_method::Entity::find()
            .order_by_asc(payment_method::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.name)
            .collect::<Vec<_>>();

        let customers = sale::Entity::find()
            .select_only()
            .column(sale::Column::Customer)
            .distinct()
            .order_by_asc(sale::Column::Customer)
            .into_tuple::<String>()
            .all(db)
            .await?;

        let span = sale::Entity::find()
            .select_only()
            .column_as(Expr::col(sale::Column::SoldAt).min(), "min_d")
            .column_as(Expr::col(sale::Column::SoldAt).max(), "max_d")
            .into_tuple::<(Option<String>, Option<String>)>()
            .one(db)
            .await?;

        let (min_date, max_date, has_sales) = match span {
            Some((Some(min_raw), Some(max_raw))) => {
                let min = parse_span_bound(&min_raw)?;
                let max = parse_span_bound(&max_raw)?;
                (min.date(), max.date(), true)
            }
            _ => {
                let today = self.now.date();
                (today - Duration::days(self.window_days), today, false)
            }
        };

        Ok(FilterOptions {
            payment_methods,
            customers,
            min_date,
            max_date,
            has_sales,
        })
    }
}

fn parse_span_bound(raw: &str) -> Result<NaiveDateTime, ServiceError> {
    sale::parse_timestamp(raw).map_err(|e| {
        ServiceError::InternalError(format!("unparseable data_venda bound '{}': {}", raw, e))
    })
}
