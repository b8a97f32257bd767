pub mod ingestion;
pub mod sales_query;

pub use ingestion::{IngestReport, IngestionService};
pub use sales_query::SalesQueryService;
