pub mod sales_queries;

pub use sales_queries::{
    DateRange, FilterOptions, FilterOptionsQuery, LoadFactsQuery, LoadRequest, Query, SaleFact,
};
