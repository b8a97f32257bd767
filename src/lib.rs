//! Açaí shop sales analytics
//!
//! Normalizes a flat sales ledger into SQLite and answers descriptive analytics
//! questions (KPIs, rankings, time series, period comparisons) over filtered views.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod analytics;
pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod ingest;
pub mod migrator;
pub mod queries;
pub mod reports;
pub mod services;

pub use errors::ServiceError;
