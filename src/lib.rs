//! Fishery statistics server library
//!
//! Imports regional fishery tables into SQLite, fills their gaps, derives
//! macro-region and national series, and serves everything over HTTP.

pub mod chart;
pub mod cli;
pub mod config;
pub mod importer;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod server;
pub mod store;
pub mod taxonomy;

// Re-export commonly used types for convenience
pub use config::{AppConfig, DatasetConfig, DerivedSeries, RawTable};
pub use pipeline::{AggregationEngine, InterpolationNormalizer, PipelineError};
pub use query::{QueryError, QueryService, RowRecord};
pub use server::{run_server, RequestsLoggingLevel, ServerConfig};
pub use store::{SqliteTableStore, StoreError, TableStore};
