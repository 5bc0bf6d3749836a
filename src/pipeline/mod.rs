//! Transformations from imported regional tables to the derived series.

mod derivation;
mod interpolation;

pub use derivation::{
    derive_series, run_derivation, Aggregation, AggregationEngine, Derivation,
    DerivationOutcome, Grouping,
};
pub use interpolation::{
    interpolate_gaps, normalize_rows, FilledCell, InterpolationNormalizer, NormalizationReport,
    NormalizationSummary, NormalizedRows,
};

use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(StoreError),

    #[error("Configured column '{column}' is missing from table '{table}'")]
    ConfigurationKeyMissing { table: String, column: String },

    #[error("Regions without a macro-region mapping: {}", .0.join(", "))]
    MappingIncomplete(Vec<String>),
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ColumnNotFound { table, column } => {
                PipelineError::ConfigurationKeyMissing { table, column }
            }
            other => PipelineError::Store(other),
        }
    }
}

/// Rounds half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
